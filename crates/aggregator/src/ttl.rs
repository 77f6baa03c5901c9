//! Short-lived caching for providers that can only be searched.

use crate::ContentAggregator;
use crate::aggregator::{DEFAULT_PROVIDER_TIMEOUT, isolated};
use crate::error::{ErrorKind, Result};
use crate::hit::SearchHit;
use crate::policy::{FirstProviderWins, PolicyHandle};
use crate::reconcile::{LogicalContent, Provenance};
use crate::status::{ProviderStatus, RefreshReport};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::future::join_all;
use lru::LruCache;
use mediadex_catalog::ProviderHandle;
use mediadex_identity::{AddressableHash, ContentRef, Identity, Kind};
use mediadex_index::MAX_RESULTS;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CAPACITY: usize = 1000;

/// A bounded LRU map whose entries also expire after a fixed time.
///
/// Expiry is lazy: an expired entry is dropped when it is next read, or by an
/// explicit [`purge_expired()`](Self::purge_expired). Time comes from the Tokio
/// clock, so tests can pause and advance it.
#[derive(Debug)]
pub struct TtlCache<K: Hash + Eq, V> {
    ttl: Duration,
    entries: Mutex<LruCache<K, (Instant, V)>>,
}
impl<K: Hash + Eq + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expired entries make room before the least recently used one is
    /// evicted.
    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        if entries.len() == entries.cap().get() && !entries.contains(&key) {
            self.drop_expired(&mut entries);
        }
        if let Some((evicted, _)) = entries.push(key, (Instant::now(), value))
            && !entries.contains(&evicted)
        {
            tracing::debug!(capacity = entries.cap().get(), "Evicted least recently used cache entry");
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let (inserted, value) = entries.get(key)?;
        if inserted.elapsed() < self.ttl {
            return Some(value.clone());
        }
        entries.pop(key);
        None
    }

    /// Drop every expired entry, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        self.drop_expired(&mut entries)
    }

    fn drop_expired(&self, entries: &mut LruCache<K, (Instant, V)>) -> usize {
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, (inserted, _))| inserted.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Serves a kind whose providers can't list their catalog, only search it.
///
/// Every search goes out to the providers. The titles it returns are kept for
/// a short while so that a follow-up [`retrieve()`](Self::retrieve) (a user
/// picking one of the results) can be answered without asking again. Anything
/// not recently returned by a search is unknown.
pub struct OnDemandAggregator {
    kind: Kind,
    providers: Vec<ProviderHandle>,
    policy: PolicyHandle,
    timeout: Duration,
    cache: TtlCache<AddressableHash, LogicalContent>,
    statuses: ArcSwap<Vec<ProviderStatus>>,
}

impl OnDemandAggregator {
    pub fn new(kind: Kind, providers: Vec<ProviderHandle>, capacity: usize, ttl: Duration) -> Result<Self> {
        if providers.is_empty() {
            exn::bail!(ErrorKind::Configuration(format!("no providers configured for {kind}")));
        }
        let Some(capacity) = NonZeroUsize::new(capacity) else {
            exn::bail!(ErrorKind::Configuration("cache capacity must be positive".to_string()));
        };
        if ttl.is_zero() {
            exn::bail!(ErrorKind::Configuration("cache TTL must be positive".to_string()));
        }
        let mut names = HashSet::new();
        for provider in &providers {
            if provider.kind() != kind {
                exn::bail!(ErrorKind::KindMismatch {
                    provider: provider.name().to_string(),
                    expected: kind,
                    actual: provider.kind(),
                });
            }
            if !names.insert(provider.name()) {
                exn::bail!(ErrorKind::DuplicateProvider(provider.name().to_string()));
            }
        }
        let statuses = providers.iter().map(|provider| ProviderStatus::unknown(provider.name())).collect();
        Ok(Self {
            kind,
            providers,
            policy: Arc::new(FirstProviderWins),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            cache: TtlCache::new(capacity, ttl),
            statuses: ArcSwap::from_pointee(statuses),
        })
    }

    pub fn with_policy(mut self, policy: PolicyHandle) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Ask every provider, merge their answers in provider order and remember
    /// the first 25 titles.
    ///
    /// Providers don't score their results, so hits keep the order the
    /// providers returned them in and carry a score of zero. A failing
    /// provider contributes nothing.
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let started_at = UtcDateTime::now();
        let results = join_all(self.providers.iter().map(|provider| {
            let query = query.to_string();
            isolated(provider, self.timeout, move |provider| async move { provider.search(&query).await })
        }))
        .await;

        let mut order: Vec<Identity> = Vec::new();
        let mut provenance: HashMap<Identity, Vec<Provenance>> = HashMap::new();
        let mut outcomes = Vec::with_capacity(self.providers.len());
        for (provider, result) in self.providers.iter().zip(results) {
            let entries = match result {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(provider = provider.name(), error = ?error, "Provider search failed");
                    outcomes.push(Err(error.to_string()));
                    continue;
                },
            };
            outcomes.push(Ok(entries.len()));
            for entry in entries.into_iter().filter(|entry| entry.kind() == self.kind) {
                let found = provenance.entry(entry.identity().clone()).or_insert_with(|| {
                    order.push(entry.identity().clone());
                    Vec::new()
                });
                if found.iter().all(|existing| existing.provider != provider.name()) {
                    found.push(Provenance::new(provider.name(), Arc::new(entry)));
                }
            }
        }
        self.record(started_at, outcomes);

        let mut hits = Vec::new();
        for identity in order.into_iter().take(MAX_RESULTS) {
            let Some(content) = provenance
                .remove(&identity)
                .and_then(|found| LogicalContent::reconcile(identity, found, self.policy.as_ref()))
            else {
                continue;
            };
            hits.push(SearchHit::new(&content.entry, 0.0));
            self.cache.insert(content.hash, content).await;
        }
        hits
    }

    fn record(&self, at: UtcDateTime, outcomes: Vec<std::result::Result<usize, String>>) {
        self.statuses.rcu(|current| {
            current
                .iter()
                .zip(&outcomes)
                .map(|(status, outcome)| match outcome {
                    Ok(entries) => status.succeeded(at, *entries),
                    Err(error) => status.failed(error.clone()),
                })
                .collect::<Vec<_>>()
        });
    }

    /// A title returned by a recent search, if it hasn't expired yet.
    pub async fn retrieve(&self, reference: &ContentRef) -> Option<LogicalContent> {
        let content = self.cache.get(&reference.hash()).await?;
        match reference {
            ContentRef::Identity(identity) if *identity != content.identity => None,
            _ => Some(content),
        }
    }

    /// There is no catalog to refresh; this only drops expired results.
    pub async fn refresh(&self) -> RefreshReport {
        let clock = Instant::now();
        let purged = self.cache.purge_expired().await;
        if purged > 0 {
            tracing::debug!(kind = %self.kind, purged, "Purged expired search results");
        }
        RefreshReport {
            generation: 0,
            skipped: false,
            outcomes: Vec::new(),
            entries: self.cache.len().await,
            elapsed: clock.elapsed(),
        }
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.statuses.load().to_vec()
    }
}

impl Debug for OnDemandAggregator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OnDemandAggregator")
            .field("kind", &self.kind)
            .field("providers", &self.providers.iter().map(|provider| provider.name()).collect::<Vec<_>>())
            .field("ttl", &self.cache.ttl())
            .finish()
    }
}

#[async_trait]
impl ContentAggregator for OnDemandAggregator {
    fn kind(&self) -> Kind {
        self.kind
    }

    async fn refresh(&self) -> RefreshReport {
        OnDemandAggregator::refresh(self).await
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        OnDemandAggregator::search(self, query).await
    }

    async fn retrieve(&self, reference: &ContentRef) -> Option<LogicalContent> {
        OnDemandAggregator::retrieve(self, reference).await
    }

    fn status(&self) -> Vec<ProviderStatus> {
        OnDemandAggregator::status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Health;
    use mediadex_catalog::error::Result as CatalogResult;
    use mediadex_catalog::provider::MockProvider;
    use mediadex_catalog::{CatalogEntry, Provider};

    fn capacity(capacity: usize) -> NonZeroUsize {
        NonZeroUsize::new(capacity).unwrap()
    }

    fn webtoons(name: &str, titles: &[&str]) -> Arc<MockProvider> {
        Arc::new(MockProvider::new(name, Kind::Webtoon).with_names(titles.iter().copied()))
    }

    fn on_demand(providers: &[&Arc<MockProvider>]) -> OnDemandAggregator {
        let handles = providers.iter().map(|provider| Arc::clone(*provider) as ProviderHandle).collect();
        OnDemandAggregator::new(Kind::Webtoon, handles, DEFAULT_CAPACITY, DEFAULT_TTL).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires() {
        let cache = TtlCache::new(capacity(10), Duration::from_secs(300));
        cache.insert("a", 1).await;
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&"a").await, Some(1));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_evicts_least_recently_used() {
        let cache = TtlCache::new(capacity(2), Duration::from_secs(300));
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        assert_eq!(cache.get(&"a").await, Some(1));
        cache.insert("c", 3).await;
        assert_eq!(cache.get(&"b").await, None);
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.get(&"c").await, Some(3));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_before_evicting() {
        let cache = TtlCache::new(capacity(2), Duration::from_secs(60));
        cache.insert("old", 1).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.insert("fresh", 2).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get(&"old").await, Some(1));
        tokio::time::advance(Duration::from_secs(25)).await;

        cache.insert("new", 3).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&"fresh").await, Some(2));
        assert_eq!(cache.get(&"new").await, Some(3));
        assert_eq!(cache.get(&"old").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_purge() {
        let cache = TtlCache::new(capacity(10), Duration::from_secs(60));
        cache.insert("old", 1).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.insert("new", 2).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&"new").await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieve_after_search_until_expiry() {
        let provider = webtoons("webtoons", &["Tower of God", "The God of High School"]);
        let aggregator = on_demand(&[&provider]);
        let identity = Identity::new(Kind::Webtoon, "Tower of God");
        assert!(aggregator.retrieve(&ContentRef::from(&identity)).await.is_none());

        let hits = aggregator.search("tower").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].identity, identity);

        let content = aggregator.retrieve(&ContentRef::from(&identity)).await.unwrap();
        assert_eq!(content.name(), "Tower of God");
        assert_eq!(aggregator.retrieve(&ContentRef::from(identity.hash())).await, Some(content));

        tokio::time::advance(DEFAULT_TTL).await;
        assert!(aggregator.retrieve(&ContentRef::from(&identity)).await.is_none());
    }

    #[tokio::test]
    async fn test_search_caches_at_most_25() {
        let titles: Vec<String> = (0..40).map(|i| format!("Title {i}")).collect();
        let provider = Arc::new(MockProvider::new("webtoons", Kind::Webtoon).with_names(titles));
        let aggregator = on_demand(&[&provider]);

        let hits = aggregator.search("title").await;
        assert_eq!(hits.len(), MAX_RESULTS);
        assert_eq!(hits[0].name, "Title 0");
        let kept = Identity::new(Kind::Webtoon, "Title 24");
        let dropped = Identity::new(Kind::Webtoon, "Title 25");
        assert!(aggregator.retrieve(&ContentRef::from(&kept)).await.is_some());
        assert!(aggregator.retrieve(&ContentRef::from(&dropped)).await.is_none());
    }

    #[tokio::test]
    async fn test_merges_providers_in_order() {
        let a = webtoons("a", &["Tower of God"]);
        let b = webtoons("b", &["TOWER OF GOD", "Tower of God: Urek"]);
        let aggregator = on_demand(&[&a, &b]);

        let hits = aggregator.search("tower of god").await;
        let names: Vec<_> = hits.iter().map(|hit| hit.name.as_str()).collect();
        assert_eq!(names, ["Tower of God", "Tower of God: Urek"]);
        let content = aggregator.retrieve(&ContentRef::from(&hits[0].identity)).await.unwrap();
        assert_eq!(content.providers().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_provider_failure_is_empty() {
        let provider = Arc::new(MockProvider::new("webtoons", Kind::Webtoon).with_names(["Tower of God"]).failing());
        let aggregator = on_demand(&[&provider]);
        assert!(aggregator.search("tower").await.is_empty());
        let status = aggregator.status();
        assert_eq!(status[0].health, Health::Down);

        provider.set_failing(false);
        assert_eq!(aggregator.search("tower").await.len(), 1);
        assert_eq!(aggregator.status()[0].health, Health::Up);
    }

    struct Panicking;

    #[async_trait]
    impl Provider for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn kind(&self) -> Kind {
            Kind::Webtoon
        }

        async fn search(&self, _query: &str) -> CatalogResult<Vec<CatalogEntry>> {
            panic!("adapter bug")
        }
    }

    #[tokio::test]
    async fn test_panicking_provider_fails_alone() {
        let provider = webtoons("webtoons", &["Tower of God"]);
        let handles = vec![Arc::new(Panicking) as ProviderHandle, provider as ProviderHandle];
        let aggregator = OnDemandAggregator::new(Kind::Webtoon, handles, DEFAULT_CAPACITY, DEFAULT_TTL).unwrap();

        let hits = aggregator.search("tower").await;
        assert_eq!(hits.len(), 1);
        let status = aggregator.status();
        assert_eq!(status[0].health, Health::Down);
        assert_eq!(status[0].last_error.as_deref(), Some("source crashed: panicking"));
        assert_eq!(status[1].health, Health::Up);
    }

    #[tokio::test]
    async fn test_blank_query_skips_providers() {
        let provider = webtoons("webtoons", &["Tower of God"]);
        let aggregator = on_demand(&[&provider]);
        assert!(aggregator.search("   ").await.is_empty());
        assert_eq!(provider.search_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_purges() {
        let provider = webtoons("webtoons", &["Tower of God"]);
        let aggregator = on_demand(&[&provider]);
        aggregator.search("tower").await;
        assert_eq!(aggregator.refresh().await.entries, 1);
        tokio::time::advance(DEFAULT_TTL).await;
        assert_eq!(aggregator.refresh().await.entries, 0);
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let provider = webtoons("webtoons", &[]);
        let error =
            OnDemandAggregator::new(Kind::Webtoon, vec![provider as ProviderHandle], 0, DEFAULT_TTL).unwrap_err();
        assert!(matches!(&*error, ErrorKind::Configuration(_)));
    }
}
