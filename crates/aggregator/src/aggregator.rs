//! The per-kind catalog aggregator.

use crate::ContentAggregator;
use crate::error::{ErrorKind, Result};
use crate::generation::{Generation, Slice};
use crate::hit::SearchHit;
use crate::policy::{FirstProviderWins, PolicyHandle};
use crate::reconcile::LogicalContent;
use crate::status::{Outcome, ProviderOutcome, ProviderStatus, RefreshReport};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use exn::ResultExt;
use futures::future::join_all;
use mediadex_catalog::error::{ErrorKind as CatalogErrorKind, Result as CatalogResult};
use mediadex_catalog::{CatalogEntry, ProviderHandle, SearchField, UpdateEntry};
use mediadex_identity::{ContentRef, Kind};
use mediadex_index::{Schema, Strategy};
use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{Instrument, instrument};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Keeps the combined catalog of every enumerating provider of one kind.
///
/// Readers ([`search()`](Self::search), [`retrieve()`](Self::retrieve)) take
/// no locks: they load the current [`Generation`] and work from it. A
/// [`refresh()`](Self::refresh) builds the next generation off to the side and
/// publishes it in a single atomic store.
pub struct CatalogAggregator {
    kind: Kind,
    strategy: Strategy,
    schema: Schema,
    providers: Vec<ProviderHandle>,
    policy: PolicyHandle,
    timeout: Duration,
    current: ArcSwap<Generation>,
    refreshing: Mutex<()>,
}

impl CatalogAggregator {
    /// Validate the providers and publish an empty generation.
    ///
    /// Providers are consulted in the order given; it decides whose metadata
    /// wins under the default [`FirstProviderWins`] policy.
    pub fn new(kind: Kind, strategy: Strategy, providers: Vec<ProviderHandle>) -> Result<Self> {
        if providers.is_empty() {
            exn::bail!(ErrorKind::Configuration(format!("no providers configured for {kind}")));
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
        let declared: Vec<SearchField> = providers.iter().flat_map(|provider| provider.search_fields()).collect();
        let schema = Schema::new(&declared).or_raise(|| ErrorKind::Index)?;
        let initial = Generation::initial(providers.iter().map(|provider| provider.name()), strategy, &schema);
        Ok(Self {
            kind,
            strategy,
            schema,
            providers,
            policy: Arc::new(FirstProviderWins),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            current: ArcSwap::from_pointee(initial),
            refreshing: Mutex::new(()),
        })
    }

    pub fn with_policy(mut self, policy: PolicyHandle) -> Self {
        self.policy = policy;
        self
    }

    /// Upper bound on one provider's whole enumeration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn providers(&self) -> &[ProviderHandle] {
        &self.providers
    }

    /// The currently published generation.
    pub fn generation(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    /// Re-enumerate every provider and publish the next generation.
    ///
    /// Never fails. A provider that errors or times out keeps the slice it had
    /// in the previous generation (empty if it never succeeded). If a refresh
    /// is already running, this one is skipped rather than queued.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn refresh(&self) -> RefreshReport {
        let Ok(_guard) = self.refreshing.try_lock() else {
            let current = self.current.load().number();
            tracing::debug!(generation = current, "Refresh already in progress; skipping");
            return RefreshReport::skipped(current);
        };
        let started_at = UtcDateTime::now();
        let clock = Instant::now();
        let previous = self.current.load_full();
        let number = previous.number() + 1;

        let results = join_all(self.providers.iter().map(|provider| {
            isolated(provider, self.timeout, |provider| async move { provider.enumerate().await })
        }))
        .await;

        let mut slices = Vec::with_capacity(self.providers.len());
        let mut statuses = Vec::with_capacity(self.providers.len());
        let mut outcomes = Vec::with_capacity(self.providers.len());
        let previous_slices = previous.slices().iter().zip(previous.statuses());
        for ((provider, result), (kept, status)) in self.providers.iter().zip(results).zip(previous_slices) {
            let outcome = match result {
                Ok(entries) => {
                    let fresh = Slice::new(provider.name(), self.kind, entries);
                    let entries = fresh.len();
                    statuses.push(status.succeeded(started_at, entries));
                    slices.push(Arc::new(fresh));
                    Outcome::Refreshed { entries }
                },
                Err(error) => {
                    tracing::warn!(
                        provider = provider.name(),
                        retained = kept.len(),
                        error = ?error,
                        "Provider refresh failed; keeping its previous catalog"
                    );
                    statuses.push(status.failed(error.to_string()));
                    slices.push(kept.clone());
                    Outcome::Failed { error: error.to_string(), retained: kept.len() }
                },
            };
            outcomes.push(ProviderOutcome { provider: provider.name().to_string(), outcome });
        }
        if outcomes.iter().all(|outcome| matches!(outcome.outcome, Outcome::Failed { .. })) {
            tracing::warn!(generation = number, "No provider could be refreshed");
        }

        let generation = Generation::build(
            number,
            started_at,
            slices,
            statuses,
            self.strategy,
            &self.schema,
            self.policy.as_ref(),
        );
        let entries = generation.len();
        self.current.store(Arc::new(generation));
        let elapsed = clock.elapsed();
        tracing::info!(
            generation = number,
            entries,
            elapsed_ms = elapsed.as_millis() as u64,
            "Published catalog generation"
        );
        RefreshReport { generation: number, skipped: false, outcomes, entries, elapsed }
    }

    /// Ranked titles for a query, at most 25.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let generation = self.current.load();
        generation
            .index()
            .search(query)
            .into_iter()
            .filter_map(|found| generation.canonical(&found.identity).map(|entry| SearchHit::new(entry, found.score)))
            .collect()
    }

    /// Everything the providers know about one title, or `None` if none of
    /// them lists it.
    pub fn retrieve(&self, reference: &ContentRef) -> Option<LogicalContent> {
        let generation = self.current.load();
        let identity = generation.resolve(reference)?;
        generation.reconcile(identity, self.policy.as_ref())
    }

    /// Display metadata for a provider-reported release.
    pub fn lookup_update(&self, update: &UpdateEntry) -> Option<LogicalContent> {
        if update.kind() != self.kind {
            return None;
        }
        self.retrieve(&ContentRef::from(&update.identity))
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.current.load().statuses().to_vec()
    }
}

/// Run one provider call on a task of its own, bounded by `timeout`.
///
/// A call that times out, panics or is aborted fails on its own and never
/// takes the other providers' calls down with it.
pub(crate) async fn isolated<F, Fut>(
    provider: &ProviderHandle,
    timeout: Duration,
    call: F,
) -> CatalogResult<Vec<CatalogEntry>>
where
    F: FnOnce(ProviderHandle) -> Fut,
    Fut: Future<Output = CatalogResult<Vec<CatalogEntry>>> + Send + 'static,
{
    let name = provider.name().to_string();
    let task = tokio::spawn(tokio::time::timeout(timeout, call(Arc::clone(provider))).in_current_span());
    match task.await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => exn::bail!(CatalogErrorKind::Timeout(name)),
        Err(error) => {
            tracing::warn!(provider = %name, panicked = error.is_panic(), "Provider call did not complete");
            exn::bail!(CatalogErrorKind::Crashed(name))
        },
    }
}

impl Debug for CatalogAggregator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CatalogAggregator")
            .field("kind", &self.kind)
            .field("strategy", &self.strategy)
            .field("providers", &self.providers.iter().map(|provider| provider.name()).collect::<Vec<_>>())
            .field("generation", &self.current.load().number())
            .finish()
    }
}

#[async_trait]
impl ContentAggregator for CatalogAggregator {
    fn kind(&self) -> Kind {
        self.kind
    }

    async fn refresh(&self) -> RefreshReport {
        CatalogAggregator::refresh(self).await
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        CatalogAggregator::search(self, query)
    }

    async fn retrieve(&self, reference: &ContentRef) -> Option<LogicalContent> {
        CatalogAggregator::retrieve(self, reference)
    }

    fn status(&self) -> Vec<ProviderStatus> {
        CatalogAggregator::status(self)
    }
}
