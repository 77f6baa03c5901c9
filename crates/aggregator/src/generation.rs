//! Immutable snapshots of an aggregator's catalog.

use crate::policy::MergePolicy;
use crate::reconcile::{LogicalContent, Provenance};
use crate::status::ProviderStatus;
use mediadex_catalog::CatalogEntry;
use mediadex_identity::{AddressableHash, ContentRef, Identity, Kind};
use mediadex_index::{Schema, SearchIndex, Strategy};
use std::collections::HashMap;
use std::sync::Arc;
use time::UtcDateTime;

/// One provider's catalog as of its last successful enumeration.
#[derive(Debug)]
pub struct Slice {
    provider: String,
    entries: Vec<Arc<CatalogEntry>>,
    positions: HashMap<Identity, usize>,
}
impl Slice {
    pub(crate) fn empty(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), entries: Vec::new(), positions: HashMap::new() }
    }

    /// Key a freshly enumerated catalog by identity.
    ///
    /// When a provider lists the same title twice, the first listing is kept.
    /// Entries of another kind are dropped.
    pub(crate) fn new(provider: impl Into<String>, kind: Kind, enumerated: Vec<CatalogEntry>) -> Self {
        let mut slice = Self::empty(provider);
        let mut dropped = 0usize;
        for entry in enumerated {
            if entry.kind() != kind || slice.positions.contains_key(entry.identity()) {
                dropped += 1;
                continue;
            }
            slice.positions.insert(entry.identity().clone(), slice.entries.len());
            slice.entries.push(Arc::new(entry));
        }
        if dropped > 0 {
            tracing::debug!(provider = %slice.provider, dropped, "Dropped duplicate or foreign entries");
        }
        slice
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn get(&self, identity: &Identity) -> Option<&Arc<CatalogEntry>> {
        self.positions.get(identity).map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CatalogEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a reader needs, published as one unit.
///
/// Slices, lookup tables, the search index and provider statuses always come
/// from the same refresh, so a reader holding a generation never sees one
/// provider's new data next to another's stale index.
#[derive(Debug)]
pub struct Generation {
    number: u64,
    started_at: UtcDateTime,
    slices: Vec<Arc<Slice>>,
    canonical: HashMap<Identity, Arc<CatalogEntry>>,
    hashes: HashMap<AddressableHash, Identity>,
    index: SearchIndex,
    statuses: Vec<ProviderStatus>,
}
impl Generation {
    /// Generation zero: one empty slice per provider, nothing indexed.
    pub(crate) fn initial<'a>(
        providers: impl IntoIterator<Item = &'a str>,
        strategy: Strategy,
        schema: &Schema,
    ) -> Self {
        let (slices, statuses) = providers
            .into_iter()
            .map(|provider| (Arc::new(Slice::empty(provider)), ProviderStatus::unknown(provider)))
            .unzip();
        Self {
            number: 0,
            started_at: UtcDateTime::now(),
            slices,
            canonical: HashMap::new(),
            hashes: HashMap::new(),
            index: SearchIndex::empty(strategy, schema),
            statuses,
        }
    }

    /// Deduplicate the slices in order and index the result.
    pub(crate) fn build(
        number: u64,
        started_at: UtcDateTime,
        slices: Vec<Arc<Slice>>,
        statuses: Vec<ProviderStatus>,
        strategy: Strategy,
        schema: &Schema,
        policy: &dyn MergePolicy,
    ) -> Self {
        let mut order: Vec<Identity> = Vec::new();
        let mut provenance: HashMap<Identity, Vec<Provenance>> = HashMap::new();
        for slice in &slices {
            for entry in slice.iter() {
                let found = provenance.entry(entry.identity().clone()).or_insert_with(|| {
                    order.push(entry.identity().clone());
                    Vec::new()
                });
                found.push(Provenance::new(slice.provider(), entry.clone()));
            }
        }

        let mut canonical = HashMap::with_capacity(order.len());
        let mut hashes = HashMap::with_capacity(order.len());
        let mut documents = Vec::with_capacity(order.len());
        for identity in order {
            let Some(content) = provenance.remove(&identity).and_then(|found| {
                LogicalContent::reconcile(identity, found, policy)
            }) else {
                continue;
            };
            hashes.insert(content.hash, content.identity.clone());
            documents.push(content.searchable());
            canonical.insert(content.identity, content.entry);
        }
        let index = SearchIndex::build(strategy, schema, documents.iter().map(|entry| &**entry));

        Self { number, started_at, slices, canonical, hashes, index, statuses }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn started_at(&self) -> UtcDateTime {
        self.started_at
    }

    pub fn slices(&self) -> &[Arc<Slice>] {
        &self.slices
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn statuses(&self) -> &[ProviderStatus] {
        &self.statuses
    }

    /// Distinct identities across all slices.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// The display payload of a title, if any provider lists it.
    pub fn canonical(&self, identity: &Identity) -> Option<&Arc<CatalogEntry>> {
        self.canonical.get(identity)
    }

    /// Turn either form of reference into an identity known to this generation.
    pub fn resolve(&self, reference: &ContentRef) -> Option<&Identity> {
        match reference {
            ContentRef::Identity(identity) => self.canonical.get_key_value(identity).map(|(identity, _)| identity),
            ContentRef::Hash(hash) => self.hashes.get(hash),
        }
    }

    /// Every provider's entry for the identity, reconciled with the policy.
    pub fn reconcile(&self, identity: &Identity, policy: &dyn MergePolicy) -> Option<LogicalContent> {
        let provenance = self
            .slices
            .iter()
            .filter_map(|slice| slice.get(identity).map(|entry| Provenance::new(slice.provider(), entry.clone())))
            .collect();
        LogicalContent::reconcile(identity.clone(), provenance, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FirstProviderWins;

    fn manga(name: &str, language: &str) -> CatalogEntry {
        CatalogEntry::new(Kind::Manga, name, language)
    }

    fn generation() -> Generation {
        let slices = vec![
            Arc::new(Slice::new("a", Kind::Manga, vec![manga("One Piece", "fr"), manga("Berserk", "fr")])),
            Arc::new(Slice::new("b", Kind::Manga, vec![manga("ONE PIECE!", "en"), manga("Vagabond", "en")])),
        ];
        let statuses = vec![ProviderStatus::unknown("a"), ProviderStatus::unknown("b")];
        Generation::build(
            1,
            UtcDateTime::now(),
            slices,
            statuses,
            Strategy::Inverted,
            &Schema::default(),
            &FirstProviderWins,
        )
    }

    #[test]
    fn test_slice_keeps_first_listing() {
        let slice = Slice::new(
            "a",
            Kind::Manga,
            vec![manga("Berserk", "fr"), manga("BERSERK", "en"), CatalogEntry::new(Kind::Anime, "Berserk", "en")],
        );
        assert_eq!(slice.len(), 1);
        let entry = slice.get(&Identity::new(Kind::Manga, "berserk")).unwrap();
        assert_eq!(entry.language, "fr");
    }

    #[test]
    fn test_dedupe_across_slices() {
        let generation = generation();
        assert_eq!(generation.len(), 3);
        assert_eq!(generation.index().len(), 3);
        let one_piece = Identity::new(Kind::Manga, "one piece");
        assert_eq!(generation.canonical(&one_piece).unwrap().name(), "One Piece");
    }

    #[test]
    fn test_fuzzy_index_sees_every_alias() {
        let slices = vec![
            Arc::new(Slice::new("a", Kind::Manga, vec![manga("Shingeki no Kyojin", "ja")])),
            Arc::new(Slice::new(
                "b",
                Kind::Manga,
                vec![
                    manga("Shingeki no Kyojin", "en").with_aliases(["Attack on Titan"]),
                    manga("Titan Attack Force", "en"),
                ],
            )),
        ];
        let statuses = vec![ProviderStatus::unknown("a"), ProviderStatus::unknown("b")];
        let generation = Generation::build(
            1,
            UtcDateTime::now(),
            slices,
            statuses,
            Strategy::Fuzzy,
            &Schema::default(),
            &FirstProviderWins,
        );
        let results = generation.index().search("attack on titan");
        assert_eq!(results[0].identity, Identity::new(Kind::Manga, "Shingeki no Kyojin"));
        assert_eq!(results[0].score, 1.0);

        let canonical = generation.canonical(&results[0].identity).unwrap();
        assert_eq!(canonical.language, "ja");
        assert!(canonical.aliases.is_empty());
    }

    #[test]
    fn test_resolve() {
        let generation = generation();
        let identity = Identity::new(Kind::Manga, "Vagabond");
        assert_eq!(generation.resolve(&ContentRef::from(&identity)), Some(&identity));
        assert_eq!(generation.resolve(&ContentRef::from(identity.hash())), Some(&identity));
        let unknown = Identity::new(Kind::Manga, "Monster");
        assert_eq!(generation.resolve(&ContentRef::from(&unknown)), None);
        assert_eq!(generation.resolve(&ContentRef::from(unknown.hash())), None);
    }

    #[test]
    fn test_reconcile_in_provider_order() {
        let generation = generation();
        let content = generation.reconcile(&Identity::new(Kind::Manga, "one piece"), &FirstProviderWins).unwrap();
        assert_eq!(content.providers().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(content.name(), "One Piece");
        assert!(generation.reconcile(&Identity::new(Kind::Manga, "monster"), &FirstProviderWins).is_none());
    }

    #[test]
    fn test_initial_is_empty() {
        let generation = Generation::initial(["a", "b"], Strategy::Fuzzy, &Schema::default());
        assert_eq!(generation.number(), 0);
        assert_eq!(generation.slices().len(), 2);
        assert!(generation.is_empty());
        assert!(generation.index().is_empty());
        assert_eq!(generation.statuses()[1].provider, "b");
    }
}
