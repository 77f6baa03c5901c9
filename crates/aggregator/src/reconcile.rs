//! Provider-independent views of a title.

use crate::policy::MergePolicy;
use mediadex_catalog::CatalogEntry;
use mediadex_identity::{AddressableHash, Identity};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

/// One provider's entry for a title.
#[derive(Clone, PartialEq)]
pub struct Provenance {
    pub provider: String,
    pub entry: Arc<CatalogEntry>,
}
impl Provenance {
    pub fn new(provider: impl Into<String>, entry: Arc<CatalogEntry>) -> Self {
        Self { provider: provider.into(), entry }
    }
}
impl Debug for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Provenance")
            .field("provider", &self.provider)
            .field("identity", self.entry.identity())
            .field("language", &self.entry.language)
            .finish()
    }
}

/// A title as seen through every provider that lists it.
///
/// Built on demand from the current generation and never cached, so it always
/// reflects the generation it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalContent {
    pub identity: Identity,
    pub hash: AddressableHash,
    /// Display payload chosen by the merge policy.
    pub entry: Arc<CatalogEntry>,
    /// Every provider entry for this identity, in provider configuration order.
    pub provenance: Vec<Provenance>,
}
impl LogicalContent {
    /// `None` if no provider lists the title.
    pub fn reconcile(identity: Identity, provenance: Vec<Provenance>, policy: &dyn MergePolicy) -> Option<Self> {
        let (first, rest) = provenance.split_first()?;
        let entry = policy.merge(first, rest);
        Some(Self { hash: identity.hash(), identity, entry, provenance })
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.provenance.iter().map(|provenance| provenance.provider.as_str())
    }

    /// Language → providers offering the title in that language.
    pub fn languages(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut languages: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for provenance in &self.provenance {
            languages.entry(provenance.entry.language.as_str()).or_default().push(provenance.provider.as_str());
        }
        languages
    }

    /// Genres reported by any provider.
    pub fn genres(&self) -> BTreeSet<&str> {
        self.provenance.iter().flat_map(|provenance| provenance.entry.genres.iter().map(String::as_str)).collect()
    }

    /// Every other name any provider knows the title by.
    pub fn aliases(&self) -> BTreeSet<&str> {
        self.provenance
            .iter()
            .flat_map(|provenance| provenance.entry.names())
            .filter(|name| *name != self.name())
            .collect()
    }

    /// The display payload with every name any provider knows the title by
    /// added to its aliases, for indexing.
    pub fn searchable(&self) -> Arc<CatalogEntry> {
        let aliases = self.aliases();
        if aliases.iter().all(|alias| self.entry.aliases.contains(*alias)) {
            return self.entry.clone();
        }
        Arc::new(CatalogEntry::clone(&self.entry).with_aliases(aliases))
    }
}
