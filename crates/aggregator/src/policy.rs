use crate::reconcile::Provenance;
use mediadex_catalog::CatalogEntry;
use std::fmt::Debug;
use std::sync::Arc;

/// Picks the display payload of a title offered by several providers.
///
/// Provenance is always in provider configuration order and never empty.
pub trait MergePolicy: Debug + Send + Sync {
    fn merge(&self, first: &Provenance, rest: &[Provenance]) -> Arc<CatalogEntry>;
}

pub type PolicyHandle = Arc<dyn MergePolicy + Send + Sync>;

/// The first configured provider that lists a title supplies its metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstProviderWins;
impl MergePolicy for FirstProviderWins {
    fn merge(&self, first: &Provenance, _rest: &[Provenance]) -> Arc<CatalogEntry> {
        first.entry.clone()
    }
}

/// Like [`FirstProviderWins`], but a description or thumbnail the first
/// provider lacks is taken from the next provider that has one.
///
/// Fields the first provider does set are never overridden.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillMissing;
impl MergePolicy for FillMissing {
    fn merge(&self, first: &Provenance, rest: &[Provenance]) -> Arc<CatalogEntry> {
        let description = match first.entry.description {
            Some(_) => None,
            None => rest.iter().find_map(|provenance| provenance.entry.description.clone()),
        };
        let thumbnail = match first.entry.thumbnail {
            Some(_) => None,
            None => rest.iter().find_map(|provenance| provenance.entry.thumbnail.clone()),
        };
        if description.is_none() && thumbnail.is_none() {
            return first.entry.clone();
        }
        let mut entry = CatalogEntry::clone(&first.entry);
        entry.description = entry.description.or(description);
        entry.thumbnail = entry.thumbnail.or(thumbnail);
        Arc::new(entry)
    }
}
