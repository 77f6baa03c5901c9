//! Aggregation of unreliable content providers into one searchable catalog
//! per content kind.
//!
//! Each [`Kind`] is served by one [`ContentAggregator`]:
//!
//! - [`CatalogAggregator`] for providers that can enumerate their catalog.
//!   It periodically pulls every provider, reconciles titles across them by
//!   [identity](mediadex_identity::Identity), and publishes the result
//!   together with a search index as one immutable [`Generation`].
//! - [`OnDemandAggregator`] for providers that can only be searched. Results
//!   are kept in a short-lived [`TtlCache`] so they can be retrieved again.
//!
//! A [`Registry`] holds one aggregator per kind, and [`schedule::spawn()`]
//! refreshes them all on an interval.

mod aggregator;
pub mod error;
mod generation;
mod hit;
mod policy;
mod reconcile;
mod registry;
pub mod schedule;
mod status;
mod ttl;

pub use crate::aggregator::{CatalogAggregator, DEFAULT_PROVIDER_TIMEOUT};
pub use crate::generation::{Generation, Slice};
pub use crate::hit::SearchHit;
pub use crate::policy::{FillMissing, FirstProviderWins, MergePolicy, PolicyHandle};
pub use crate::reconcile::{LogicalContent, Provenance};
pub use crate::registry::Registry;
pub use crate::status::{Health, Outcome, ProviderOutcome, ProviderStatus, RefreshReport};
pub use crate::ttl::{DEFAULT_CAPACITY, DEFAULT_TTL, OnDemandAggregator, TtlCache};
use async_trait::async_trait;
use mediadex_identity::{ContentRef, Kind};
use std::sync::Arc;

/// What the presentation layer sees of one content kind.
#[async_trait]
pub trait ContentAggregator: Send + Sync {
    fn kind(&self) -> Kind;

    /// Bring the catalog up to date. Provider failures are reported, never
    /// raised.
    async fn refresh(&self) -> RefreshReport;

    /// At most 25 ranked hits. Too short or unmatched queries are empty.
    async fn search(&self, query: &str) -> Vec<SearchHit>;

    async fn retrieve(&self, reference: &ContentRef) -> Option<LogicalContent>;

    fn status(&self) -> Vec<ProviderStatus>;
}

pub type AggregatorHandle = Arc<dyn ContentAggregator + Send + Sync>;
