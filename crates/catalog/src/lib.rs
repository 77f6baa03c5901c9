//! Catalog data model and the provider adapter capability.
//!
//! Providers are the unreliable outside world: each one knows how to
//! enumerate (or, for some sites, only search) the titles of one content
//! [`Kind`](mediadex_identity::Kind). Everything they return is a
//! [`CatalogEntry`]: one provider's view of one title as of one refresh.

pub mod error;
pub mod models;
pub mod provider;

pub use crate::models::{CatalogEntry, Sequence, UpdateEntry};
pub use crate::provider::{Provider, SearchField};
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn Provider + Send + Sync>;
