//! In-memory provider for testing.

use super::{Provider, SearchField, matches_query};
use crate::error::{ErrorKind, Result};
use crate::models::CatalogEntry;
use async_trait::async_trait;
use mediadex_identity::Kind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};

/// In-memory provider for testing.
///
/// Entries are stored behind a [`RwLock`] so tests can swap the catalog
/// between refreshes, and the provider can be switched into a failing state at
/// any time. Calls can be slowed down with [`with_delay()`](Self::with_delay)
/// or held until the test releases them with
/// [`with_gate()`](Self::with_gate).
///
/// # Examples
///
/// ```
/// use mediadex_catalog::Provider;
/// use mediadex_catalog::provider::MockProvider;
/// use mediadex_identity::Kind;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new("mock", Kind::Manga).with_names(["Berserk", "Vagabond"]);
/// assert_eq!(provider.enumerate().await.unwrap().len(), 2);
///
/// provider.set_failing(true);
/// assert!(provider.enumerate().await.is_err());
/// # }
/// ```
pub struct MockProvider {
    name: String,
    kind: Kind,
    entries: RwLock<Vec<CatalogEntry>>,
    search_fields: Vec<SearchField>,
    failing: AtomicBool,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    enumerate_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            entries: RwLock::new(Vec::new()),
            search_fields: Vec::new(),
            failing: AtomicBool::new(false),
            delay: None,
            gate: None,
            enumerate_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    /// Pre-populate the catalog.
    ///
    /// Panics if an entry is of a different kind than the provider. If test
    /// setup is wrong, then test should not pass.
    pub fn with_entries(mut self, entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries: Vec<_> = entries.into_iter().collect();
        if let Some(entry) = entries.iter().find(|entry| entry.kind() != self.kind) {
            panic!("MockProvider::with_entries: {} is not a {}", entry.identity(), self.kind);
        }
        self.entries = RwLock::new(entries);
        self
    }

    /// Pre-populate the catalog with bare entries (language "en").
    pub fn with_names(self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let kind = self.kind;
        self.with_entries(names.into_iter().map(|name| CatalogEntry::new(kind, name, "en")))
    }

    pub fn with_search_field(mut self, name: impl Into<String>, boost: f64) -> Self {
        self.search_fields.push(SearchField::new(name, boost));
        self
    }

    /// Sleep (on the Tokio clock) before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Each call consumes one permit from the semaphore before answering.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn failing(self) -> Self {
        self.set_failing(true);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn set_entries(&self, entries: impl IntoIterator<Item = CatalogEntry>) {
        *self.entries.write().await = entries.into_iter().collect();
    }

    pub fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<Vec<CatalogEntry>> {
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => exn::bail!(ErrorKind::SourceUnavailable(self.name.clone())),
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::SourceUnavailable(self.name.clone()));
        }
        Ok(self.entries.read().await.clone())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> Kind {
        self.kind
    }

    fn search_fields(&self) -> Vec<SearchField> {
        self.search_fields.clone()
    }

    async fn enumerate(&self) -> Result<Vec<CatalogEntry>> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        self.answer().await
    }

    async fn search(&self, query: &str) -> Result<Vec<CatalogEntry>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer().await?.into_iter().filter(|entry| matches_query(entry, query)).collect())
    }
}
