use crate::error::{ErrorKind, Result};
use crate::{AggregatorHandle, LogicalContent, RefreshReport, SearchHit};
use futures::future::join_all;
use mediadex_catalog::UpdateEntry;
use mediadex_identity::{ContentRef, Kind};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};

/// One aggregator per content kind.
#[derive(Default, Clone)]
pub struct Registry {
    aggregators: BTreeMap<Kind, AggregatorHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, aggregator: AggregatorHandle) -> Result<()> {
        let kind = aggregator.kind();
        if self.aggregators.contains_key(&kind) {
            exn::bail!(ErrorKind::Configuration(format!("{kind} already has an aggregator")));
        }
        self.aggregators.insert(kind, aggregator);
        Ok(())
    }

    pub fn with(mut self, aggregator: AggregatorHandle) -> Result<Self> {
        self.register(aggregator)?;
        Ok(self)
    }

    pub fn get(&self, kind: Kind) -> Option<&AggregatorHandle> {
        self.aggregators.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.aggregators.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Kind, &AggregatorHandle)> {
        self.aggregators.iter().map(|(kind, aggregator)| (*kind, aggregator))
    }

    pub fn is_empty(&self) -> bool {
        self.aggregators.is_empty()
    }

    /// Refresh every kind concurrently.
    pub async fn refresh_all(&self) -> Vec<(Kind, RefreshReport)> {
        join_all(self.aggregators.iter().map(|(kind, aggregator)| async move { (*kind, aggregator.refresh().await) }))
            .await
    }

    /// Search one kind; an unregistered kind has no results.
    pub async fn search(&self, kind: Kind, query: &str) -> Vec<SearchHit> {
        match self.get(kind) {
            Some(aggregator) => aggregator.search(query).await,
            None => Vec::new(),
        }
    }

    /// Retrieve by identity from its own kind, or by hash from whichever kind
    /// knows it.
    pub async fn retrieve(&self, reference: &ContentRef) -> Option<LogicalContent> {
        if let ContentRef::Identity(identity) = reference {
            return self.get(identity.kind())?.retrieve(reference).await;
        }
        for aggregator in self.aggregators.values() {
            if let Some(content) = aggregator.retrieve(reference).await {
                return Some(content);
            }
        }
        None
    }

    pub async fn lookup_update(&self, update: &UpdateEntry) -> Option<LogicalContent> {
        self.retrieve(&ContentRef::from(&update.identity)).await
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_set().entries(self.kinds()).finish()
    }
}
