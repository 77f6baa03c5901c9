//! Turns a validated configuration into a registry of aggregators.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mediadex_aggregator::{
    CatalogAggregator, FillMissing, FirstProviderWins, OnDemandAggregator, PolicyHandle, Registry,
};
use mediadex_catalog::ProviderHandle;
use mediadex_catalog::provider::FileProvider;
use mediadex_config::{Config, Merge, Strategy};
use mediadex_identity::Kind;
use std::sync::Arc;

/// One aggregator per configured kind that has at least one provider.
pub fn registry(config: &Config) -> Result<Registry> {
    let mut registry = Registry::new();
    for (&kind, settings) in &config.kinds {
        let providers = providers(config, kind);
        if providers.is_empty() {
            tracing::debug!(%kind, "No providers configured; kind disabled");
            continue;
        }
        let timeout = config.refresh.provider_timeout();
        let policy: PolicyHandle = match settings.merge {
            Merge::FirstWins => Arc::new(FirstProviderWins),
            Merge::FillMissing => Arc::new(FillMissing),
        };
        let aggregator: mediadex_aggregator::AggregatorHandle = match settings.strategy {
            Strategy::Inverted | Strategy::Fuzzy => {
                let strategy = match settings.strategy {
                    Strategy::Fuzzy => mediadex_index::Strategy::Fuzzy,
                    _ => mediadex_index::Strategy::Inverted,
                };
                let aggregator =
                    CatalogAggregator::new(kind, strategy, providers).or_raise(|| ErrorKind::Setup)?;
                Arc::new(aggregator.with_policy(policy).with_timeout(timeout))
            },
            Strategy::OnDemand => {
                let aggregator =
                    OnDemandAggregator::new(kind, providers, config.on_demand.capacity, config.on_demand.ttl())
                        .or_raise(|| ErrorKind::Setup)?;
                Arc::new(aggregator.with_policy(policy).with_timeout(timeout))
            },
        };
        tracing::debug!(%kind, strategy = ?settings.strategy, merge = ?settings.merge, "Registered aggregator");
        registry.register(aggregator).or_raise(|| ErrorKind::Setup)?;
    }
    Ok(registry)
}

fn providers(config: &Config, kind: Kind) -> Vec<ProviderHandle> {
    config
        .providers_for(kind)
        .map(|settings| {
            let provider = settings.search_fields.iter().fold(
                FileProvider::new(settings.name.as_str(), kind, settings.path.clone()),
                |provider, (field, boost)| provider.with_search_field(field.as_str(), *boost),
            );
            Arc::new(provider) as ProviderHandle
        })
        .collect()
}
