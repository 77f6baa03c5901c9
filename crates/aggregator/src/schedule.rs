//! Periodic refresh of every registered aggregator.

use crate::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default time between two refreshes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// Refresh every aggregator now, then once per `interval`, until cancelled.
///
/// A tick that comes due while the previous refresh is still running is
/// skipped rather than queued. Panics if `interval` is zero.
pub fn spawn(registry: Arc<Registry>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    for (kind, report) in registry.refresh_all().await {
                        if report.is_total_failure() {
                            tracing::warn!(
                                %kind,
                                generation = report.generation,
                                "Scheduled refresh found every provider down"
                            );
                        }
                    }
                },
            }
        }
        tracing::info!("Refresh schedule stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogAggregator;
    use mediadex_catalog::ProviderHandle;
    use mediadex_catalog::provider::MockProvider;
    use mediadex_identity::Kind;
    use mediadex_index::Strategy;

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_interval_until_cancelled() {
        let provider = Arc::new(MockProvider::new("scans", Kind::Manga).with_names(["Berserk"]));
        let handle: ProviderHandle = provider.clone();
        let aggregator = Arc::new(CatalogAggregator::new(Kind::Manga, Strategy::Inverted, vec![handle]).unwrap());
        let registry = Arc::new(Registry::new().with(aggregator.clone()).unwrap());
        let cancel = CancellationToken::new();

        let task = spawn(registry, Duration::from_secs(60), cancel.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.enumerate_calls(), 1);
        assert_eq!(aggregator.generation().number(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(provider.enumerate_calls(), 3);

        cancel.cancel();
        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(provider.enumerate_calls(), 3);
    }
}
