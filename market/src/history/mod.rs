//! Historical bootstrap.
//!
//! Fetches a fixed window of closed candles per symbol once at startup and
//! seeds the registry. A failed fetch leaves that symbol empty; it fills from
//! live ticks.

pub mod binance;

pub use binance::BinanceKlinesClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::logger::child_span;
use futures::StreamExt;
use tracing::{Instrument, info, warn};

use crate::error::FetchError;
use crate::registry::InstrumentRegistry;
use crate::types::Sample;

/// Source of historical `(timestamp, price)` pairs, oldest first.
#[async_trait]
pub trait HistoryApi: Send + Sync {
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Sample>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    /// Candle interval, e.g. `1h`.
    pub interval: String,
    /// Number of candles per symbol.
    pub limit: usize,
    /// Maximum fetches in flight.
    pub concurrency: usize,
    /// Pause after each fetch, per worker.
    pub pause: Duration,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            interval: "1h".to_string(),
            limit: 200,
            concurrency: 4,
            pause: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub seeded: usize,
    pub failed: Vec<String>,
}

/// Bootstraps every registered symbol with bounded concurrency.
pub async fn bootstrap_all<H>(
    api: Arc<H>,
    registry: Arc<InstrumentRegistry>,
    settings: &BootstrapSettings,
) -> BootstrapReport
where
    H: HistoryApi + ?Sized,
{
    info!(
        symbols = registry.symbols().len(),
        interval = %settings.interval,
        limit = settings.limit,
        concurrency = settings.concurrency,
        "bootstrapping price history"
    );

    let results: Vec<(String, bool)> = futures::stream::iter(registry.symbols().to_vec())
        .map(|symbol| {
            let api = Arc::clone(&api);
            let registry = Arc::clone(&registry);
            let span = child_span("bootstrap");
            span.record("symbol", symbol.as_str());
            async move {
                let ok = match api.fetch_history(&symbol, &settings.interval, settings.limit).await {
                    Ok(samples) if !samples.is_empty() => {
                        registry.bootstrap(&symbol, samples);
                        true
                    }
                    Ok(_) => {
                        warn!(error = %FetchError::Empty, "history fetch failed");
                        false
                    }
                    Err(e) => {
                        warn!(error = %e, "history fetch failed");
                        false
                    }
                };
                if !settings.pause.is_zero() {
                    tokio::time::sleep(settings.pause).await;
                }
                (symbol, ok)
            }
            .instrument(span)
        })
        .buffer_unordered(settings.concurrency.max(1))
        .collect()
        .await;

    let mut report = BootstrapReport::default();
    for (symbol, ok) in results {
        if ok {
            report.seeded += 1;
        } else {
            report.failed.push(symbol);
        }
    }
    report.failed.sort();

    info!(
        seeded = report.seeded,
        failed = report.failed.len(),
        "history bootstrap finished"
    );

    report
}
