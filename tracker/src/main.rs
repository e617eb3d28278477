mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use common::logger::{LogFormat, init_logger};
use market::{
    InstrumentRegistry, Source,
    alert::{AlertDebouncer, LogNotifier, Notifier, WebhookNotifier},
    feed::{BinanceTickerStream, FeedCounters, FeedMerger},
    history::{BinanceKlinesClient, bootstrap_all},
    manager::MarketManager,
    render::TableRenderer,
    signal::WindowCalculator,
};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info};

use crate::cli::Cli;
use crate::config::AppConfig;

/// Starts one transport + ingestion pair per venue.
fn start_feeds(
    cfg: &AppConfig,
    registry: &Arc<InstrumentRegistry>,
) -> (Vec<AbortHandle>, Vec<(Source, FeedCounters)>) {
    let venues = [
        (Source::Primary, cfg.primary_ws_url.as_str()),
        (Source::Secondary, cfg.secondary_ws_url.as_str()),
    ];

    let mut handles = Vec::new();
    let mut counters = Vec::new();
    for (source, url) in venues {
        let transport = Arc::new(BinanceTickerStream::new(
            url,
            registry.symbols(),
            cfg.reconnect_backoff,
        ));
        let merger = FeedMerger::new(Arc::clone(registry), source, cfg.timestamps);
        counters.push((source, merger.counters().clone()));

        let (transport_task, ingest_task) = merger.spawn(transport);
        handles.push(transport_task.abort_handle());
        handles.push(ingest_task.abort_handle());
    }
    (handles, counters)
}

/// Builds the manager around whichever notifier is configured and runs the evaluation loop.
fn start_evaluation<N: Notifier + 'static>(
    cfg: &AppConfig,
    registry: Arc<InstrumentRegistry>,
    notifier: Arc<N>,
) -> JoinHandle<()> {
    let manager = Arc::new(MarketManager::new(
        registry,
        WindowCalculator::new(cfg.windows.clone()),
        cfg.thresholds.clone(),
        AlertDebouncer::new(cfg.alert_cooldown),
        notifier,
    ));
    let sink = Arc::new(TableRenderer::stdout(manager.labels()));

    tokio::spawn(manager.run(cfg.eval_interval, sink))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logger("price-tracker", format);

    let cfg = AppConfig::from_cli(&cli)?;
    info!(
        symbols = cfg.symbols.len(),
        windows = cfg.windows.len(),
        capacity = cfg.capacity,
        "starting price tracker"
    );

    let registry = Arc::new(InstrumentRegistry::new(cfg.symbols.clone(), cfg.capacity));

    let history = Arc::new(BinanceKlinesClient::new(
        cfg.primary_rest_url.clone(),
        cfg.secondary_rest_url.clone(),
    )?);
    bootstrap_all(history, Arc::clone(&registry), &cfg.bootstrap).await;

    let (mut tasks, counters) = start_feeds(&cfg, &registry);

    let mut evaluation = match &cfg.webhook_url {
        Some(url) => {
            let webhook = WebhookNotifier::new(url.clone())?;
            start_evaluation(&cfg, Arc::clone(&registry), Arc::new(webhook))
        }
        None => start_evaluation(&cfg, Arc::clone(&registry), Arc::new(LogNotifier)),
    };
    tasks.push(evaluation.abort_handle());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown signal received");
        }
        exited = &mut evaluation => {
            error!(result = ?exited, "evaluation loop exited; shutting down");
        }
    }

    for t in &tasks {
        t.abort();
    }

    for (source, c) in counters {
        info!(
            ?source,
            accepted = c.accepted(),
            unknown_symbol = c.unknown_symbol(),
            invalid_price = c.invalid_price(),
            decode_errors = c.decode_errors(),
            "feed totals"
        );
    }

    Ok(())
}
