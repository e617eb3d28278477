use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, Receiver};
use tracing::{Instrument, debug, error, info, info_span};

use super::{FeedTransport, parser::parse_ticker};
use crate::registry::{InstrumentRegistry, RecordOutcome};
use crate::types::Source;

pub const FEED_CHANNEL_CAPACITY: usize = 1024;

/// Where a tick's timestamp comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Stamp with the local receipt time.
    #[default]
    Receipt,
    /// Use the message's event time, falling back to receipt time when absent.
    Exchange,
}

/// Per-feed ingestion counters.
#[derive(Clone, Default, Debug)]
pub struct FeedCounters {
    pub accepted: Arc<AtomicU64>,
    pub unknown_symbol: Arc<AtomicU64>,
    pub invalid_price: Arc<AtomicU64>,
    pub decode_errors: Arc<AtomicU64>,
}

impl FeedCounters {
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn unknown_symbol(&self) -> u64 {
        self.unknown_symbol.load(Ordering::Relaxed)
    }

    pub fn invalid_price(&self) -> u64 {
        self.invalid_price.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }
}

/// Routes decoded ticks from one labelled feed into the shared registry.
///
/// Primary and secondary feeds each get their own merger over the same
/// registry; the source-priority rule lives in the registry update.
#[derive(Clone)]
pub struct FeedMerger {
    registry: Arc<InstrumentRegistry>,
    source: Source,
    timestamps: TimestampPolicy,
    counters: FeedCounters,
}

impl FeedMerger {
    pub fn new(registry: Arc<InstrumentRegistry>, source: Source, timestamps: TimestampPolicy) -> Self {
        Self {
            registry,
            source,
            timestamps,
            counters: FeedCounters::default(),
        }
    }

    pub fn counters(&self) -> &FeedCounters {
        &self.counters
    }

    /// Handles one raw message. Never fails: bad input is logged and counted.
    pub fn ingest(&self, raw: &str, received_at: DateTime<Utc>) -> Option<RecordOutcome> {
        let tick = match parse_ticker(raw) {
            Ok(t) => t,
            Err(e) => {
                self.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                error!(source = ?self.source, error = %e, raw = %raw, "failed to decode feed message");
                return None;
            }
        };

        let ts = match self.timestamps {
            TimestampPolicy::Receipt => received_at,
            TimestampPolicy::Exchange => tick.event_time.unwrap_or(received_at),
        };

        let outcome = self
            .registry
            .record_update(&tick.symbol, tick.price, ts, self.source);

        let counter = match outcome {
            RecordOutcome::Accepted => &self.counters.accepted,
            RecordOutcome::UnknownSymbol => &self.counters.unknown_symbol,
            RecordOutcome::InvalidPrice => &self.counters.invalid_price,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        Some(outcome)
    }

    /// Consumes messages until every sender is gone.
    pub async fn run(self, mut rx: Receiver<String>) -> FeedCounters {
        info!(source = ?self.source, "feed ingestion loop started");

        while let Some(raw) = rx.recv().await {
            self.ingest(&raw, Utc::now());
        }

        info!(
            source = ?self.source,
            accepted = self.counters.accepted(),
            unknown_symbol = self.counters.unknown_symbol(),
            invalid_price = self.counters.invalid_price(),
            decode_errors = self.counters.decode_errors(),
            "feed ingestion loop terminated"
        );

        self.counters
    }

    /// Spawns the transport task and the ingestion task for this feed.
    ///
    /// Returns both handles; aborting them is the only shutdown path.
    pub fn spawn<T>(self, transport: Arc<T>) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<FeedCounters>)
    where
        T: FeedTransport + 'static,
    {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        let span = info_span!("feed", source = ?self.source);

        let transport_task = tokio::spawn(
            async move {
                if let Err(e) = transport.stream_messages(tx).await {
                    error!(error = ?e, "feed transport crashed");
                }
                debug!("feed transport task finished");
            }
            .instrument(span.clone()),
        );

        let ingest_task = tokio::spawn(self.run(rx).instrument(span));

        (transport_task, ingest_task)
    }
}
