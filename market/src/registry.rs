//! InstrumentRegistry
//!
//! Owns one record per tracked symbol: the bounded price history, the latest
//! price and the label of the feed that supplied it. The symbol map is fixed
//! at construction, so each record carries its own lock and updates to
//! different symbols never contend.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::rolling_window::{BufferSnapshot, TimeSeriesBuffer};
use crate::types::{Sample, Source};

#[derive(Debug)]
pub struct InstrumentRecord {
    pub symbol: String,
    pub buffer: TimeSeriesBuffer,
    pub latest_price: Option<f64>,
    pub latest_source: Source,
}

impl InstrumentRecord {
    fn new(symbol: String, capacity: usize) -> Self {
        Self {
            symbol,
            buffer: TimeSeriesBuffer::new(capacity),
            latest_price: None,
            latest_source: Source::Unknown,
        }
    }
}

/// Consistent read of one record, taken under a single lock acquisition.
#[derive(Debug, Clone)]
pub struct RecordView {
    pub latest_price: Option<f64>,
    pub latest_source: Source,
    pub history: BufferSnapshot,
}

/// What happened to an update handed to [`InstrumentRegistry::record_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted,
    UnknownSymbol,
    InvalidPrice,
}

pub struct InstrumentRegistry {
    records: HashMap<String, Arc<Mutex<InstrumentRecord>>>,
    /// Configured order, without duplicates.
    symbols: Vec<String>,
}

impl InstrumentRegistry {
    /// Creates an empty record for every symbol. Duplicates are collapsed, first occurrence wins the position.
    pub fn new<I, S>(symbols: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut records = HashMap::new();
        let mut ordered = Vec::new();

        for symbol in symbols {
            let symbol: String = symbol.into();
            if records.contains_key(&symbol) {
                continue;
            }
            records.insert(
                symbol.clone(),
                Arc::new(Mutex::new(InstrumentRecord::new(symbol.clone(), capacity))),
            );
            ordered.push(symbol);
        }

        info!(symbols = ordered.len(), capacity, "instrument registry created");

        Self {
            records,
            symbols: ordered,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Seeds a symbol's history from an oldest-first list.
    ///
    /// Live samples that arrived before the bootstrap finished are merged back
    /// in, so nothing already ingested is lost. An empty list leaves the buffer as is.
    pub fn bootstrap(&self, symbol: &str, samples: Vec<Sample>) {
        let Some(record) = self.records.get(symbol) else {
            warn!(symbol, "bootstrap for untracked symbol ignored");
            return;
        };

        if samples.is_empty() {
            warn!(symbol, "no bootstrap data; symbol waits for live updates");
            return;
        }

        let seeded = samples.len();
        let mut rec = record.lock();
        let live: Vec<Sample> = rec.buffer.iter().copied().collect();
        rec.buffer.reset_with(samples.into_iter().chain(live));

        debug!(symbol, seeded, len = rec.buffer.len(), "history bootstrapped");
    }

    /// Appends a live price and applies the source policy: once a symbol's
    /// label is `Primary` a `Secondary` tick never downgrades it.
    pub fn record_update(
        &self,
        symbol: &str,
        price: f64,
        ts: DateTime<Utc>,
        source: Source,
    ) -> RecordOutcome {
        let Some(record) = self.records.get(symbol) else {
            warn!(symbol, ?source, "tick for untracked symbol dropped");
            return RecordOutcome::UnknownSymbol;
        };

        let Some(sample) = Sample::new(ts, price) else {
            warn!(symbol, price, ?source, "tick with invalid price dropped");
            return RecordOutcome::InvalidPrice;
        };

        let mut rec = record.lock();
        rec.buffer.append(sample);
        rec.latest_price = Some(price);
        rec.latest_source = merged_source(rec.latest_source, source);

        RecordOutcome::Accepted
    }

    /// Latest price and its source label.
    pub fn latest(&self, symbol: &str) -> Option<(Option<f64>, Source)> {
        let rec = self.records.get(symbol)?.lock();
        Some((rec.latest_price, rec.latest_source))
    }

    pub fn buffer_snapshot(&self, symbol: &str) -> Option<BufferSnapshot> {
        Some(self.records.get(symbol)?.lock().buffer.snapshot())
    }

    /// Latest values and history copied under one lock, so they agree with each other.
    pub fn view(&self, symbol: &str) -> Option<RecordView> {
        let rec = self.records.get(symbol)?.lock();
        Some(RecordView {
            latest_price: rec.latest_price,
            latest_source: rec.latest_source,
            history: rec.buffer.snapshot(),
        })
    }
}

fn merged_source(current: Source, incoming: Source) -> Source {
    match (current, incoming) {
        (Source::Primary, Source::Secondary) => Source::Primary,
        (_, incoming) => incoming,
    }
}
