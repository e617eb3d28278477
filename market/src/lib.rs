//! Per-instrument price history and trailing-window change engine.
//!
//! Two live feeds push ticks into an [`registry::InstrumentRegistry`]; a
//! periodic [`manager::MarketManager`] pass turns each symbol's history into
//! percent changes, flags, debounced alerts and display rows.

pub mod alert;
pub mod error;
pub mod feed;
pub mod history;
pub mod manager;
pub mod registry;
pub mod render;
pub mod rolling_window;
pub mod signal;
pub mod types;

pub use registry::{InstrumentRegistry, RecordOutcome};
pub use rolling_window::{BufferSnapshot, TimeSeriesBuffer};
pub use types::{AlertDirection, Sample, Source, ThresholdPair, Tick, WindowDef};
