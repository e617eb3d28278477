//! Live price feeds.
//!
//! A transport delivers raw text frames for one venue and reconnects on its
//! own; the merger decodes them and routes accepted ticks into the registry.

pub mod merger;
pub mod parser;
pub mod ws;

pub use merger::{FeedCounters, FeedMerger, TimestampPolicy};
pub use parser::parse_ticker;
pub use ws::BinanceTickerStream;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

/// One labelled live stream.
///
/// Implementations keep reconnecting until the receiving side of `sender` is dropped.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn stream_messages(&self, sender: Sender<String>) -> anyhow::Result<()>;
}
