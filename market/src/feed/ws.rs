use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, instrument, trace, warn};

use super::FeedTransport;
use crate::error::ConnectionError;

pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Binance `@ticker` stream for a fixed set of symbols.
pub struct BinanceTickerStream {
    pub url: String,
    pub reconnect_backoff: Duration,
}

impl BinanceTickerStream {
    /// `base_url` is the `/ws` endpoint, e.g. `wss://fstream.binance.com/ws`.
    pub fn new<S: AsRef<str>>(base_url: &str, symbols: &[S], reconnect_backoff: Duration) -> Self {
        Self {
            url: Self::build_url(base_url, symbols),
            reconnect_backoff,
        }
    }

    fn build_url<S: AsRef<str>>(base_url: &str, symbols: &[S]) -> String {
        let streams: Vec<String> = symbols
            .iter()
            .map(|s| format!("{}@ticker", s.as_ref().to_lowercase()))
            .collect();

        format!("{}/{}", base_url.trim_end_matches('/'), streams.join("/"))
    }

    /// Reads one connection until it ends. `Ok` means the socket closed;
    /// `ChannelClosed` means nobody is listening anymore.
    async fn pump(&self, sender: &Sender<String>) -> Result<(), ConnectionError> {
        let (ws, _) = connect_async(self.url.as_str()).await?;
        info!("websocket connection established");

        let (_write, mut read) = ws.split();

        while let Some(msg) = read.next().await {
            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = ?e, "websocket stream error encountered");
                    return Err(e.into());
                }
            };

            if msg.is_ping() || msg.is_pong() {
                debug!("received keep-alive message");
                continue;
            }

            if msg.is_close() {
                info!("server closed websocket");
                return Ok(());
            }

            if !msg.is_text() {
                debug!(msg_type = ?msg, "ignoring non-text websocket message");
                continue;
            }

            let raw = match msg.into_text() {
                Ok(t) => t,
                Err(e) => {
                    error!(error = ?e, "failed to extract text from websocket message");
                    continue;
                }
            };

            trace!(raw_event = %raw, "received raw websocket message");

            if sender.send(raw.to_string()).await.is_err() {
                return Err(ConnectionError::ChannelClosed);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl FeedTransport for BinanceTickerStream {
    #[instrument(skip(self, sender), fields(url = %self.url))]
    async fn stream_messages(&self, sender: Sender<String>) -> anyhow::Result<()> {
        info!("starting ticker stream worker");

        loop {
            match self.pump(&sender).await {
                Ok(()) => warn!("websocket stream ended"),
                Err(ConnectionError::ChannelClosed) => {
                    info!("feed receiver dropped; worker shutting down");
                    return Ok(());
                }
                Err(e) => error!(error = ?e, "websocket connection failed"),
            }

            if sender.is_closed() {
                return Ok(());
            }

            warn!(interval = ?self.reconnect_backoff, "disconnected; attempting reconnection");
            tokio::time::sleep(self.reconnect_backoff).await;
        }
    }
}
