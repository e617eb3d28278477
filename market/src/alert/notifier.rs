use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};

use super::Notifier;
use crate::error::NotificationError;
use crate::types::AlertDirection;

/// Writes alerts to the log. Default sink when no webhook is configured.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        symbol: &str,
        direction: AlertDirection,
        message: &str,
    ) -> Result<(), NotificationError> {
        info!(target: "alert", symbol, %direction, message, "price alert");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    symbol: &'a str,
    direction: AlertDirection,
    message: &'a str,
}

/// POSTs `{symbol, direction, message}` as JSON to a fixed URL.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, NotificationError> {
        let http = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, message), fields(url = %self.url), level = "debug")]
    async fn notify(
        &self,
        symbol: &str,
        direction: AlertDirection,
        message: &str,
    ) -> Result<(), NotificationError> {
        let payload = WebhookPayload {
            symbol,
            direction,
            message,
        };

        let resp = self.http.post(&self.url).json(&payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
