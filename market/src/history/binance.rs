use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::HistoryApi;
use crate::error::FetchError;
use crate::types::Sample;

pub const FUTURES_KLINES_URL: &str = "https://fapi.binance.com/fapi/v1/klines";
pub const SPOT_KLINES_URL: &str = "https://api.binance.com/api/v3/klines";

/// Binance klines client. Tries the primary endpoint first and falls back
/// to the secondary one when the primary answers with a non-success status.
#[derive(Clone)]
pub struct BinanceKlinesClient {
    http: Client,
    primary_url: String,
    secondary_url: String,
}

impl BinanceKlinesClient {
    pub fn new(primary_url: String, secondary_url: String) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            primary_url,
            secondary_url,
        })
    }

    async fn get(
        &self,
        url: &str,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<reqwest::Response, FetchError> {
        let limit = limit.to_string();
        let resp = self
            .http
            .get(url)
            .query(&[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await?;
        Ok(resp)
    }
}

#[async_trait]
impl HistoryApi for BinanceKlinesClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Sample>, FetchError> {
        let mut resp = self.get(&self.primary_url, symbol, interval, limit).await?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), "primary klines endpoint refused; trying secondary");
            resp = self.get(&self.secondary_url, symbol, interval, limit).await?;
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Value = resp.json().await?;
        let samples = parse_klines(&rows)?;

        debug!(samples = samples.len(), "klines fetched");
        Ok(samples)
    }
}

/// Converts `[[open_time_ms, open, high, low, close, ...], ...]` into samples, oldest first.
///
/// Rows with a non-positive close are skipped.
pub fn parse_klines(rows: &Value) -> Result<Vec<Sample>, FetchError> {
    let rows = rows
        .as_array()
        .ok_or_else(|| FetchError::InvalidResponse("expected an array of klines".into()))?;

    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        let open_ms = row
            .get(0)
            .and_then(Value::as_i64)
            .ok_or_else(|| FetchError::InvalidResponse(format!("bad open time in {row}")))?;
        let ts = DateTime::from_timestamp_millis(open_ms)
            .ok_or_else(|| FetchError::InvalidResponse(format!("open time out of range: {open_ms}")))?;

        let close = match row.get(4) {
            Some(Value::String(s)) => s.parse::<f64>().ok(),
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
        .ok_or_else(|| FetchError::InvalidResponse(format!("bad close price in {row}")))?;

        match Sample::new(ts, close) {
            Some(s) => samples.push(s),
            None => warn!(close, open_ms, "skipping kline with invalid close"),
        }
    }

    samples.sort_by_key(|s| s.ts);
    Ok(samples)
}
