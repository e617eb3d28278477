use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TimestampCli {
    /// Stamp ticks with the local receipt time
    Receipt,
    /// Use the exchange event time when the message carries one
    Exchange,
}

#[derive(Debug, Parser)]
#[clap(name = "price-tracker", version)]
pub struct Cli {
    /// Symbols to track (comma-separated)
    #[clap(long, env = "TRACKER_SYMBOLS", value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Window as LABEL:POSITIVE:NEGATIVE; the label is also the lookback (e.g. 1h:5:-5)
    #[clap(
        long = "window",
        env = "TRACKER_WINDOWS",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values = ["1h:5:-5", "2h:10:-10", "4h:15:-15", "48h:20:-20"]
    )]
    pub windows: Vec<String>,

    /// Samples kept per symbol
    #[clap(long, env = "TRACKER_CAPACITY", default_value_t = 2_000)]
    pub capacity: usize,

    /// Evaluation cadence
    #[clap(long, env = "TRACKER_EVAL_INTERVAL", default_value = "1s", value_parser = humantime::parse_duration)]
    pub eval_interval: Duration,

    /// Delay between feed reconnection attempts
    #[clap(long, env = "TRACKER_RECONNECT_BACKOFF", default_value = "5s", value_parser = humantime::parse_duration)]
    pub reconnect_backoff: Duration,

    /// Minimum interval between alerts for one symbol
    #[clap(long, env = "TRACKER_ALERT_COOLDOWN", default_value = "60s", value_parser = humantime::parse_duration)]
    pub alert_cooldown: Duration,

    /// Candle interval requested for the history bootstrap
    #[clap(long, env = "TRACKER_BOOTSTRAP_INTERVAL", default_value = "1h")]
    pub bootstrap_interval: String,

    /// Candles requested per symbol
    #[clap(long, env = "TRACKER_BOOTSTRAP_LIMIT", default_value_t = 200)]
    pub bootstrap_limit: usize,

    /// Concurrent history requests
    #[clap(long, env = "TRACKER_BOOTSTRAP_CONCURRENCY", default_value_t = 4)]
    pub bootstrap_concurrency: usize,

    /// Pause after each history request
    #[clap(long, env = "TRACKER_BOOTSTRAP_PAUSE", default_value = "100ms", value_parser = humantime::parse_duration)]
    pub bootstrap_pause: Duration,

    #[clap(long, env = "TRACKER_PRIMARY_WS_URL", default_value = "wss://fstream.binance.com/ws")]
    pub primary_ws_url: String,

    #[clap(long, env = "TRACKER_SECONDARY_WS_URL", default_value = "wss://stream.binance.com:9443/ws")]
    pub secondary_ws_url: String,

    #[clap(long, env = "TRACKER_PRIMARY_REST_URL", default_value = "https://fapi.binance.com/fapi/v1/klines")]
    pub primary_rest_url: String,

    #[clap(long, env = "TRACKER_SECONDARY_REST_URL", default_value = "https://api.binance.com/api/v3/klines")]
    pub secondary_rest_url: String,

    /// Webhook receiving alerts as JSON; alerts are only logged when unset
    #[clap(long, env = "TRACKER_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Timestamp source for live ticks
    #[clap(long, env = "TRACKER_TIMESTAMPS", value_enum, default_value_t = TimestampCli::Receipt)]
    pub timestamps: TimestampCli,

    /// Emit logs as JSON
    #[clap(long, env = "TRACKER_LOG_JSON")]
    pub log_json: bool,
}
