use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::TimeDelta;
use market::{ThresholdPair, WindowDef, feed::TimestampPolicy, history::BootstrapSettings};
use thiserror::Error;

use crate::cli::{Cli, TimestampCli};

/// Tracked when no symbols are configured.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "BTCUSDT", "ETHUSDT", "PONKEUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT", "DOGEUSDT", "TROYUSDT",
    "ADAUSDT", "TRXUSDT", "SHIBUSDT", "AVAXUSDT", "TONUSDT", "SUIUSDT", "1000PEPEUSDT", "LINKUSDT",
    "BCHUSDT", "DOTUSDT", "LEOUSDT", "NEARUSDT", "LTCUSDT", "APTUSDT", "XLMUSDT", "UNIUSDT",
    "CROUSDT", "ICPUSDT", "ETCUSDT", "KASUSDT", "VETUSDT", "HBARUSDT", "ALGOUSDT", "FILUSDT",
    "AAVEUSDT", "GRTUSDT", "FTMUSDT", "XTZUSDT", "THETAUSDT", "EGLDUSDT", "FLOWUSDT", "AXSUSDT",
    "MANAUSDT", "SANDUSDT", "CHZUSDT", "ENJUSDT", "ZILUSDT", "HOTUSDT", "CKBUSDT", "CELOUSDT",
    "ONEUSDT", "KSMUSDT", "QTUMUSDT", "OMGUSDT", "ZRXUSDT", "BATUSDT", "CAKEUSDT", "CRVUSDT",
    "SUSHIUSDT", "COMPUSDT", "YFIUSDT", "BALUSDT", "RENUSDT", "LRCUSDT", "1INCHUSDT", "SRMUSDT",
    "INJUSDT", "OCEANUSDT", "AUDIOUSDT", "RNDRUSDT", "ARUSDT", "STORJUSDT", "ANKRUSDT", "CVCUSDT",
    "FETUSDT", "IOTXUSDT", "AGIXUSDT", "MASKUSDT", "BANDUSDT", "OXTUSDT", "SKLUSDT", "OGNUSDT",
    "COTIUSDT", "DENTUSDT", "REQUSDT", "POWRUSDT", "SYSUSDT", "WANUSDT", "ARKUSDT", "MITHUSDT",
    "BLZUSDT", "STMXUSDT", "DIAUSDT", "AVAUSDT", "TRBUSDT", "KEEPUSDT", "AKROUSDT", "BELUSDT",
    "KAIUSDT", "LITUSDT", "ALPHAUSDT", "CTKUSDT", "DGBUSDT", "DUSKUSDT", "FLMUSDT", "GTCUSDT",
    "HNTUSDT", "ICXUSDT", "KAVAUSDT", "LINAUSDT", "MKRUSDT", "MTLUSDT", "NKNUSDT", "NMRUSDT",
    "OGUSDT", "OMUSDT", "PERLUSDT", "RAYUSDT", "REEFUSDT", "ROSEUSDT", "RSRUSDT", "SFPUSDT",
    "SLPUSDT", "SNXUSDT", "SUNUSDT", "SXPUSDT", "TLMUSDT", "TOMOUSDT", "TRUUSDT", "TVKUSDT",
    "UMAUSDT", "UNFIUSDT", "UTKUSDT", "VITEUSDT", "WAVESUSDT", "WINGUSDT", "WNXMUSDT", "XEMUSDT",
    "XVGUSDT", "YFIIUSDT", "ZENUSDT", "CTSIUSDT", "DODOUSDT", "FORTHUSDT", "FRONTUSDT", "HARDUSDT",
    "IRISUSDT", "JSTUSDT", "MDAUSDT", "MDXUSDT", "NBSUSDT", "NULSUSDT", "POLSUSDT", "PONDUSDT",
    "PSGUSDT", "QNTUSDT", "RIFUSDT", "RLCUSDT", "SANTOSUSDT", "SUSDUSDT", "TKOUSDT", "TORNUSDT",
    "TWTUSDT", "UFTUSDT", "VIDTUSDT", "WTCUSDT",
];

/// Longest window lookback or alert cooldown accepted.
pub const MAX_SPAN: TimeDelta = TimeDelta::days(3_650);

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid window `{0}`: {1}")]
    InvalidWindow(String, String),

    #[error("duplicate window label `{0}`")]
    DuplicateWindow(String),

    #[error("no symbols configured")]
    NoSymbols,

    #[error("no windows configured")]
    NoWindows,

    #[error("buffer capacity must be greater than zero")]
    InvalidCapacity,

    #[error("alert cooldown `{0}` exceeds the maximum of 10 years")]
    InvalidCooldown(String),
}

/// Validated, process-lifetime configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Upper-cased, de-duplicated, in the order given.
    pub symbols: Vec<String>,
    pub windows: Vec<WindowDef>,
    pub thresholds: HashMap<String, ThresholdPair>,
    pub capacity: usize,

    pub eval_interval: Duration,
    pub reconnect_backoff: Duration,
    pub alert_cooldown: TimeDelta,

    pub bootstrap: BootstrapSettings,

    pub primary_ws_url: String,
    pub secondary_ws_url: String,
    pub primary_rest_url: String,
    pub secondary_rest_url: String,

    pub webhook_url: Option<String>,
    pub timestamps: TimestampPolicy,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let symbols = normalize_symbols(&cli.symbols);
        if symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }

        if cli.windows.is_empty() {
            return Err(ConfigError::NoWindows);
        }
        let mut windows = Vec::with_capacity(cli.windows.len());
        let mut thresholds = HashMap::new();
        for raw in &cli.windows {
            let (window, pair) = parse_window(raw)?;
            if thresholds.insert(window.label.clone(), pair).is_some() {
                return Err(ConfigError::DuplicateWindow(window.label));
            }
            windows.push(window);
        }

        if cli.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }

        let alert_cooldown = TimeDelta::from_std(cli.alert_cooldown)
            .ok()
            .filter(|c| *c <= MAX_SPAN)
            .ok_or_else(|| {
                ConfigError::InvalidCooldown(humantime::format_duration(cli.alert_cooldown).to_string())
            })?;

        Ok(Self {
            symbols,
            windows,
            thresholds,
            capacity: cli.capacity,
            eval_interval: cli.eval_interval,
            reconnect_backoff: cli.reconnect_backoff,
            alert_cooldown,
            bootstrap: BootstrapSettings {
                interval: cli.bootstrap_interval.clone(),
                limit: cli.bootstrap_limit,
                concurrency: cli.bootstrap_concurrency.max(1),
                pause: cli.bootstrap_pause,
            },
            primary_ws_url: cli.primary_ws_url.clone(),
            secondary_ws_url: cli.secondary_ws_url.clone(),
            primary_rest_url: cli.primary_rest_url.clone(),
            secondary_rest_url: cli.secondary_rest_url.clone(),
            webhook_url: cli.webhook_url.clone().filter(|u| !u.is_empty()),
            timestamps: match cli.timestamps {
                TimestampCli::Receipt => TimestampPolicy::Receipt,
                TimestampCli::Exchange => TimestampPolicy::Exchange,
            },
        })
    }
}

/// Falls back to [`DEFAULT_SYMBOLS`] when nothing is given.
fn normalize_symbols(given: &[String]) -> Vec<String> {
    let source: Vec<String> = if given.iter().all(|s| s.trim().is_empty()) {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    } else {
        given.to_vec()
    };

    let mut seen = HashSet::new();
    source
        .into_iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// `LABEL:POSITIVE:NEGATIVE`, where the label doubles as the lookback duration.
pub fn parse_window(raw: &str) -> Result<(WindowDef, ThresholdPair), ConfigError> {
    let invalid = |why: &str| ConfigError::InvalidWindow(raw.to_string(), why.to_string());

    let parts: Vec<&str> = raw.trim().split(':').collect();
    let [label, positive, negative] = parts.as_slice() else {
        return Err(invalid("expected LABEL:POSITIVE:NEGATIVE"));
    };

    let lookback = humantime::parse_duration(label).map_err(|e| invalid(&e.to_string()))?;
    if lookback.is_zero() {
        return Err(invalid("lookback must be positive"));
    }
    let lookback = TimeDelta::from_std(lookback).map_err(|e| invalid(&e.to_string()))?;
    if lookback > MAX_SPAN {
        return Err(invalid("lookback exceeds the maximum of 10 years"));
    }

    let positive: f64 = positive.parse().map_err(|_| invalid("positive threshold is not a number"))?;
    let negative: f64 = negative.parse().map_err(|_| invalid("negative threshold is not a number"))?;

    Ok((
        WindowDef::new(*label, lookback),
        ThresholdPair::new(positive, negative),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["price-tracker"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn empty_symbol_list_uses_defaults() {
        let cfg = AppConfig::from_cli(&cli(&[])).unwrap();

        let labels: Vec<_> = cfg.windows.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, ["1h", "2h", "4h", "48h"]);
        assert_eq!(cfg.windows[3].lookback, TimeDelta::hours(48));
        assert_eq!(cfg.thresholds["4h"], ThresholdPair::new(15.0, -15.0));
        assert_eq!(cfg.capacity, 2_000);
        assert_eq!(cfg.eval_interval, Duration::from_secs(1));
        assert_eq!(cfg.reconnect_backoff, Duration::from_secs(5));
        assert_eq!(cfg.alert_cooldown, TimeDelta::seconds(60));
        assert_eq!(cfg.bootstrap.limit, 200);
        assert_eq!(cfg.timestamps, TimestampPolicy::Receipt);
        assert!(cfg.webhook_url.is_none());
    }

    #[test]
    fn default_symbols_are_deduplicated() {
        let cfg = AppConfig::from_cli(&cli(&[])).unwrap();
        let unique: HashSet<_> = cfg.symbols.iter().collect();

        assert_eq!(unique.len(), cfg.symbols.len());
        assert_eq!(cfg.symbols[0], "BTCUSDT");
    }

    #[test]
    fn symbols_are_upper_cased_and_deduplicated() {
        let cfg = AppConfig::from_cli(&cli(&["--symbols", "btcusdt,ETHUSDT,BTCUSDT"])).unwrap();
        assert_eq!(cfg.symbols, ["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn custom_windows_keep_their_order() {
        let cfg = AppConfig::from_cli(&cli(&["--window", "15m:1:-1", "--window", "1h:3:-3"])).unwrap();

        assert_eq!(cfg.windows[0], WindowDef::new("15m", TimeDelta::minutes(15)));
        assert_eq!(cfg.windows[1].label, "1h");
        assert_eq!(cfg.thresholds["15m"], ThresholdPair::new(1.0, -1.0));
    }

    #[test]
    fn duplicate_window_labels_are_rejected() {
        let err = AppConfig::from_cli(&cli(&["--window", "1h:1:-1,1h:2:-2"])).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateWindow("1h".into()));
    }

    #[test]
    fn malformed_windows_are_rejected() {
        assert!(parse_window("1h:5").is_err());
        assert!(parse_window("soon:5:-5").is_err());
        assert!(parse_window("1h:up:-5").is_err());
        assert!(parse_window("0s:5:-5").is_err());
    }

    #[test]
    fn out_of_range_lookback_is_rejected() {
        let err = AppConfig::from_cli(&cli(&["--window", "300000y:5:-5"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindow(raw, _) if raw == "300000y:5:-5"));

        assert!(parse_window("3650days:5:-5").is_ok());
        assert!(parse_window("3651days:5:-5").is_err());
    }

    #[test]
    fn out_of_range_cooldown_is_rejected() {
        let err = AppConfig::from_cli(&cli(&["--alert-cooldown", "300000y"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCooldown(_)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = AppConfig::from_cli(&cli(&["--capacity", "0"])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidCapacity);
    }

    #[test]
    fn durations_use_humantime() {
        let cfg = AppConfig::from_cli(&cli(&["--alert-cooldown", "2m", "--eval-interval", "250ms"])).unwrap();
        assert_eq!(cfg.alert_cooldown, TimeDelta::minutes(2));
        assert_eq!(cfg.eval_interval, Duration::from_millis(250));
    }
}
