use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// One observed price. Only constructible with a positive, finite price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub ts: DateTime<Utc>,
    pub price: f64,
}

impl Sample {
    pub fn new(ts: DateTime<Utc>, price: f64) -> Option<Self> {
        (price.is_finite() && price > 0.0).then_some(Self { ts, price })
    }
}

/// Which live feed produced a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    #[default]
    Unknown,
    Primary,
    Secondary,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Unknown => "-",
            Source::Primary => "Primary",
            Source::Secondary => "Secondary",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded live update, before it reaches the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    /// Exchange event time, when the message carried one.
    pub event_time: Option<DateTime<Utc>>,
}

/// Named trailing duration, e.g. `1h`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDef {
    pub label: String,
    pub lookback: TimeDelta,
}

impl WindowDef {
    pub fn new(label: impl Into<String>, lookback: TimeDelta) -> Self {
        Self {
            label: label.into(),
            lookback,
        }
    }
}

/// Per-window flag thresholds in percent. `positive > 0 > negative` is expected, not enforced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdPair {
    pub positive: f64,
    pub negative: f64,
}

impl ThresholdPair {
    pub fn new(positive: f64, negative: f64) -> Self {
        Self { positive, negative }
    }
}

impl Default for ThresholdPair {
    /// A pair that never flags.
    fn default() -> Self {
        Self {
            positive: f64::INFINITY,
            negative: f64::NEG_INFINITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Bullish,
    Bearish,
}

impl AlertDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Bullish => "bullish",
            AlertDirection::Bearish => "bearish",
        }
    }
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_rejects_non_positive_and_non_finite_prices() {
        let now = Utc::now();

        assert!(Sample::new(now, 1.5).is_some());
        assert!(Sample::new(now, 0.0).is_none());
        assert!(Sample::new(now, -3.0).is_none());
        assert!(Sample::new(now, f64::NAN).is_none());
        assert!(Sample::new(now, f64::INFINITY).is_none());
    }
}
