use crate::types::ThresholdPair;

/// Qualitative reading of one window's change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    NoData,
    Neutral,
    BullishFlag,
    BearishFlag,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub signal: Signal,
    pub value: Option<f64>,
}

impl Classification {
    /// Direction of the move, independent of whether it is flagged. `None` without data.
    pub fn rising(&self) -> Option<bool> {
        self.value.map(|v| v >= 0.0)
    }

    /// `🟢 6.10% ✅`, `🔴 -1.25%`, or `N/A`.
    pub fn display(&self) -> String {
        let Some(value) = self.value else {
            return "N/A".to_string();
        };

        let circle = if value >= 0.0 { "🟢" } else { "🔴" };
        let highlight = match self.signal {
            Signal::BullishFlag => " ✅",
            Signal::BearishFlag => " ❌",
            _ => "",
        };

        format!("{circle} {value:.2}%{highlight}")
    }
}

pub struct ThresholdClassifier;

impl ThresholdClassifier {
    /// Strict comparisons: a change equal to a threshold is `Neutral`.
    pub fn classify(value: Option<f64>, thresholds: ThresholdPair) -> Classification {
        let signal = match value {
            None => Signal::NoData,
            Some(v) if v > thresholds.positive => Signal::BullishFlag,
            Some(v) if v < thresholds.negative => Signal::BearishFlag,
            Some(_) => Signal::Neutral,
        };

        Classification { signal, value }
    }
}
