use chrono::{DateTime, Utc};

use crate::registry::{InstrumentRegistry, RecordView};
use crate::types::WindowDef;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowChange {
    pub label: String,
    /// Percent change, or `None` when history does not reach back far enough.
    pub change: Option<f64>,
}

/// Percent change over a fixed, ordered set of trailing windows.
#[derive(Debug, Clone)]
pub struct WindowCalculator {
    windows: Vec<WindowDef>,
}

impl WindowCalculator {
    pub fn new(windows: Vec<WindowDef>) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &[WindowDef] {
        &self.windows
    }

    /// Changes for one symbol at `now`. An untracked symbol yields all `None`.
    pub fn compute(&self, registry: &InstrumentRegistry, symbol: &str, now: DateTime<Utc>) -> Vec<WindowChange> {
        match registry.view(symbol) {
            Some(view) => self.compute_view(&view, now),
            None => self.empty(),
        }
    }

    /// Same as [`compute`](Self::compute) but on an already taken view.
    ///
    /// Every window uses the same `now` and the same snapshot.
    pub fn compute_view(&self, view: &RecordView, now: DateTime<Utc>) -> Vec<WindowChange> {
        let Some(latest) = view.latest_price else {
            return self.empty();
        };

        self.windows
            .iter()
            .map(|w| {
                let change = now
                    .checked_sub_signed(w.lookback)
                    .and_then(|target| view.history.as_of(target))
                    .map(|reference| percent_change(latest, reference));
                WindowChange {
                    label: w.label.clone(),
                    change,
                }
            })
            .collect()
    }

    fn empty(&self) -> Vec<WindowChange> {
        self.windows
            .iter()
            .map(|w| WindowChange {
                label: w.label.clone(),
                change: None,
            })
            .collect()
    }
}

pub fn percent_change(latest: f64, reference: f64) -> f64 {
    (latest - reference) / reference * 100.0
}
