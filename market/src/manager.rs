//! MarketManager
//!
//! Runs the periodic evaluation pass over every tracked symbol:
//!   • take one consistent view per symbol from the registry
//!   • compute each window's percent change
//!   • classify against that window's thresholds
//!   • ask the debouncer whether an all-windows condition should alert
//!   • hand the formatted rows to the render sink
//!
//! Notifications are sent from their own tasks so a slow sink never delays
//! the next pass.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::logger::{TraceId, root_span};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, error, info};

use crate::alert::{AlertDebouncer, Notifier};
use crate::registry::InstrumentRegistry;
use crate::render::{RenderRow, RenderSink, format_price};
use crate::signal::{Classification, Signal, ThresholdClassifier, WindowCalculator};
use crate::types::{AlertDirection, ThresholdPair};

/// An alert that passed the debouncer during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub direction: AlertDirection,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct PassOutcome {
    pub rows: Vec<RenderRow>,
    pub alerts: Vec<Alert>,
}

pub struct MarketManager<N> {
    registry: Arc<InstrumentRegistry>,
    calculator: WindowCalculator,
    /// Threshold pair per window label. Missing labels never flag.
    thresholds: HashMap<String, ThresholdPair>,
    debouncer: AlertDebouncer,
    notifier: Arc<N>,
}

impl<N: Notifier + 'static> MarketManager<N> {
    pub fn new(
        registry: Arc<InstrumentRegistry>,
        calculator: WindowCalculator,
        thresholds: HashMap<String, ThresholdPair>,
        debouncer: AlertDebouncer,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            registry,
            calculator,
            thresholds,
            debouncer,
            notifier,
        }
    }

    pub fn registry(&self) -> &Arc<InstrumentRegistry> {
        &self.registry
    }

    /// Window labels in display order.
    pub fn labels(&self) -> Vec<String> {
        self.calculator
            .windows()
            .iter()
            .map(|w| w.label.clone())
            .collect()
    }

    /// One evaluation over all symbols at a single `now`.
    pub fn evaluate_pass(&self, now: DateTime<Utc>) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        for symbol in self.registry.symbols() {
            let Some(view) = self.registry.view(symbol) else {
                continue;
            };

            let classes: Vec<(String, Classification)> = self
                .calculator
                .compute_view(&view, now)
                .into_iter()
                .map(|wc| {
                    let pair = self.thresholds.get(&wc.label).copied().unwrap_or_default();
                    let class = ThresholdClassifier::classify(wc.change, pair);
                    (wc.label, class)
                })
                .collect();

            let signals: Vec<Signal> = classes.iter().map(|(_, c)| c.signal).collect();
            if let Some(direction) = self.debouncer.evaluate(symbol, &signals, now) {
                outcome.alerts.push(Alert {
                    symbol: symbol.clone(),
                    direction,
                    message: alert_message(symbol, direction, &classes),
                });
            }

            outcome.rows.push(RenderRow {
                symbol: symbol.clone(),
                changes: classes.iter().map(|(_, c)| c.display()).collect(),
                latest_price: format_price(view.latest_price),
                source: view.latest_source.label().to_string(),
            });
        }

        outcome
    }

    /// Sends one alert and reports whether the sink accepted it. Failures are only logged.
    pub async fn deliver(notifier: &N, alert: &Alert) -> bool {
        match notifier
            .notify(&alert.symbol, alert.direction, &alert.message)
            .await
        {
            Ok(()) => {
                info!(symbol = %alert.symbol, direction = %alert.direction, "alert delivered");
                true
            }
            Err(e) => {
                error!(symbol = %alert.symbol, direction = %alert.direction, error = %e, "alert delivery failed");
                false
            }
        }
    }

    fn dispatch(&self, alerts: Vec<Alert>) {
        for alert in alerts {
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                Self::deliver(&notifier, &alert).await;
            });
        }
    }

    /// Evaluates every `cadence` until the task is aborted.
    pub async fn run<S: RenderSink + ?Sized>(self: Arc<Self>, cadence: Duration, sink: Arc<S>) {
        let mut ticker = interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every_ms = cadence.as_millis() as u64, "evaluation loop started");

        loop {
            ticker.tick().await;

            let trace_id = TraceId::default();
            let span = root_span("evaluation_pass", &trace_id);
            span.record("symbols", self.registry.symbols().len());

            async {
                let outcome = self.evaluate_pass(Utc::now());
                debug!(rows = outcome.rows.len(), alerts = outcome.alerts.len(), "evaluation pass complete");
                sink.render(&outcome.rows);
                self.dispatch(outcome.alerts);
            }
            .instrument(span)
            .await;
        }
    }
}

fn alert_message(symbol: &str, direction: AlertDirection, classes: &[(String, Classification)]) -> String {
    let parts: Vec<String> = classes
        .iter()
        .filter_map(|(label, c)| c.value.map(|v| format!("{label} {v:+.2}%")))
        .collect();

    format!("{symbol} {direction} across all windows: {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lists_every_window() {
        let classes = vec![
            (
                "1h".to_string(),
                ThresholdClassifier::classify(Some(6.1), ThresholdPair::new(5.0, -5.0)),
            ),
            (
                "2h".to_string(),
                ThresholdClassifier::classify(Some(11.0), ThresholdPair::new(10.0, -10.0)),
            ),
        ];

        assert_eq!(
            alert_message("BTCUSDT", AlertDirection::Bullish, &classes),
            "BTCUSDT bullish across all windows: 1h +6.10%, 2h +11.00%"
        );
    }
}
