use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::signal::Signal;
use crate::types::AlertDirection;

pub const DEFAULT_COOLDOWN: TimeDelta = TimeDelta::seconds(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceState {
    Quiet,
    RecentlyNotified { until: DateTime<Utc> },
}

/// `Bullish` when every signal is a bullish flag, `Bearish` when every one is
/// a bearish flag, otherwise nothing. An empty set never qualifies.
pub fn candidate_direction(signals: &[Signal]) -> Option<AlertDirection> {
    if signals.is_empty() {
        return None;
    }
    if signals.iter().all(|s| *s == Signal::BullishFlag) {
        return Some(AlertDirection::Bullish);
    }
    if signals.iter().all(|s| *s == Signal::BearishFlag) {
        return Some(AlertDirection::Bearish);
    }
    None
}

/// Per-symbol minimum re-notify interval.
///
/// The cooldown is shared by both directions and is consumed as soon as a
/// notification is allowed, whether or not the send later succeeds.
pub struct AlertDebouncer {
    cooldown: TimeDelta,
    state: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl AlertDebouncer {
    pub fn new(cooldown: TimeDelta) -> Self {
        Self {
            cooldown,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    pub fn state(&self, symbol: &str) -> DebounceState {
        match self.state.lock().get(symbol) {
            Some(until) => DebounceState::RecentlyNotified { until: *until },
            None => DebounceState::Quiet,
        }
    }

    /// Returns the direction to notify, if any, and arms the cooldown when it does.
    pub fn evaluate(&self, symbol: &str, signals: &[Signal], now: DateTime<Utc>) -> Option<AlertDirection> {
        let direction = candidate_direction(signals)?;

        let mut state = self.state.lock();
        if let Some(until) = state.get(symbol) {
            if *until > now {
                debug!(symbol, %direction, until = %until, "alert suppressed by cooldown");
                return None;
            }
        }

        let until = now
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        state.insert(symbol.to_string(), until);
        Some(direction)
    }
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BULL: [Signal; 4] = [Signal::BullishFlag; 4];
    const BEAR: [Signal; 4] = [Signal::BearishFlag; 4];

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn candidates_require_unanimous_flags() {
        assert_eq!(candidate_direction(&BULL), Some(AlertDirection::Bullish));
        assert_eq!(candidate_direction(&BEAR), Some(AlertDirection::Bearish));
        assert_eq!(
            candidate_direction(&[Signal::BullishFlag, Signal::Neutral]),
            None
        );
        assert_eq!(
            candidate_direction(&[Signal::BullishFlag, Signal::BearishFlag]),
            None
        );
        assert_eq!(
            candidate_direction(&[Signal::BullishFlag, Signal::NoData]),
            None
        );
        assert_eq!(candidate_direction(&[]), None);
    }

    #[test]
    fn ten_seconds_apart_notifies_once() {
        let d = AlertDebouncer::default();

        assert_eq!(d.evaluate("BTC", &BULL, at(0)), Some(AlertDirection::Bullish));
        assert_eq!(d.evaluate("BTC", &BULL, at(10)), None);
    }

    #[test]
    fn sixty_one_seconds_apart_notifies_twice() {
        let d = AlertDebouncer::default();

        assert!(d.evaluate("BTC", &BULL, at(0)).is_some());
        assert!(d.evaluate("BTC", &BULL, at(61)).is_some());
    }

    #[test]
    fn cooldown_expires_exactly_at_until() {
        let d = AlertDebouncer::default();

        assert!(d.evaluate("BTC", &BULL, at(0)).is_some());
        assert!(d.evaluate("BTC", &BULL, at(59)).is_none());
        assert!(d.evaluate("BTC", &BULL, at(60)).is_some());
    }

    #[test]
    fn oversized_cooldown_saturates_instead_of_overflowing() {
        let d = AlertDebouncer::new(TimeDelta::MAX);

        assert!(d.evaluate("BTC", &BULL, at(0)).is_some());
        assert!(d.evaluate("BTC", &BULL, at(1_000_000)).is_none());
        assert_eq!(
            d.state("BTC"),
            DebounceState::RecentlyNotified {
                until: DateTime::<Utc>::MAX_UTC
            }
        );
    }

    #[test]
    fn symbols_are_independent() {
        let d = AlertDebouncer::default();

        assert!(d.evaluate("BTC", &BULL, at(0)).is_some());
        assert!(d.evaluate("ETH", &BEAR, at(1)).is_some());
        assert_eq!(d.state("SOL"), DebounceState::Quiet);
    }

    #[test]
    fn cooldown_is_shared_across_directions() {
        let d = AlertDebouncer::default();

        assert!(d.evaluate("BTC", &BULL, at(0)).is_some());
        assert!(d.evaluate("BTC", &BEAR, at(5)).is_none());
    }

    #[test]
    fn non_candidates_leave_state_untouched() {
        let d = AlertDebouncer::default();

        assert!(d.evaluate("BTC", &[Signal::Neutral; 4], at(0)).is_none());
        assert_eq!(d.state("BTC"), DebounceState::Quiet);

        d.evaluate("BTC", &BULL, at(1));
        assert_eq!(
            d.state("BTC"),
            DebounceState::RecentlyNotified { until: at(61) }
        );
    }
}
