//! Alerting: all-windows flag detection, per-symbol cooldown and the outbound sink.

pub mod debouncer;
pub mod notifier;

pub use debouncer::{AlertDebouncer, DEFAULT_COOLDOWN, DebounceState, candidate_direction};
pub use notifier::{LogNotifier, WebhookNotifier};

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::types::AlertDirection;

/// Outbound notification transport. Delivery is best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        symbol: &str,
        direction: AlertDirection,
        message: &str,
    ) -> Result<(), NotificationError>;
}
