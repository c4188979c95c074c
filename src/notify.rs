//! Outbound notifications.
//!
//! `NotificationSink` delivers one message to one chat. `Notifier` fans a
//! message out to every admin; delivery is best-effort and each recipient
//! fails independently. Failures are logged, never retried and never
//! propagated to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

/// Reply keyboard attached to an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKeyboard {
    /// Start / Stop / Stats / Add user buttons
    Main,
    /// Single Cancel button shown while waiting for a handle
    Cancel,
    /// Hide any keyboard
    Remove,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, chat_id: i64, text: &str, keyboard: ReplyKeyboard)
        -> anyhow::Result<()>;
}

/// Broadcasts to the admin allow-list.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    admins: Vec<i64>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, admins: Vec<i64>) -> Self {
        Self { sink, admins }
    }

    /// Send `text` to every admin. Returns how many deliveries succeeded.
    pub async fn broadcast(&self, text: &str) -> usize {
        let mut delivered = 0;
        for &admin_id in &self.admins {
            match self.sink.deliver(admin_id, text, ReplyKeyboard::Main).await {
                Ok(()) => delivered += 1,
                Err(e) => error!(admin_id, error = %e, "Failed to notify admin"),
            }
        }
        delivered
    }
}
