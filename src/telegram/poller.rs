//! Long-poll loop over `getUpdates`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{TelegramClient, Update};

/// Pause after a failed poll before trying again.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

pub struct UpdatePoller {
    api: Arc<TelegramClient>,
    timeout_secs: u64,
    offset: Option<i64>,
}

impl UpdatePoller {
    pub fn new(api: Arc<TelegramClient>, timeout_secs: u64) -> Self {
        Self {
            api,
            timeout_secs,
            offset: None,
        }
    }

    /// Acknowledge everything queued while the bot was offline so stale
    /// commands are not replayed on startup.
    pub async fn skip_pending(&mut self) {
        match self.api.get_updates(Some(-1), 0).await {
            Ok(updates) => {
                if let Some(last) = updates.last() {
                    self.offset = Some(last.update_id + 1);
                    info!(next_offset = last.update_id + 1, "Dropped pending updates");
                }
            }
            Err(e) => warn!(error = %e, "Could not drop pending updates"),
        }
    }

    /// Poll forever, handing each update to `on_update`.
    ///
    /// `on_update` must not block; the dispatcher spawns a task per update.
    /// Run inside `tokio::select!` alongside a shutdown signal.
    pub async fn run<F>(mut self, mut on_update: F)
    where
        F: FnMut(Update),
    {
        info!(timeout_secs = self.timeout_secs, "Update polling started");
        loop {
            match self.api.get_updates(self.offset, self.timeout_secs).await {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "Received updates");
                    }
                    for update in updates {
                        self.offset = Some(update.update_id + 1);
                        on_update(update);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed");
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                }
            }
        }
    }
}
