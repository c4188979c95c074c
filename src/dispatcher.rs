//! Command dispatcher
//!
//! Turns one incoming chat message into at most one controller call and one
//! reply. The admin check runs first; a denied caller gets the fixed denial
//! text and nothing else happens.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::Command;
use crate::controller::{ControllerError, InvitationController};
use crate::gatekeeper::Gatekeeper;
use crate::messages;
use crate::notify::{NotificationSink, ReplyKeyboard};
use crate::source;
use crate::telegram::Update;

/// A text message from a user, stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub caller: i64,
    pub chat_id: i64,
    pub text: String,
}

impl Inbound {
    /// `None` for updates that carry no text from a user.
    pub fn from_update(update: Update) -> Option<Self> {
        let message = update.message?;
        let caller = message.from?.id;
        let text = message.text?;
        Some(Self {
            caller,
            chat_id: message.chat.id,
            text,
        })
    }
}

pub struct Dispatcher {
    controller: Arc<InvitationController>,
    gatekeeper: Gatekeeper,
    replies: Arc<dyn NotificationSink>,
    source_path: PathBuf,
    /// Chats currently being asked for a handle
    awaiting_identity: Mutex<HashSet<i64>>,
}

impl Dispatcher {
    pub fn new(
        controller: Arc<InvitationController>,
        gatekeeper: Gatekeeper,
        replies: Arc<dyn NotificationSink>,
        source_path: PathBuf,
    ) -> Self {
        Self {
            controller,
            gatekeeper,
            replies,
            source_path,
            awaiting_identity: Mutex::new(HashSet::new()),
        }
    }

    pub fn controller(&self) -> &Arc<InvitationController> {
        &self.controller
    }

    /// Spawn the task that handles updates one at a time, in arrival order.
    ///
    /// The task ends once every sender is dropped and the queue is drained.
    pub fn spawn_worker(self: Arc<Self>) -> (mpsc::UnboundedSender<Update>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Update>();
        let worker = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                self.handle_update(update).await;
            }
            debug!("Update queue closed");
        });
        (tx, worker)
    }

    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        match Inbound::from_update(update) {
            Some(inbound) => self.handle(inbound).await,
            None => debug!(update_id, "Ignoring update without text"),
        }
    }

    pub async fn handle(&self, inbound: Inbound) {
        let Inbound {
            caller,
            chat_id,
            text,
        } = inbound;

        if let Err(denied) = self.gatekeeper.check(caller) {
            warn!(caller = denied.caller, "Rejected command from non-admin");
            self.reply(chat_id, messages::ACCESS_DENIED, ReplyKeyboard::Remove)
                .await;
            return;
        }

        let awaiting = self.is_awaiting(chat_id);
        let command = Command::parse(&text, awaiting);
        debug!(caller, ?command, "Dispatching command");

        match command {
            Command::Welcome => {
                self.reply(chat_id, messages::READY, ReplyKeyboard::Main)
                    .await;
            }
            Command::Start => self.start(chat_id).await,
            Command::Stop => {
                self.controller.stop();
                self.reply(chat_id, messages::STOP_REQUESTED, ReplyKeyboard::Main)
                    .await;
            }
            Command::Stats => {
                let stats = self.controller.stats();
                self.reply(chat_id, &messages::stats(&stats), ReplyKeyboard::Main)
                    .await;
            }
            Command::AddPrompt => {
                self.set_awaiting(chat_id, true);
                self.reply(chat_id, messages::ASK_IDENTITY, ReplyKeyboard::Cancel)
                    .await;
            }
            Command::Cancel => {
                self.set_awaiting(chat_id, false);
                self.reply(chat_id, messages::CANCELLED, ReplyKeyboard::Main)
                    .await;
            }
            Command::Add(identity) => {
                self.set_awaiting(chat_id, false);
                self.add_one(chat_id, &identity).await;
            }
            Command::Unknown => debug!(caller, "Ignoring unrecognised text"),
        }
    }

    async fn start(&self, chat_id: i64) {
        if self.controller.is_running() {
            self.reply(chat_id, messages::ALREADY_RUNNING, ReplyKeyboard::Main)
                .await;
            return;
        }

        let path = self.source_path.clone();
        let identities = match tokio::task::spawn_blocking(move || source::load_identities(&path))
            .await
        {
            Ok(Ok(identities)) => identities,
            Ok(Err(e)) => {
                warn!(error = %e, "Could not load source list");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Source list loader panicked");
                Vec::new()
            }
        };

        let text = match self.controller.start(identities) {
            Ok(ack) => messages::started(ack.total),
            Err(ControllerError::EmptySource) => messages::NO_IDENTITIES.to_string(),
            Err(ControllerError::JobAlreadyRunning) => messages::ALREADY_RUNNING.to_string(),
            Err(e) => {
                warn!(error = %e, "Start failed");
                e.to_string()
            }
        };
        self.reply(chat_id, &text, ReplyKeyboard::Main).await;
    }

    async fn add_one(&self, chat_id: i64, identity: &str) {
        let text = match self.controller.add_one(identity).await {
            Ok(added) => {
                info!(identity = %added, "Single add succeeded");
                messages::added(identity.trim())
            }
            Err(ControllerError::EmptyIdentity) => messages::EMPTY_IDENTITY.to_string(),
            Err(_) => messages::add_failed(identity.trim()),
        };
        self.reply(chat_id, &text, ReplyKeyboard::Main).await;
    }

    async fn reply(&self, chat_id: i64, text: &str, keyboard: ReplyKeyboard) {
        if let Err(e) = self.replies.deliver(chat_id, text, keyboard).await {
            warn!(chat_id, error = %e, "Failed to send reply");
        }
    }

    fn is_awaiting(&self, chat_id: i64) -> bool {
        self.awaiting_identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&chat_id)
    }

    fn set_awaiting(&self, chat_id: i64, awaiting: bool) {
        let mut chats = self
            .awaiting_identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if awaiting {
            chats.insert(chat_id);
        } else {
            chats.remove(&chat_id);
        }
    }
}
