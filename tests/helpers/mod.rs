//! In-memory fakes for the membership client and the notification sink.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use group_invite_bot::{
    ControllerSettings, InvitationController, MembershipClient, MembershipError,
    NotificationSink, Notifier, ReplyKeyboard,
};

pub const GROUP_ID: i64 = -1001234;
pub const ADMINS: [i64; 2] = [11, 22];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: ReplyKeyboard,
}

/// Records every delivery; chats in `refuse` fail.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Sent>>,
    refuse: HashSet<i64>,
}

impl RecordingSink {
    pub fn refusing(chats: impl IntoIterator<Item = i64>) -> Self {
        Self {
            refuse: chats.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts delivered to one chat, in order.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> anyhow::Result<()> {
        if self.refuse.contains(&chat_id) {
            anyhow::bail!("Forbidden: bot was blocked by the user");
        }
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }
}

/// Succeeds unless the identity is listed in `failing`. Records every call
/// and can signal after the n-th one.
#[derive(Default)]
pub struct ScriptedMembership {
    failing: HashSet<String>,
    calls: Mutex<Vec<(i64, String)>>,
    signal_after: Option<(usize, Arc<Notify>)>,
}

impl ScriptedMembership {
    pub fn failing(identities: &[&str]) -> Self {
        Self {
            failing: identities.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn signal_after(mut self, calls: usize, notify: Arc<Notify>) -> Self {
        self.signal_after = Some((calls, notify));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, identity)| identity.clone())
            .collect()
    }

    pub fn groups(&self) -> Vec<i64> {
        self.calls.lock().unwrap().iter().map(|(g, _)| *g).collect()
    }
}

#[async_trait]
impl MembershipClient for ScriptedMembership {
    async fn add(&self, group_id: i64, identity: &str) -> Result<(), MembershipError> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((group_id, identity.to_string()));
            calls.len()
        };
        if let Some((n, notify)) = &self.signal_after {
            if count == *n {
                notify.notify_one();
            }
        }
        if self.failing.contains(identity) {
            return Err(MembershipError::Rejected {
                identity: identity.to_string(),
                reason: "USER_PRIVACY_RESTRICTED".to_string(),
            });
        }
        Ok(())
    }
}

pub fn identities(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("user{i}")).collect()
}

pub fn controller(
    membership: Arc<ScriptedMembership>,
    sink: Arc<RecordingSink>,
    delay: Duration,
) -> InvitationController {
    InvitationController::new(
        membership,
        Notifier::new(sink, ADMINS.to_vec()),
        ControllerSettings::new(GROUP_ID, delay),
    )
}
