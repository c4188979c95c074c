//! Membership client: "add identity X to group G".

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::telegram::{TelegramClient, TelegramError};

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("could not resolve {identity}: {reason}")]
    Unresolved { identity: String, reason: String },

    #[error("platform refused to add {identity}: {reason}")]
    Rejected { identity: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TelegramError),
}

/// A single add attempt. Implementations must not retry.
#[async_trait]
pub trait MembershipClient: Send + Sync {
    async fn add(&self, group_id: i64, identity: &str) -> Result<(), MembershipError>;
}

/// Adds users through the Bot API.
///
/// Handles are first resolved to numeric user ids with `getChat`, then
/// admitted with `approveChatJoinRequest`.
pub struct TelegramMembership {
    api: Arc<TelegramClient>,
}

impl TelegramMembership {
    pub fn new(api: Arc<TelegramClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MembershipClient for TelegramMembership {
    async fn add(&self, group_id: i64, identity: &str) -> Result<(), MembershipError> {
        let user = self.api.get_chat(identity).await.map_err(|e| match e {
            TelegramError::Api { description, .. } => MembershipError::Unresolved {
                identity: identity.to_string(),
                reason: description,
            },
            other => MembershipError::Transport(other),
        })?;

        match self.api.approve_chat_join_request(group_id, user.id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MembershipError::Rejected {
                identity: identity.to_string(),
                reason: "request not approved".to_string(),
            }),
            Err(TelegramError::Api { description, .. }) => Err(MembershipError::Rejected {
                identity: identity.to_string(),
                reason: description,
            }),
            Err(other) => Err(other.into()),
        }
    }
}
