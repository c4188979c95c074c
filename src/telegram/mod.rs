//! Telegram Bot API transport.
//!
//! A thin JSON-over-HTTPS client (`TelegramClient`), the wire types it
//! speaks, reply-keyboard rendering and the long-poll loop feeding updates
//! to the dispatcher.

pub mod client;
pub mod keyboard;
pub mod poller;
pub mod types;

use thiserror::Error;

pub use client::TelegramClient;
pub use poller::UpdatePoller;
pub use types::{Chat, Message, Update, User};

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP transport error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("{method} failed ({code}): {description}")]
    Api {
        method: &'static str,
        code: i32,
        description: String,
    },

    #[error("{0} returned ok without a result")]
    MissingResult(&'static str),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        TelegramError::Http(e.without_url())
    }
}
