//! Telegram Bot API client
//!
//! Every method is a JSON `POST` to `{api_url}/bot{token}/{method}`. The
//! response envelope is decoded regardless of HTTP status because the API
//! reports failures as `{"ok": false, ...}` bodies on 4xx.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::keyboard::reply_markup;
use super::types::{
    ApiResponse, ApproveChatJoinRequest, Chat, GetChat, GetUpdates, Message, SendMessage, Update,
    User,
};
use super::TelegramError;
use crate::notify::{NotificationSink, ReplyKeyboard};

/// Extra headroom on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 10;

pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a client for the given API root and bot token.
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(
                poll_timeout_secs + REQUEST_TIMEOUT_MARGIN_SECS,
            ))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<P, T>(&self, method: &'static str, params: &P) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(method, "Bot API call");
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(params)
            .send()
            .await?
            .json()
            .await?;
        response.into_result(method)
    }

    /// Identity of the bot behind the token.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for new updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: &["message"],
            },
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<Message, TelegramError> {
        self.call(
            "sendMessage",
            &SendMessage {
                chat_id,
                text,
                reply_markup: Some(reply_markup(keyboard)),
            },
        )
        .await
    }

    /// Resolve a public `@handle` (or numeric id) to a chat.
    pub async fn get_chat(&self, chat: &str) -> Result<Chat, TelegramError> {
        self.call("getChat", &GetChat { chat_id: chat }).await
    }

    /// Admit `user_id` into `chat_id`.
    pub async fn approve_chat_join_request(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<bool, TelegramError> {
        self.call(
            "approveChatJoinRequest",
            &ApproveChatJoinRequest { chat_id, user_id },
        )
        .await
    }
}

#[async_trait]
impl NotificationSink for TelegramClient {
    async fn deliver(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> anyhow::Result<()> {
        self.send_message(chat_id, text, keyboard).await?;
        Ok(())
    }
}
