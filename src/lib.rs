//! group-invite-bot - bulk group invitations driven by a Telegram bot
//!
//! Reads a list of Telegram handles, adds each one to a fixed group at a
//! throttled pace and keeps a set of admins informed while they steer the
//! run from chat.
//!
//! ## Architecture
//!
//! ```text
//! UpdatePoller (getUpdates long poll)
//!     └── Dispatcher (one task per update)
//!             ├── Gatekeeper        admin allow-list, checked first
//!             ├── source            CSV -> Vec<String>
//!             └── InvitationController
//!                     ├── SessionStats     atomic counters
//!                     ├── batch task       tracked JoinHandle
//!                     ├── MembershipClient add(group, identity)
//!                     └── Notifier         broadcast to admins
//! ```

pub mod commands;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod gatekeeper;
pub mod identity;
pub mod membership;
pub mod messages;
pub mod notify;
pub mod source;
pub mod telegram;

pub use config::{BotConfig, ConfigError};
pub use controller::{
    ControllerError, ControllerSettings, InvitationController, JobOutcome, JobState, StartAck,
    StatsSnapshot,
};
pub use dispatcher::{Dispatcher, Inbound};
pub use gatekeeper::{AccessDenied, Gatekeeper};
pub use membership::{MembershipClient, MembershipError, TelegramMembership};
pub use notify::{NotificationSink, Notifier, ReplyKeyboard};
