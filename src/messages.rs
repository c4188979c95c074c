//! User-visible texts: replies, broadcasts and reply-keyboard labels.

use crate::controller::StatsSnapshot;

/// Reply-keyboard button labels. The dispatcher matches incoming text
/// against these exactly.
pub mod buttons {
    pub const START: &str = "▶️ Start inviting";
    pub const STOP: &str = "⏹ Stop";
    pub const STATS: &str = "📊 Stats";
    pub const ADD_USER: &str = "➕ Add user";
    pub const CANCEL: &str = "❌ Cancel";
}

pub const ACCESS_DENIED: &str = "🚫 Access denied: admin rights required";
pub const READY: &str = "🤖 Bot is ready!";
pub const STARTUP: &str = "🤖 Bot started successfully!";
pub const NO_IDENTITIES: &str = "❌ The username file is empty or was not found";
pub const ALREADY_RUNNING: &str = "⚠️ An invitation run is already in progress. Stop it first.";
pub const STOP_REQUESTED: &str = "🛑 The invitation run will be stopped!";
pub const STOPPED_EARLY: &str = "⏹ Invitation run stopped";
pub const ASK_IDENTITY: &str = "Enter the user's @username:";
pub const CANCELLED: &str = "Action cancelled";
pub const EMPTY_IDENTITY: &str = "❌ Username is empty";

pub fn started(total: u64) -> String {
    format!("🔍 Loaded {total} users, starting invitations...")
}

pub fn progress(stats: &StatsSnapshot) -> String {
    format!(
        "Progress: {}/{}\n✅ Success: {}\n❌ Failed: {}",
        stats.processed, stats.total, stats.success, stats.failed
    )
}

pub fn report(stats: &StatsSnapshot) -> String {
    format!(
        "🎉 Invitations finished!\nTotal: {}\nSuccess: {}\nFailed: {}",
        stats.total, stats.success, stats.failed
    )
}

pub fn stats(stats: &StatsSnapshot) -> String {
    format!(
        "📊 Current stats:\n• Total: {}\n• Success: {}\n• Failed: {}\n• Remaining: {}",
        stats.total,
        stats.success,
        stats.failed,
        stats.remaining()
    )
}

pub fn added(identity: &str) -> String {
    format!("✅ {identity} added successfully")
}

pub fn add_failed(identity: &str) -> String {
    format!("❌ Could not add {identity}")
}
