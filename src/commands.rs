//! Command parsing for incoming chat text.
//!
//! Accepted forms, case-insensitive for words:
//!
//! | Command       | Text                                            |
//! |---------------|-------------------------------------------------|
//! | Welcome       | `/start`                                        |
//! | Start         | `start`, `▶️ Start inviting`                    |
//! | Stop          | `stop`, `/stop`, `⏹ Stop`                       |
//! | Stats         | `stats`, `/stats`, `📊 Stats`                   |
//! | Add           | `add <identity>`, `/add <identity>`             |
//! | AddPrompt     | `add`, `/add`, `➕ Add user`                     |
//! | Cancel        | `cancel`, `/cancel`, `❌ Cancel`                 |
//!
//! While a chat is being prompted for a handle, any other text is taken as
//! the identity to add.

use crate::messages::buttons;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Welcome,
    Start,
    Stop,
    Stats,
    /// Ask the operator for a handle
    AddPrompt,
    Cancel,
    Add(String),
    Unknown,
}

impl Command {
    pub fn parse(text: &str, awaiting_identity: bool) -> Self {
        let text = text.trim();

        match text {
            buttons::START => return Command::Start,
            buttons::STOP => return Command::Stop,
            buttons::STATS => return Command::Stats,
            buttons::ADD_USER => return Command::AddPrompt,
            buttons::CANCEL => return Command::Cancel,
            _ => {}
        }

        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };
        let head = head.to_lowercase();
        let is_slash = head.starts_with('/');
        // Group chats address commands as `/stats@SomeBot`.
        let word = head
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default();

        match (word, is_slash) {
            ("start", true) if rest.is_empty() => return Command::Welcome,
            ("start", false) if rest.is_empty() => return Command::Start,
            ("stop", _) if rest.is_empty() => return Command::Stop,
            ("stats", _) if rest.is_empty() => return Command::Stats,
            ("cancel", _) if rest.is_empty() => return Command::Cancel,
            ("add", _) if rest.is_empty() => return Command::AddPrompt,
            ("add", _) => return Command::Add(rest.to_string()),
            _ => {}
        }

        if awaiting_identity && !text.is_empty() {
            Command::Add(text.to_string())
        } else {
            Command::Unknown
        }
    }
}
