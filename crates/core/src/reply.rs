//! Outbound messages handed back to the chat layer.

use std::fmt;

/// Emoji used to acknowledge an unrecognised command.
pub const UNKNOWN_COMMAND_REACTION: &str = "❓";

/// One outbound message for the context a command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain (markdown) text.
    Text(String),
    /// Reaction added to the triggering message.
    React(String),
}

impl Reply {
    /// Convenience constructor for text replies.
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text(body.into())
    }

    /// Text body, if this is a text reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(body) => Some(body),
            Reply::React(_) => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(body) => f.write_str(body),
            Reply::React(emoji) => write!(f, "[reacted {emoji}]"),
        }
    }
}

/// Format a currency amount the way every message shows it.
pub fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Format a percentage stat.
pub fn percent(value: f64) -> String {
    format!("{value:.2}%")
}
