//! Chat-related models

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::User;

/// One row of `/get-chats`: a conversation preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: i64,
    /// `null` for chats without messages.
    #[serde(default)]
    pub last_message: Option<String>,
    /// Seconds since epoch, `null` for chats without messages.
    #[serde(default)]
    pub last_message_at: Option<i64>,
    pub other_user: User,
}

impl ChatSummary {
    /// Local `HH:MM` of the last message, or empty.
    pub fn display_time(&self) -> String {
        self.last_message_at
            .map(|secs| format_clock(secs, &Local))
            .unwrap_or_default()
    }

    pub fn preview(&self) -> &str {
        self.last_message.as_deref().unwrap_or("")
    }
}

/// Body of `POST /chats`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub recipient: String,
}

/// Format epoch seconds as `HH:MM` in the given zone.
pub fn format_clock<Tz: TimeZone>(secs: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}
