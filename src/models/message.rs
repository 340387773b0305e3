//! Message-related models

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Who wrote a message, relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The viewer (the "self" side of the conversation).
    #[serde(rename = "self")]
    Own,
    Other,
}

impl Sender {
    /// Classify a frame's sender against the viewer id.
    pub fn classify(sender_id: i64, viewer_id: i64) -> Self {
        if sender_id == viewer_id {
            Sender::Own
        } else {
            Sender::Other
        }
    }
}

/// A message held by a chat panel. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Client-generated UUID, unique per panel instance.
    pub id: String,
    pub sender: Sender,
    pub content: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

impl Message {
    pub fn new(sender: Sender, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            content: content.into(),
            timestamp,
        }
    }

    /// Build a message from an inbound frame.
    pub fn from_frame(frame: InboundFrame, viewer_id: i64) -> Self {
        Self::new(
            Sender::classify(frame.sender_id, viewer_id),
            frame.message,
            frame.sent_at.saturating_mul(1000),
        )
    }

    /// Local `HH:MM:SS` of the message.
    pub fn display_time(&self) -> String {
        Local
            .timestamp_millis_opt(self.timestamp)
            .single()
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// JSON envelope pushed by the server over `/ws/chat/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundFrame {
    pub sender_id: i64,
    pub message: String,
    /// Seconds since epoch.
    pub sent_at: i64,
}

impl InboundFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_self_and_other() {
        assert_eq!(Sender::classify(5, 5), Sender::Own);
        assert_eq!(Sender::classify(6, 5), Sender::Other);
        // Unknown viewer never matches a real sender.
        assert_eq!(Sender::classify(5, -1), Sender::Other);
    }

    #[test]
    fn test_from_frame_converts_seconds() {
        let frame = InboundFrame::parse(r#"{"sender_id":2,"message":"yo","sent_at":1700000000}"#)
            .unwrap();
        let msg = Message::from_frame(frame, 1);
        assert_eq!(msg.sender, Sender::Other);
        assert_eq!(msg.content, "yo");
        assert_eq!(msg.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(InboundFrame::parse(r#"{"message":"yo"}"#).is_err());
        assert!(InboundFrame::parse("plain text").is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Message::new(Sender::Own, "x", 0);
        let b = Message::new(Sender::Own, "x", 0);
        assert_ne!(a.id, b.id);
    }
}
