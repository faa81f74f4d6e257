//! Core data types: stored messages and their identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a message by the store.
///
/// The crate never generates ids on the client side; a `MessageId` either
/// came back from an insert or was parsed out of a share link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a raw identifier, rejecting blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored secret message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned identifier.
    pub id: MessageId,

    /// The message text, exactly as submitted.
    pub content: String,

    /// When the store accepted the message, if the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Length of the content in bytes.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_parse() {
        assert_eq!(MessageId::parse("abc123").unwrap().as_str(), "abc123");
        assert_eq!(MessageId::parse("  abc123\n").unwrap().as_str(), "abc123");
        assert!(MessageId::parse("").is_none());
        assert!(MessageId::parse("   ").is_none());
    }

    #[test]
    fn test_message_id_display() {
        let id = MessageId::parse("abc123").unwrap();
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_message_id_serializes_as_plain_string() {
        let id = MessageId::parse("abc123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }

    #[test]
    fn test_message_json_shape() {
        let message = Message {
            id: MessageId::parse("abc123").unwrap(),
            content: "meet at 7pm".to_string(),
            created_at: None,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["content"], "meet at 7pm");
        assert!(json.get("created_at").is_none());
        assert_eq!(message.content_len(), 11);
    }
}
