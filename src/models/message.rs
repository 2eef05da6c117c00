use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An attachment reference carried by a [`Message`].
///
/// Email attachments are encoded inline as `data:` URLs; chat-style
/// attachments carry a durable object-store URL instead. Either way the
/// attachment is derived from the message source, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub mime_type: String,
}

/// A normalized inbound message, email or SMS.
///
/// Email messages are keyed by mailbox UID, SMS messages by their insertion
/// timestamp. `subject` is only populated for email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
    pub snippet: String,
    pub timestamp: DateTime<Utc>,
    pub seen: bool,
    pub flags: Vec<String>,
    pub attachments: Vec<Attachment>,
}
