//! Per-sender aggregates produced by a scan.

use chrono::{DateTime, Utc};

/// A message as retained inside its sender group.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GroupedMessage {
    pub id: String,
    pub subject: String,
    pub date: DateTime<Utc>,
}

/// All messages sharing one normalized sender address.
///
/// Rebuilt from scratch on every scan. The message count is the length of
/// `messages`, so count and retained ids cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SenderGroup {
    /// Normalized (lower-cased) sender address; the grouping key.
    pub address: String,

    /// First non-empty display name seen in scan order (may be empty).
    pub display_name: String,

    /// Oldest message date in the group.
    pub oldest: DateTime<Utc>,

    /// Newest message date in the group.
    pub newest: DateTime<Utc>,

    /// Subject of the newest message.
    pub newest_subject: String,

    /// Sum of attachment counts across messages.
    pub total_attachments: u64,

    /// `true` iff at least one message carried `List-Unsubscribe`.
    pub has_unsubscribe: bool,

    /// Constituent messages in scan order.
    pub messages: Vec<GroupedMessage>,
}

impl SenderGroup {
    /// Number of messages in the group.
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    /// Message ids in scan order, for bulk action submission.
    pub fn message_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.messages.iter().map(|m| m.id.as_str())
    }

    /// Name to show in tables: the display name, else the address.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.address
        } else {
            &self.display_name
        }
    }
}
