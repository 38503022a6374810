//! Message records handed to the grouping engine.

use chrono::{DateTime, Utc};

use super::address::SenderKey;

/// Metadata for a single listed inbox message.
///
/// Produced by the message source; immutable once built.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageRecord {
    /// Opaque, unique message identifier.
    pub id: String,

    /// Raw `From` header value, normalized on demand by [`MessageRecord::sender`].
    pub from: String,

    /// Received date, normalized to UTC.
    pub date: DateTime<Utc>,

    /// Number of attachment parts (parts carrying a filename).
    pub attachment_count: u32,

    /// Whether a `List-Unsubscribe` header was present.
    pub has_unsubscribe: bool,

    /// Decoded subject line.
    pub subject: String,
}

impl MessageRecord {
    /// Parse the `From` header into a grouping key.
    pub fn sender(&self) -> SenderKey {
        SenderKey::parse(&self.from)
    }
}
