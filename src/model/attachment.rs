//! Attachment descriptors.
//!
//! The payload is NOT part of the descriptor; it is fetched lazily by the
//! download orchestrator, and only when the file is not already on disk.

use chrono::{DateTime, Utc};

/// Extension given to attachments that arrive without a filename.
pub const SYNTHETIC_EXTENSION: &str = "bin";

/// Metadata about a downloadable attachment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttachmentDescriptor {
    /// Identifier of the message that carries the attachment.
    pub message_id: String,

    /// Attachment identifier, unique within the message.
    pub attachment_id: String,

    /// Original filename, if the part declared one.
    pub filename: Option<String>,

    /// Declared size in bytes (informational; the written count is authoritative).
    pub size: u64,

    /// Normalized sender address; selects the target directory.
    pub sender: String,

    /// Logical email date used for naming and timestamping.
    pub email_date: DateTime<Utc>,
}

impl AttachmentDescriptor {
    /// The name to store this attachment under, before date prefixing.
    ///
    /// Attachments without a usable filename get
    /// `attachment-{message_id}-{attachment_id}.bin`, with the attachment id
    /// shortened to 12 characters since Gmail ids are very long.
    pub fn desired_name(&self) -> String {
        match self.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let short_id: String = self.attachment_id.chars().take(12).collect();
                format!(
                    "attachment-{}-{short_id}.{SYNTHETIC_EXTENSION}",
                    self.message_id
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn descriptor(filename: Option<&str>) -> AttachmentDescriptor {
        AttachmentDescriptor {
            message_id: "18c0ffee".to_string(),
            attachment_id: "ANGjdJ8abcdefghijklmnop".to_string(),
            filename: filename.map(str::to_string),
            size: 10,
            sender: "a@x.com".to_string(),
            email_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_desired_name_keeps_original() {
        assert_eq!(descriptor(Some("report.pdf")).desired_name(), "report.pdf");
    }

    #[test]
    fn test_desired_name_synthesized_when_missing() {
        assert_eq!(
            descriptor(None).desired_name(),
            "attachment-18c0ffee-ANGjdJ8abcde.bin"
        );
        assert_eq!(
            descriptor(Some("   ")).desired_name(),
            "attachment-18c0ffee-ANGjdJ8abcde.bin"
        );
    }
}
