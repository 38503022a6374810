//! Offline adapter for Gmail API message resources.
//!
//! Reads the JSON returned by `users.messages.get` (`format=metadata` or
//! `format=full`), saved as a JSON array, and turns it into the records the
//! grouping and download engines consume.

use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{GmailCtrlError, Result};
use crate::model::address::SenderKey;
use crate::model::attachment::AttachmentDescriptor;
use crate::model::message::MessageRecord;

use super::date::parse_date;

/// System label of messages in the inbox.
pub const INBOX_LABEL: &str = "INBOX";

/// A `users.messages` resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GmailMessage {
    pub id: String,
    /// Milliseconds since the epoch, as a decimal string.
    pub internal_date: Option<String>,
    /// Empty when the saved resource omits labels.
    pub label_ids: Vec<String>,
    pub payload: Option<MessagePart>,
}

/// One MIME part of a message payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub filename: String,
    pub headers: Vec<Header>,
    pub body: Option<PartBody>,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartBody {
    pub attachment_id: Option<String>,
    pub size: u64,
}

impl GmailMessage {
    /// Case-insensitive top-level header lookup; empty when absent.
    pub fn header(&self, name: &str) -> &str {
        self.payload
            .as_ref()
            .and_then(|p| {
                p.headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
            })
            .map(|h| h.value.as_str())
            .unwrap_or("")
    }

    /// Message date from the `Date` header, then `internalDate`, then the epoch.
    pub fn date(&self) -> DateTime<Utc> {
        if let Some(dt) = parse_date(self.header("Date")) {
            return dt;
        }
        let internal = self
            .internal_date
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        match internal {
            Some(dt) => dt,
            None => {
                warn!(
                    id = %self.id,
                    date = %self.header("Date"),
                    "Unparseable date; using Unix epoch"
                );
                DateTime::<Utc>::UNIX_EPOCH
            }
        }
    }

    /// Whether the message is in the inbox.
    ///
    /// Resources saved without `labelIds` are assumed to be.
    pub fn in_inbox(&self) -> bool {
        self.label_ids.is_empty() || self.label_ids.iter().any(|l| l == INBOX_LABEL)
    }

    /// Top-level parts that declare a filename.
    fn top_level_attachment_count(&self) -> u32 {
        let count = self
            .payload
            .as_ref()
            .map_or(0, |p| p.parts.iter().filter(|part| !part.filename.is_empty()).count());
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Every part, at any depth, that declares a filename.
    fn named_parts(&self) -> Vec<&MessagePart> {
        let mut found = Vec::new();
        if let Some(payload) = &self.payload {
            collect_named_parts(&payload.parts, &mut found);
        }
        found
    }
}

fn collect_named_parts<'a>(parts: &'a [MessagePart], found: &mut Vec<&'a MessagePart>) {
    for part in parts {
        if !part.filename.is_empty() {
            found.push(part);
        }
        collect_named_parts(&part.parts, found);
    }
}

/// Build the grouping record for one message.
///
/// The attachment count covers top-level parts only; nested parts are still
/// found by [`attachment_descriptors`].
pub fn message_record(message: &GmailMessage) -> MessageRecord {
    MessageRecord {
        id: message.id.clone(),
        from: message.header("From").to_string(),
        date: message.date(),
        attachment_count: message.top_level_attachment_count(),
        has_unsubscribe: !message.header("List-Unsubscribe").trim().is_empty(),
        subject: message.header("Subject").to_string(),
    }
}

/// Downloadable attachments of one message.
///
/// Only parts with both a filename and an attachment id qualify. Messages
/// whose sender cannot be parsed yield nothing.
pub fn attachment_descriptors(message: &GmailMessage) -> Vec<AttachmentDescriptor> {
    let sender = match SenderKey::parse(message.header("From")) {
        SenderKey::Parsed(addr) => addr.address,
        SenderKey::Fallback { raw } => {
            debug!(id = %message.id, from = %raw, "Skipping attachments of unparseable sender");
            return Vec::new();
        }
    };
    let email_date = message.date();

    message
        .named_parts()
        .into_iter()
        .filter_map(|part| {
            let body = part.body.as_ref()?;
            let attachment_id = body.attachment_id.clone()?;
            Some(AttachmentDescriptor {
                message_id: message.id.clone(),
                attachment_id,
                filename: Some(part.filename.clone()),
                size: body.size,
                sender: sender.clone(),
                email_date,
            })
        })
        .collect()
}

/// Keep attachments whose email is newer than `days` days before `now`.
pub fn newer_than(
    attachments: Vec<AttachmentDescriptor>,
    days: u32,
    now: DateTime<Utc>,
) -> Vec<AttachmentDescriptor> {
    let cutoff = now - Duration::days(i64::from(days));
    attachments
        .into_iter()
        .filter(|a| a.email_date > cutoff)
        .collect()
}

/// Load a JSON array of message resources.
pub fn load_messages(path: &Path) -> Result<Vec<GmailMessage>> {
    let data = std::fs::read(path).map_err(|e| GmailCtrlError::io(path, e))?;
    let messages: Vec<GmailMessage> = serde_json::from_slice(&data)
        .map_err(|e| GmailCtrlError::invalid_input(path, e.to_string()))?;
    info!(path = %path.display(), count = messages.len(), "Loaded messages");
    Ok(messages)
}

/// Load inbox messages and convert them to records, keeping at most `limit`.
pub fn load_records(path: &Path, limit: Option<usize>) -> Result<Vec<MessageRecord>> {
    let messages = load_messages(path)?;
    let take = limit.unwrap_or(messages.len());
    Ok(messages
        .iter()
        .filter(|m| m.in_inbox())
        .take(take)
        .map(message_record)
        .collect())
}

/// Load inbox messages and collect every downloadable attachment.
pub fn load_attachments(path: &Path) -> Result<Vec<AttachmentDescriptor>> {
    let messages = load_messages(path)?;
    Ok(messages
        .iter()
        .filter(|m| m.in_inbox())
        .flat_map(attachment_descriptors)
        .collect())
}
