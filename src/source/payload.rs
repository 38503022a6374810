//! Attachment payloads read from a local directory.
//!
//! Layout: `<dir>/<message_id>/<attachment_id>.json` holding a Gmail
//! `users.messages.attachments.get` response (`{"data": "<base64url>"}`),
//! or `<dir>/<message_id>/<attachment_id>` holding the raw bytes.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::download::AttachmentFetcher;
use crate::error::{BoxError, GmailCtrlError};

#[derive(Debug, Deserialize)]
struct AttachmentBody {
    data: String,
}

/// Fetches attachments from saved API responses.
#[derive(Debug, Clone)]
pub struct PayloadDirFetcher {
    root: PathBuf,
}

impl PayloadDirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, message_id: &str, attachment_id: &str) -> crate::error::Result<Vec<u8>> {
        let dir = self.root.join(message_id);
        let json_path = dir.join(format!("{attachment_id}.json"));
        if json_path.is_file() {
            return read_json_body(&json_path);
        }
        let raw_path = dir.join(attachment_id);
        std::fs::read(&raw_path).map_err(|e| GmailCtrlError::io(raw_path, e))
    }
}

impl AttachmentFetcher for PayloadDirFetcher {
    fn fetch(&mut self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, BoxError> {
        debug!(message_id, attachment_id, "Reading attachment payload");
        self.read(message_id, attachment_id).map_err(Into::into)
    }
}

fn read_json_body(path: &Path) -> crate::error::Result<Vec<u8>> {
    let data = std::fs::read(path).map_err(|e| GmailCtrlError::io(path, e))?;
    let body: AttachmentBody = serde_json::from_slice(&data)
        .map_err(|e| GmailCtrlError::invalid_input(path, e.to_string()))?;
    decode_base64url(&body.data)
        .map_err(|reason| GmailCtrlError::invalid_input(path, reason))
}

/// Decode Gmail's base64url, with or without padding.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>, String> {
    let trimmed = data.trim();
    URL_SAFE_NO_PAD
        .decode(trimmed.as_bytes())
        .or_else(|_| URL_SAFE.decode(trimmed.as_bytes()))
        .map_err(|err| format!("invalid base64url payload: {err}"))
}
