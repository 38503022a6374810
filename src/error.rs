//! Centralized error types for gmailctrl.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error raised by an external collaborator (e.g. the attachment fetcher).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors produced by the gmailctrl library.
#[derive(Error, Debug)]
pub enum GmailCtrlError {
    /// No address-like token could be located in a `From` header.
    ///
    /// Aggregation never propagates this; it routes the message into the
    /// shared unknown-sender group instead.
    #[error("Malformed sender header: '{raw}'")]
    MalformedSender { raw: String },

    /// Writing an attachment payload failed before it was committed.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The attachment fetcher failed.
    #[error("Failed to fetch attachment {attachment_id} of message {message_id}: {source}")]
    Fetch {
        message_id: String,
        attachment_id: String,
        source: BoxError,
    },

    /// Directory creation, metadata lookup or timestamp update failed.
    #[error("Filesystem error at '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An input file could not be read or decoded.
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },
}

/// Convenience alias for `Result<T, GmailCtrlError>`.
pub type Result<T> = std::result::Result<T, GmailCtrlError>;

impl GmailCtrlError {
    /// Create a `Filesystem` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Create a `Write` variant from a path and an `io::Error`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create an `InvalidInput` variant.
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
