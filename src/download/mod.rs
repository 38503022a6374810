//! Attachment materialization: safe names, atomic writes, and dated timestamps.
//!
//! Layout produced under the download root:
//! `<sanitized-sender>/<YYYY-MM-DD> - <filename>[-N].<ext>`

pub mod filename;
pub mod orchestrator;
pub mod timestamp;
pub mod writer;

pub use orchestrator::{
    run, AttachmentFetcher, DirectorySummary, DownloadFailure, DownloadOptions, DownloadOutcome,
    DownloadReport, OutcomeStatus,
};
