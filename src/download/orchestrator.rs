//! Per-attachment download loop: resolve, fetch, commit, stamp.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{BoxError, GmailCtrlError};
use crate::model::attachment::AttachmentDescriptor;

use super::{filename, timestamp, writer};

/// Source of attachment payloads (normally the mail API).
pub trait AttachmentFetcher {
    /// Fetch the raw bytes of one attachment.
    fn fetch(&mut self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, BoxError>;
}

impl<F, E> AttachmentFetcher for F
where
    F: FnMut(&str, &str) -> Result<Vec<u8>, E>,
    E: Into<BoxError>,
{
    fn fetch(&mut self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, BoxError> {
        self(message_id, attachment_id).map_err(Into::into)
    }
}

/// Tuning for a download run.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Skip an attachment whose date-prefixed name already exists on disk
    /// (and was not written earlier in this run) without fetching it.
    pub skip_existing: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
        }
    }
}

/// What happened to a single attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Written,
    SkippedExisting,
}

/// Result for one attachment that was handled without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Sender directory (under the download root).
    pub directory: PathBuf,
    /// Final path of the file (the existing one, when skipped).
    pub path: PathBuf,
    /// Bytes written; zero when skipped.
    pub bytes: u64,
    pub status: OutcomeStatus,
}

/// Per-directory totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySummary {
    pub files_written: usize,
    pub files_skipped: usize,
    pub total_bytes: u64,
}

/// Everything accumulated by a run, complete or aborted.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Outcomes in input order.
    pub outcomes: Vec<DownloadOutcome>,
    /// Totals keyed by sender directory name.
    pub summary: BTreeMap<String, DirectorySummary>,
}

impl DownloadReport {
    /// Total files written across all directories.
    pub fn files_written(&self) -> usize {
        self.summary.values().map(|s| s.files_written).sum()
    }

    /// Total bytes written across all directories.
    pub fn total_bytes(&self) -> u64 {
        self.summary.values().map(|s| s.total_bytes).sum()
    }

    fn record(&mut self, dir_name: &str, outcome: DownloadOutcome) {
        let entry = self.summary.entry(dir_name.to_string()).or_default();
        match outcome.status {
            OutcomeStatus::Written => {
                entry.files_written += 1;
                entry.total_bytes += outcome.bytes;
            }
            OutcomeStatus::SkippedExisting => entry.files_skipped += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// A run aborted by its first error, with whatever completed before it.
#[derive(Debug, thiserror::Error)]
#[error(
    "Download aborted after {completed} attachment(s): {source}",
    completed = .report.outcomes.len()
)]
pub struct DownloadFailure {
    /// Outcomes and totals gathered before the failure.
    pub report: DownloadReport,
    /// The attachment that failed.
    pub attachment: AttachmentDescriptor,
    #[source]
    pub source: GmailCtrlError,
}

/// Download `attachments` under `root`, one sender directory each.
///
/// Stops at the first error from the fetcher, the writer, or the timestamp
/// step; nothing after it is attempted. `progress` receives `(done, total)`.
pub fn run(
    attachments: &[AttachmentDescriptor],
    root: &Path,
    fetcher: &mut dyn AttachmentFetcher,
    options: &DownloadOptions,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<DownloadReport, DownloadFailure> {
    let total = attachments.len();
    let mut report = DownloadReport::default();
    // Names committed during this run; a repeat is a distinct attachment, not a re-run.
    let mut written_this_run: HashSet<PathBuf> = HashSet::new();

    info!(root = %root.display(), total, "Starting attachment download");

    for (i, attachment) in attachments.iter().enumerate() {
        if let Some(cb) = progress {
            cb(i, total);
        }

        match download_one(attachment, root, fetcher, options, &written_this_run) {
            Ok((dir_name, outcome)) => {
                if outcome.status == OutcomeStatus::Written {
                    written_this_run.insert(outcome.path.clone());
                }
                report.record(&dir_name, outcome);
            }
            Err(source) => {
                warn!(
                    message_id = %attachment.message_id,
                    attachment_id = %attachment.attachment_id,
                    error = %source,
                    "Download aborted"
                );
                return Err(DownloadFailure {
                    report,
                    attachment: attachment.clone(),
                    source,
                });
            }
        }
    }

    if let Some(cb) = progress {
        cb(total, total);
    }
    info!(
        files = report.files_written(),
        bytes = report.total_bytes(),
        "Attachment download finished"
    );
    Ok(report)
}

fn download_one(
    attachment: &AttachmentDescriptor,
    root: &Path,
    fetcher: &mut dyn AttachmentFetcher,
    options: &DownloadOptions,
    written_this_run: &HashSet<PathBuf>,
) -> crate::error::Result<(String, DownloadOutcome)> {
    let dir_name = filename::sender_dir_name(&attachment.sender);
    let directory = root.join(&dir_name);
    let desired = attachment.desired_name();

    let candidate_name = filename::dated_name(&desired, attachment.email_date);
    let candidate = directory.join(&candidate_name);
    if options.skip_existing
        && !written_this_run.contains(&candidate)
        && filename::is_taken(&directory, &candidate_name)?
    {
        debug!(path = %candidate.display(), "Already downloaded; skipping");
        return Ok((
            dir_name,
            DownloadOutcome {
                directory,
                path: candidate,
                bytes: 0,
                status: OutcomeStatus::SkippedExisting,
            },
        ));
    }

    let name = filename::resolve(&directory, &desired, attachment.email_date)?;

    let payload = fetcher
        .fetch(&attachment.message_id, &attachment.attachment_id)
        .map_err(|source| GmailCtrlError::Fetch {
            message_id: attachment.message_id.clone(),
            attachment_id: attachment.attachment_id.clone(),
            source,
        })?;

    let path = writer::write(&directory, &name, &payload)?;
    stamp_or_discard(&path, attachment.email_date, timestamp::apply)?;

    debug!(path = %path.display(), bytes = payload.len(), "Saved attachment");
    Ok((
        dir_name,
        DownloadOutcome {
            directory,
            path,
            bytes: payload.len() as u64,
            status: OutcomeStatus::Written,
        },
    ))
}

/// Apply `stamp` to a freshly committed file, removing the file if it fails.
///
/// A file under its final name must carry its email date, otherwise a later
/// run would skip it as already downloaded.
fn stamp_or_discard(
    path: &Path,
    date: DateTime<Utc>,
    stamp: impl FnOnce(&Path, DateTime<Utc>) -> crate::error::Result<()>,
) -> crate::error::Result<()> {
    let Err(err) = stamp(path, date) else {
        return Ok(());
    };
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove unstamped file");
    }
    Err(err)
}
