//! Integration tests for attachment downloads: layout, timestamps, skipping,
//! atomic commits, and fail-fast behavior.

use std::cell::RefCell;
use std::path::Path;
use std::time::UNIX_EPOCH;

use assert_fs::prelude::*;
use chrono::{TimeZone, Utc};
use predicates::prelude::*;

use gmailctrl::download::{self, writer, DownloadOptions, OutcomeStatus};
use gmailctrl::error::{BoxError, GmailCtrlError};
use gmailctrl::model::attachment::AttachmentDescriptor;
use gmailctrl::source::gmail;
use gmailctrl::source::payload::PayloadDirFetcher;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn attachment(n: usize) -> AttachmentDescriptor {
    AttachmentDescriptor {
        message_id: format!("m{n}"),
        attachment_id: format!("a{n}"),
        filename: Some(format!("file{n}.txt")),
        size: 4,
        sender: "alice@example.com".to_string(),
        email_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn mtime_secs(path: &Path) -> i64 {
    std::fs::metadata(path)
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

// ─── Test 1: Fixture download layout and timestamps ─────────────────

#[test]
fn test_download_layout_from_fixture() {
    let payloads = assert_fs::TempDir::new().unwrap();
    payloads.child("m1").create_dir_all().unwrap();
    payloads.child("m3").create_dir_all().unwrap();
    payloads.child("m1/A1.json").write_str(r#"{"data": "aGVsbG8"}"#).unwrap();
    payloads.child("m3/A3.json").write_str(r#"{"data": "c2Vjb25kIQ=="}"#).unwrap();
    payloads.child("m3/A4").write_binary(b"jpg").unwrap();

    let out = assert_fs::TempDir::new().unwrap();
    let attachments = gmail::load_attachments(&fixture("inbox.json")).unwrap();
    assert_eq!(attachments.len(), 3);

    let mut fetcher = PayloadDirFetcher::new(payloads.path());
    let report = download::run(
        &attachments,
        out.path(),
        &mut fetcher,
        &DownloadOptions::default(),
        None,
    )
    .unwrap();

    let invoice = out.child("a@x.com/2024-01-01 - invoice.pdf");
    invoice.assert("hello");
    out.child("a@x.com/2024-01-03 - invoice.pdf").assert("second!");
    out.child("a@x.com/2024-01-03 - photo.jpg").assert("jpg");

    let jan1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    assert_eq!(mtime_secs(invoice.path()), jan1.timestamp());

    let summary = &report.summary["a@x.com"];
    assert_eq!(summary.files_written, 3);
    assert_eq!(summary.total_bytes, 5 + 7 + 3);
    assert_eq!(report.total_bytes(), 15);
}

// ─── Test 2: Re-running skips existing files ────────────────────────

#[test]
fn test_rerun_is_idempotent() {
    let out = assert_fs::TempDir::new().unwrap();
    let list: Vec<_> = (1..=3).map(attachment).collect();
    let mut fetch =
        |m: &str, _: &str| -> Result<Vec<u8>, BoxError> { Ok(m.as_bytes().to_vec()) };
    let options = DownloadOptions::default();

    let first = download::run(&list, out.path(), &mut fetch, &options, None).unwrap();
    assert_eq!(first.files_written(), 3);

    let second = download::run(&list, out.path(), &mut fetch, &options, None).unwrap();
    assert_eq!(second.files_written(), 0);
    assert!(second
        .outcomes
        .iter()
        .all(|o| o.status == OutcomeStatus::SkippedExisting));

    let entries = std::fs::read_dir(out.child("alice@example.com").path()).unwrap().count();
    assert_eq!(entries, 3);
}

// ─── Test 3: Fail-fast on the third fetch ───────────────────────────

#[test]
fn test_fail_fast_keeps_partial_report() {
    let out = assert_fs::TempDir::new().unwrap();
    let list: Vec<_> = (1..=5).map(attachment).collect();
    let calls = RefCell::new(Vec::new());
    let mut fetch = |m: &str, _: &str| -> Result<Vec<u8>, BoxError> {
        calls.borrow_mut().push(m.to_string());
        if m == "m3" {
            Err("quota exceeded".into())
        } else {
            Ok(b"data".to_vec())
        }
    };

    let failure = download::run(&list, out.path(), &mut fetch, &DownloadOptions::default(), None)
        .unwrap_err();

    assert_eq!(*calls.borrow(), vec!["m1", "m2", "m3"]);
    assert_eq!(failure.report.outcomes.len(), 2);
    assert_eq!(failure.report.files_written(), 2);
    assert_eq!(failure.attachment.message_id, "m3");
    assert!(matches!(
        failure.source,
        GmailCtrlError::Fetch { ref message_id, .. } if message_id == "m3"
    ));
    assert!(failure.to_string().contains("quota exceeded"));

    let dir = out.child("alice@example.com");
    dir.child("2024-01-01 - file2.txt").assert(predicate::path::exists());
    dir.child("2024-01-01 - file3.txt").assert(predicate::path::missing());
    dir.child("2024-01-01 - file4.txt").assert(predicate::path::missing());
}

// ─── Test 4: Blocked sender directory aborts the run ────────────────

#[test]
fn test_directory_error_aborts() {
    let out = assert_fs::TempDir::new().unwrap();
    out.child("alice@example.com").write_str("not a directory").unwrap();

    let mut fetch = |_: &str, _: &str| -> Result<Vec<u8>, BoxError> { Ok(b"x".to_vec()) };
    let options = DownloadOptions::default();
    let failure =
        download::run(&[attachment(1)], out.path(), &mut fetch, &options, None).unwrap_err();

    assert!(failure.report.outcomes.is_empty());
    assert!(matches!(failure.source, GmailCtrlError::Filesystem { .. }));
}

// ─── Test 5: Failed writes leave no trace ───────────────────────────

struct BrokenPipe;

impl std::io::Read for BrokenPipe {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stream cut"))
    }
}

#[test]
fn test_atomic_write_failure() {
    let dir = assert_fs::TempDir::new().unwrap();
    let err = writer::write_from(dir.path(), "2024-01-01 - big.zip", BrokenPipe).unwrap_err();
    assert!(matches!(err, GmailCtrlError::Write { .. }));

    dir.child("2024-01-01 - big.zip").assert(predicate::path::missing());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ─── Test 6: Missing filenames get a synthetic name ─────────────────

#[test]
fn test_synthetic_filename() {
    let out = assert_fs::TempDir::new().unwrap();
    let mut att = attachment(7);
    att.filename = None;
    let mut fetch = |_: &str, _: &str| -> Result<Vec<u8>, BoxError> { Ok(vec![1, 2, 3]) };

    let options = DownloadOptions::default();
    let report = download::run(&[att], out.path(), &mut fetch, &options, None).unwrap();
    assert!(report.outcomes[0]
        .path
        .ends_with("alice@example.com/2024-01-01 - attachment-m7-a7.bin"));
    assert_eq!(report.outcomes[0].bytes, 3);
}

// ─── Test 7: Overlong filenames do not abort the run ────────────────

#[test]
fn test_overlong_filename_is_shortened() {
    let out = assert_fs::TempDir::new().unwrap();
    let mut long = attachment(1);
    long.filename = Some(format!("{}.pdf", "x".repeat(300)));
    let mut ok = attachment(2);
    ok.filename = Some("ok.pdf".to_string());
    let mut fetch = |_: &str, _: &str| -> Result<Vec<u8>, BoxError> { Ok(b"pdf".to_vec()) };

    let options = DownloadOptions::default();
    let report = download::run(&[long, ok], out.path(), &mut fetch, &options, None).unwrap();

    assert_eq!(report.files_written(), 2);
    let saved = report.outcomes[0].path.file_name().unwrap().to_str().unwrap();
    assert!(saved.len() < 255);
    assert!(saved.starts_with("2024-01-01 - xxx"));
    assert!(saved.ends_with(".pdf"));
    out.child("alice@example.com/2024-01-01 - ok.pdf").assert("pdf");
}

// ─── Test 8: A name claimed mid-download surfaces as a write error ──

#[test]
fn test_write_conflict_aborts_with_write_error() {
    let out = assert_fs::TempDir::new().unwrap();
    let target = out.child("alice@example.com/2024-01-01 - file1.txt");
    let list: Vec<_> = (1..=2).map(attachment).collect();
    out.child("alice@example.com").create_dir_all().unwrap();

    // Another process creates the resolved name while the payload is in flight.
    let mut fetch = |_: &str, _: &str| -> Result<Vec<u8>, BoxError> {
        std::fs::write(target.path(), "theirs")?;
        Ok(b"ours".to_vec())
    };

    let options = DownloadOptions::default();
    let failure = download::run(&list, out.path(), &mut fetch, &options, None).unwrap_err();

    assert!(failure.report.outcomes.is_empty());
    assert_eq!(failure.attachment.message_id, "m1");
    assert!(matches!(failure.source, GmailCtrlError::Write { .. }));
    target.assert("theirs");
    // Neither the second attachment nor a leftover temp file
    let entries = std::fs::read_dir(out.child("alice@example.com").path()).unwrap().count();
    assert_eq!(entries, 1);
}
