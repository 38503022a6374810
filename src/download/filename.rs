//! Path-safe names and collision-free filename resolution.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{GmailCtrlError, Result};

/// Name used when a filename sanitizes down to nothing.
pub const UNNAMED_ATTACHMENT: &str = "unnamed_attachment";

/// Directory used when a sender address sanitizes down to nothing.
pub const UNKNOWN_SENDER_DIR: &str = "unknown";

/// Longest sanitized name, in bytes, before the date prefix and any `-N`.
///
/// Keeps `"YYYY-MM-DD - " + name + "-N"` under the common 255-byte limit.
pub const MAX_NAME_BYTES: usize = 200;

/// Replace characters that are invalid in file or directory names with `_`.
///
/// Covers `< > : " / \ | ? *` and control characters, which are rejected
/// on at least one of Windows, macOS, or Linux.
pub fn sanitize_for_path(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Directory name for a sender's attachments.
pub fn sender_dir_name(sender: &str) -> String {
    path_component(sender).unwrap_or_else(|| UNKNOWN_SENDER_DIR.to_string())
}

/// The date-prefixed candidate name: `"{YYYY-MM-DD} - {name}"`.
///
/// This is the name an attachment gets when nothing collides with it.
pub fn dated_name(desired: &str, date: DateTime<Utc>) -> String {
    let name = path_component(desired).unwrap_or_else(|| UNNAMED_ATTACHMENT.to_string());
    format!("{} - {name}", date.format("%Y-%m-%d"))
}

/// Resolve a name in `dir` that no existing entry uses.
///
/// Starts from [`dated_name`]; if taken, probes `stem-1.ext`, `stem-2.ext`, …
/// until a free name is found. The check is not atomic against other
/// processes writing to the same directory.
pub fn resolve(dir: &Path, desired: &str, date: DateTime<Utc>) -> Result<String> {
    let candidate = dated_name(desired, date);
    if !is_taken(dir, &candidate)? {
        return Ok(candidate);
    }

    let (stem, ext) = split_extension(&candidate);
    let mut counter: u64 = 1;
    loop {
        let probe = match ext {
            Some(ext) => format!("{stem}-{counter}.{ext}"),
            None => format!("{stem}-{counter}"),
        };
        if !is_taken(dir, &probe)? {
            return Ok(probe);
        }
        counter += 1;
    }
}

/// Whether `dir/name` exists (file, directory, or dangling symlink).
pub fn is_taken(dir: &Path, name: &str) -> Result<bool> {
    let path = dir.join(name);
    match std::fs::symlink_metadata(&path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(GmailCtrlError::io(path, e)),
    }
}

/// Sanitize into a single path component; `None` if nothing usable remains.
fn path_component(raw: &str) -> Option<String> {
    let sanitized = truncate_name(&sanitize_for_path(raw), MAX_NAME_BYTES);
    match sanitized.as_str() {
        "" | "." | ".." => None,
        _ => Some(sanitized),
    }
}

/// Shorten `name` to at most `max` bytes, keeping a short extension.
fn truncate_name(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    match split_extension(name) {
        (stem, Some(ext)) if ext.len() + 1 < max / 2 => {
            let stem = floor_char_boundary(stem, max - ext.len() - 1).trim_end();
            format!("{stem}.{ext}")
        }
        _ => floor_char_boundary(name, max).trim_end().to_string(),
    }
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Split `"name.ext"` into `("name", Some("ext"))`, using the last dot.
///
/// A leading dot does not start an extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_sanitize_for_path() {
        assert_eq!(sanitize_for_path("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_for_path("tab\there"), "tab_here");
        assert_eq!(sanitize_for_path("alice@example.com"), "alice@example.com");
    }

    #[test]
    fn test_sender_dir_name() {
        assert_eq!(sender_dir_name("alice@example.com"), "alice@example.com");
        assert_eq!(sender_dir_name(".."), UNKNOWN_SENDER_DIR);
        assert_eq!(sender_dir_name(""), UNKNOWN_SENDER_DIR);
    }

    #[test]
    fn test_dated_name() {
        assert_eq!(dated_name("report.pdf", jan1()), "2024-01-01 - report.pdf");
        assert_eq!(dated_name("../x", jan1()), "2024-01-01 - .._x");
        assert_eq!(dated_name("", jan1()), "2024-01-01 - unnamed_attachment");
    }

    #[test]
    fn test_long_names_are_capped() {
        let long = format!("{}.pdf", "x".repeat(300));
        let name = dated_name(&long, jan1());
        assert_eq!(name.len(), "2024-01-01 - ".len() + MAX_NAME_BYTES);
        assert!(name.ends_with("x.pdf"));

        // Multi-byte characters are never split
        let accented = format!("{}.txt", "é".repeat(150));
        let name = dated_name(&accented, jan1());
        assert!(name.len() <= "2024-01-01 - ".len() + MAX_NAME_BYTES);
        assert!(name.ends_with("é.txt"));

        let no_ext = "y".repeat(260);
        assert_eq!(sender_dir_name(&no_ext).len(), MAX_NAME_BYTES);
    }

    #[test]
    fn test_long_name_resolves_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let long = format!("{}.pdf", "x".repeat(300));
        std::fs::write(dir.path().join(dated_name(&long, jan1())), b"1").unwrap();

        let name = resolve(dir.path(), &long, jan1()).unwrap();
        assert!(name.ends_with("x-1.pdf"));
        std::fs::write(dir.path().join(&name), b"2").unwrap();
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a - report.pdf"), ("a - report", Some("pdf")));
        assert_eq!(split_extension("a - archive.tar.gz"), ("a - archive.tar", Some("gz")));
        assert_eq!(split_extension("a - README"), ("a - README", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
    }

    #[test]
    fn test_resolve_probes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = resolve(dir.path(), "report.pdf", jan1()).unwrap();
        assert_eq!(first, "2024-01-01 - report.pdf");
        std::fs::write(dir.path().join(&first), b"1").unwrap();

        let second = resolve(dir.path(), "report.pdf", jan1()).unwrap();
        assert_eq!(second, "2024-01-01 - report-1.pdf");
        std::fs::write(dir.path().join(&second), b"2").unwrap();

        let third = resolve(dir.path(), "report.pdf", jan1()).unwrap();
        assert_eq!(third, "2024-01-01 - report-2.pdf");
    }

    #[test]
    fn test_resolve_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2024-01-01 - notes"), b"").unwrap();
        assert_eq!(
            resolve(dir.path(), "notes", jan1()).unwrap(),
            "2024-01-01 - notes-1"
        );
    }

    #[test]
    fn test_resolve_treats_directory_as_taken() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2024-01-01 - x.txt")).unwrap();
        assert_eq!(
            resolve(dir.path(), "x.txt", jan1()).unwrap(),
            "2024-01-01 - x-1.txt"
        );
    }

    #[test]
    fn test_resolve_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-yet");
        assert_eq!(
            resolve(&missing, "a.txt", jan1()).unwrap(),
            "2024-01-01 - a.txt"
        );
    }
}
