//! Atomic file commits: write to a temp file beside the target, then rename.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GmailCtrlError, Result};

/// Prefix of in-flight temp files.
///
/// Temp files live in the target directory so the final rename stays on
/// one volume. They are removed on any failure.
pub const TEMP_PREFIX: &str = ".gmailctrl-";

/// Suffix of in-flight temp files.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Write `payload` to `dir/name`, making it visible only once complete.
///
/// Returns the committed path.
pub fn write(dir: &Path, name: &str, payload: &[u8]) -> Result<PathBuf> {
    write_from(dir, name, payload)
}

/// Like [`write`], streaming the payload from a reader.
///
/// A read error mid-stream leaves no file under `name` and no temp file.
pub fn write_from(dir: &Path, name: &str, mut payload: impl Read) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| GmailCtrlError::io(dir, e))?;

    let final_path = dir.join(name);
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| GmailCtrlError::io(dir, e))?;

    // Dropping `tmp` on any early return deletes the temp file.
    let written = std::io::copy(&mut payload, &mut tmp)
        .map_err(|e| GmailCtrlError::write(&final_path, e))?;
    tmp.flush()
        .map_err(|e| GmailCtrlError::write(&final_path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| GmailCtrlError::write(&final_path, e))?;

    // Refuses to replace an entry that appeared after name resolution.
    tmp.persist_noclobber(&final_path)
        .map_err(|e| GmailCtrlError::write(&final_path, e.error))?;

    debug!(path = %final_path.display(), bytes = written, "Committed file");
    Ok(final_path)
}
