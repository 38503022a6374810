//! Stamp committed files with their email's logical date.

use std::fs::{FileTimes, OpenOptions};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

use crate::error::{GmailCtrlError, Result};

/// Set the access and modification time of `path` to `date`.
///
/// Where the platform supports it (Windows, macOS) the creation time is set
/// as well. The full instant is used; sources that only know a calendar day
/// supply midnight UTC.
pub fn apply(path: &Path, date: DateTime<Utc>) -> Result<()> {
    let time = to_system_time(date);
    let times = FileTimes::new().set_accessed(time).set_modified(time);

    #[cfg(windows)]
    let times = {
        use std::os::windows::fs::FileTimesExt;
        times.set_created(time)
    };
    #[cfg(target_os = "macos")]
    let times = {
        use std::os::macos::fs::FileTimesExt;
        times.set_created(time)
    };

    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| GmailCtrlError::io(path, e))?;
    file.set_times(times)
        .map_err(|e| GmailCtrlError::io(path, e))
}

fn to_system_time(date: DateTime<Utc>) -> SystemTime {
    let secs = date.timestamp();
    let nanos = date.timestamp_subsec_nanos();
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs.unsigned_abs(), nanos)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
            + Duration::from_nanos(u64::from(nanos))
    }
}
