//! Utility functions for time display, string truncation, and file system checks.
//!
//! - Rendering the snapshot timestamp for the display layer
//! - String truncation for logging provider responses
//! - File system validation for the data directory

use chrono::{DateTime, FixedOffset, Utc};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Seconds east of UTC for the display timezone (China Standard Time).
const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

/// Milliseconds since the Unix epoch, now.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render an epoch-millisecond timestamp as `YYYY/M/D HH:MM:SS` in UTC+8.
///
/// Out-of-range timestamps render as an empty string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_update_time(1_760_000_000_000), "2025/10/9 16:53:20");
/// ```
pub fn format_update_time(millis: i64) -> String {
    let Some(offset) = FixedOffset::east_opt(DISPLAY_OFFSET_SECS) else {
        return String::new();
    };
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc
            .with_timezone(&offset)
            .format("%Y/%-m/%-d %H:%M:%S")
            .to_string(),
        None => String::new(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and a byte
/// count indicator appended. The cut always lands on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, a file in the way).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Data directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_update_time() {
        assert_eq!(format_update_time(1_760_000_000_000), "2025/10/9 16:53:20");
        // 16:30 UTC on New Year's Eve is already the next day in UTC+8.
        assert_eq!(format_update_time(1_704_040_200_000), "2024/1/1 00:30:00");
        assert_eq!(format_update_time(i64::MAX), "");
    }

    #[test]
    fn test_now_millis_is_milliseconds() {
        let now = now_millis();
        assert!(now > 1_700_000_000_000);
        assert!(now < 10_000_000_000_000);
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
        assert_eq!(truncate_for_log(s, 13), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        assert_eq!(truncate_for_log("机器之心报道", 2), "机器…(+12 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());

        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        assert!(ensure_writable_dir(blocker.to_str().unwrap()).await.is_err());
    }
}
