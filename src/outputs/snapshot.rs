//! Atomic snapshot persistence.
//!
//! The snapshot is written to a temporary sibling file, flushed to disk, and
//! then renamed over the live file. Rename within one directory is atomic, so
//! a reader sees either the previous complete snapshot or the new complete
//! snapshot, never a partial one. A crash before the rename leaves the
//! previous snapshot untouched; the stale temporary file is overwritten by
//! the next run.
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! └── latest.json
//! ```

use crate::models::Snapshot;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// File name of the live snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "latest.json";

/// Path of the live snapshot in `data_dir`.
pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

/// Path of the in-progress snapshot in `data_dir`.
pub fn temp_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{SNAPSHOT_FILE}.tmp"))
}

/// Serialize `snapshot` and atomically replace `<data_dir>/latest.json`.
///
/// # Returns
///
/// The path of the written snapshot, or an error if the directory cannot be
/// created or the file cannot be written or renamed.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display()))]
pub async fn write_snapshot(
    snapshot: &Snapshot,
    data_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    if let Err(e) = fs::create_dir_all(data_dir).await {
        error!(error = %e, "Failed to create data dir");
        return Err(e.into());
    }

    let tmp = temp_path(data_dir);
    let live = snapshot_path(data_dir);

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(json.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, &live).await {
        error!(tmp = %tmp.display(), path = %live.display(), error = %e, "Failed to move snapshot into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!(path = %live.display(), bytes = json.len(), "Wrote snapshot");
    Ok(live)
}
