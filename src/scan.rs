use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;
use tracing::warn;

use crate::error::GiflapseResult;

/// One discovered source file. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub name: String,
    /// Milliseconds since the epoch, creation time falling back to mtime.
    pub timestamp_ms: f64,
}

/// List the directory and keep regular files whose extension is allow-listed,
/// stamped with a usable timestamp.
///
/// Per-file problems (stat failure, no usable timestamp) drop that file with a
/// warning and never fail the scan; an unreadable directory does. The result
/// is unsorted, see [`sort_frames`].
pub fn discover_images(dir: &Path, extensions: &[String]) -> GiflapseResult<Vec<SourceImage>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read source directory '{}'", dir.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if !matches_extension(&path, extensions) {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "stat failed, dropping file");
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        let Some(timestamp_ms) = file_timestamp_ms(&meta) else {
            warn!(path = %path.display(), "no usable timestamp, dropping file");
            continue;
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        found.push(SourceImage {
            path,
            name,
            timestamp_ms,
        });
    }

    Ok(found)
}

/// Stable chronological order; equal timestamps fall back to filename order.
pub fn sort_frames(mut files: Vec<SourceImage>) -> Vec<SourceImage> {
    files.sort_by(|a, b| {
        a.timestamp_ms
            .total_cmp(&b.timestamp_ms)
            .then_with(|| a.name.cmp(&b.name))
    });
    files
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

fn file_timestamp_ms(meta: &fs::Metadata) -> Option<f64> {
    pick_timestamp_ms(meta.created().ok(), meta.modified().ok())
}

/// Creation time wins when present and non-zero; a zero/unavailable pair means
/// the file carries no usable timestamp at all.
fn pick_timestamp_ms(created: Option<SystemTime>, modified: Option<SystemTime>) -> Option<f64> {
    epoch_ms(created)
        .filter(|&ms| ms > 0.0)
        .or_else(|| epoch_ms(modified).filter(|&ms| ms > 0.0))
}

fn epoch_ms(time: Option<SystemTime>) -> Option<f64> {
    let elapsed = time?.duration_since(UNIX_EPOCH).ok()?;
    Some(elapsed.as_secs_f64() * 1000.0)
}
