//! Copies classified logs into per-result bucket directories.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ResultsError, ResultsResult};
use crate::result::{LogRecord, ResultKind};

/// Bucket directory for `kind` under `output_root`.
pub fn bucket_dir(output_root: &Path, kind: ResultKind) -> PathBuf {
    output_root.join(kind.as_str())
}

/// Copy the record's log into `<output_root>/<result>/`.
///
/// The bucket is created if needed; an existing bucket is reused. The copy
/// keeps the source permissions and access/modification times. A file of
/// the same name already in the bucket is overwritten.
///
/// Returns the path of the copy.
pub fn archive_log(record: &LogRecord, output_root: &Path) -> ResultsResult<PathBuf> {
    let bucket = bucket_dir(output_root, record.result);
    fs::create_dir_all(&bucket).map_err(|e| ResultsError::io(&bucket, e))?;

    let file_name = record
        .source_path
        .file_name()
        .ok_or_else(|| ResultsError::NotAFile {
            path: record.source_path.clone(),
        })?;
    let dest = bucket.join(file_name);

    // Source times are read before copying, which may bump the atime.
    let times = source_times(&record.source_path)?;
    // A read-only copy left by an earlier run cannot be opened for writing.
    if dest.exists() {
        fs::remove_file(&dest).map_err(|e| ResultsError::io(&dest, e))?;
    }
    fs::copy(&record.source_path, &dest).map_err(|e| ResultsError::io(&record.source_path, e))?;
    // The copy may already be read-only; setting times needs ownership only.
    let copy = File::open(&dest).map_err(|e| ResultsError::io(&dest, e))?;
    copy.set_times(times).map_err(|e| ResultsError::io(&dest, e))?;

    debug!(
        src = %record.source_path.display(),
        dest = %dest.display(),
        "archived log"
    );
    Ok(dest)
}

fn source_times(src: &Path) -> ResultsResult<FileTimes> {
    let meta = fs::metadata(src).map_err(|e| ResultsError::io(src, e))?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    Ok(times)
}
