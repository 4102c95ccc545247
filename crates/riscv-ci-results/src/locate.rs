//! Log file discovery.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ResultsError, ResultsResult};

/// File extension of test logs.
pub const LOG_EXTENSION: &str = "log";

/// Fail unless `dir` exists and is a directory.
pub fn check_dir_exists(dir: &Path) -> ResultsResult<()> {
    if !dir.exists() {
        return Err(ResultsError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(ResultsError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// List `*.log` files directly inside `dir`, sorted by path.
///
/// Subdirectories are not searched. An empty directory yields an empty list.
pub fn locate_logs(dir: &Path) -> ResultsResult<Vec<PathBuf>> {
    check_dir_exists(dir)?;

    let mut logs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION) {
            logs.push(path.to_path_buf());
        }
    }
    logs.sort();

    debug!(dir = %dir.display(), count = logs.len(), "located log files");
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["c.log", "a.log", "b.txt", "B.log", "log", "d.log.bak"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.log")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/e.log"), "").unwrap();

        let logs = locate_logs(dir.path()).unwrap();
        let names: Vec<_> = logs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["B.log", "a.log", "c.log"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(locate_logs(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        match locate_logs(&missing) {
            Err(ResultsError::DirectoryNotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected DirectoryNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_file_instead_of_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            locate_logs(&file),
            Err(ResultsError::NotADirectory { .. })
        ));
    }
}
