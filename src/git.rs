//! Git queries against a checked-out source tree.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::logging::info_box;
use crate::process::{require_in_path, run_cmd, CommandSpec, ProcessError, StdoutMode};

/// Metadata of the commit checked out in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    /// Full commit hash
    pub hash: String,
    /// First line of the commit message
    pub subject: String,
    pub author: String,
    /// Author date, ISO-8601-like (`git %ai`)
    pub author_date: String,
    /// Committer date, ISO-8601-like (`git %ci`)
    pub commit_date: String,
}

impl RevisionInfo {
    /// Human-readable lines, one per field.
    pub fn to_lines(&self) -> Vec<String> {
        vec![
            format!("Commit ID:   {}", self.hash),
            format!("Subject:     {}", self.subject),
            format!("Author:      {}", self.author),
            format!("Author date: {}", self.author_date),
            format!("Commit date: {}", self.commit_date),
        ]
    }

    /// Log the revision under a boxed `title`.
    pub fn log(&self, title: &str) {
        info_box(title);
        for line in self.to_lines() {
            info!("{}", line);
        }
    }
}

/// Git errors
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Patch file does not exist: {}", .0.display())]
    PatchNotFound(PathBuf),

    #[error("git command failed: {0}")]
    Command(#[from] ProcessError),
}

fn git_show(repo_dir: &Path, format: &str) -> Result<String, ProcessError> {
    let spec = CommandSpec::new("git", repo_dir)
        .args(["show", "-s"])
        .arg(format!("--format={}", format))
        .with_stdout(StdoutMode::Capture)
        .hide_stderr()
        .quiet();
    Ok(run_cmd(&spec)?.stdout.trim().to_string())
}

/// Read the HEAD commit metadata of `repo_dir`.
pub fn revision_info(repo_dir: &Path) -> Result<RevisionInfo, GitError> {
    if !repo_dir.is_dir() {
        return Err(GitError::DirectoryNotFound(repo_dir.to_path_buf()));
    }
    require_in_path("git")?;

    let hash = git_show(repo_dir, "%H")
        .map_err(|_| GitError::NotARepository(repo_dir.to_path_buf()))?;

    Ok(RevisionInfo {
        hash,
        subject: git_show(repo_dir, "%s")?,
        author: git_show(repo_dir, "%an")?,
        author_date: git_show(repo_dir, "%ai")?,
        commit_date: git_show(repo_dir, "%ci")?,
    })
}

/// Apply `patch_file` to the work tree in `target_dir` with `git apply`.
pub fn apply_patch(patch_file: &Path, target_dir: &Path) -> Result<(), GitError> {
    if !patch_file.is_file() {
        return Err(GitError::PatchNotFound(patch_file.to_path_buf()));
    }
    if !target_dir.is_dir() {
        return Err(GitError::DirectoryNotFound(target_dir.to_path_buf()));
    }
    let patch_file = patch_file
        .canonicalize()
        .map_err(|_| GitError::PatchNotFound(patch_file.to_path_buf()))?;

    let spec = CommandSpec::new("git", target_dir)
        .arg("apply")
        .arg(patch_file.to_string_lossy());
    run_cmd(&spec)?;
    Ok(())
}
