//! core::commit_log
//!
//! Per-branch commit logs.
//!
//! # Format
//!
//! Each branch of each volume has a JSON file at
//! `<pool>/<volume>/branches/<branch>.json` holding an array of
//! `{"id": ..., "message": ...}` objects, oldest first. A branch that has
//! never been committed to has no file, which reads as an empty log.
//!
//! # Atomicity
//!
//! Writes replace the whole file through a temp file and rename, so a
//! crash leaves either the old log or the new one.
//!
//! # Example
//!
//! ```no_run
//! use dvol::core::commit_log::CommitLog;
//! use dvol::core::paths::PoolPaths;
//! use dvol::core::types::{BranchName, Commit, CommitId, VolumeName};
//!
//! let log = CommitLog::new(PoolPaths::new("/var/lib/dvol/volumes"));
//! let volume = VolumeName::new("foo").unwrap();
//! let branch = BranchName::master();
//!
//! log.append(&volume, &branch, Commit::new(CommitId::generate(), "first"))
//!     .unwrap();
//! assert_eq!(log.read(&volume, &branch).unwrap().len(), 1);
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::fsops::write_atomic;
use super::paths::PoolPaths;
use super::types::{BranchName, Commit, VolumeName};

/// Errors from commit log operations.
#[derive(Debug, Error)]
pub enum CommitLogError {
    #[error("failed to read commit log '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("commit log '{path}' is corrupt: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to write commit log '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize commit log: {0}")]
    Serialize(String),
}

/// Access to the commit logs of a pool.
#[derive(Debug, Clone)]
pub struct CommitLog {
    paths: PoolPaths,
}

impl CommitLog {
    pub fn new(paths: PoolPaths) -> Self {
        Self { paths }
    }

    /// Read a branch's commits, oldest first.
    ///
    /// A missing log file is an empty history.
    pub fn read(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
    ) -> Result<Vec<Commit>, CommitLogError> {
        let path = self.paths.branch_log_path(volume, branch);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(CommitLogError::Read { path, source }),
        };

        serde_json::from_str(&contents).map_err(|e| CommitLogError::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Replace a branch's commits.
    pub fn write(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
        commits: &[Commit],
    ) -> Result<(), CommitLogError> {
        let path = self.paths.branch_log_path(volume, branch);
        let contents =
            serde_json::to_vec(commits).map_err(|e| CommitLogError::Serialize(e.to_string()))?;
        write_atomic(&path, &contents).map_err(|source| CommitLogError::Write { path, source })
    }

    /// Append one commit to the end of a branch's log.
    pub fn append(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
        commit: Commit,
    ) -> Result<(), CommitLogError> {
        let mut commits = self.read(volume, branch)?;
        commits.push(commit);
        self.write(volume, branch, &commits)
    }

    /// Delete a branch's log file, if present.
    pub fn remove(&self, volume: &VolumeName, branch: &BranchName) -> Result<(), CommitLogError> {
        let path = self.paths.branch_log_path(volume, branch);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CommitLogError::Write { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CommitId;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CommitLog, VolumeName, BranchName) {
        let temp = TempDir::new().unwrap();
        let paths = PoolPaths::new(temp.path());
        let volume = VolumeName::new("foo").unwrap();
        fs::create_dir_all(paths.branches_dir(&volume)).unwrap();
        (temp, CommitLog::new(paths), volume, BranchName::master())
    }

    fn commit(id: &str, message: &str) -> Commit {
        Commit::new(CommitId::new(id).unwrap(), message)
    }

    #[test]
    fn missing_log_is_empty() {
        let (_temp, log, volume, branch) = setup();
        assert!(log.read(&volume, &branch).unwrap().is_empty());
    }

    #[test]
    fn append_keeps_order() {
        let (_temp, log, volume, branch) = setup();
        log.append(&volume, &branch, commit("aaa", "first")).unwrap();
        log.append(&volume, &branch, commit("bbb", "second")).unwrap();

        let commits = log.read(&volume, &branch).unwrap();
        let ids: Vec<_> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["aaa", "bbb"]);
    }

    #[test]
    fn file_format_is_plain_array() {
        let (temp, log, volume, branch) = setup();
        log.write(&volume, &branch, &[commit("aaa", "hello")])
            .unwrap();

        let raw = fs::read_to_string(temp.path().join("foo/branches/master.json")).unwrap();
        assert_eq!(raw, r#"[{"id":"aaa","message":"hello"}]"#);
    }

    #[test]
    fn corrupt_log_reports_path() {
        let (temp, log, volume, branch) = setup();
        fs::write(temp.path().join("foo/branches/master.json"), "{not json").unwrap();

        let err = log.read(&volume, &branch).unwrap_err();
        assert!(matches!(err, CommitLogError::Parse { .. }));
        assert!(err.to_string().contains("master.json"));
    }

    #[test]
    fn remove_is_idempotent() {
        let (_temp, log, volume, branch) = setup();
        log.append(&volume, &branch, commit("aaa", "x")).unwrap();
        log.remove(&volume, &branch).unwrap();
        log.remove(&volume, &branch).unwrap();
        assert!(log.read(&volume, &branch).unwrap().is_empty());
    }
}
