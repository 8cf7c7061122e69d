//! core::paths
//!
//! Centralized path routing for the volume pool.
//!
//! # Storage Layout
//!
//! ```text
//! <pool>/current_volume.json                 {"current_volume": <name>}
//! <pool>/config.toml                         configuration
//! <pool>/<volume>/current_branch.json        {"current_branch": <name>}
//! <pool>/<volume>/branches/<branch>/         working tree (mutable)
//! <pool>/<volume>/branches/<branch>.json     commit log
//! <pool>/<volume>/commits/<commit>/          immutable snapshot
//! <pool>/<volume>/running_point              symlink to the active branch's tree
//! ```
//!
//! This layout is shared with existing pools and must not change.
//!
//! **Hard rule:** no code outside this module joins path components onto the
//! pool root. Everything goes through [`PoolPaths`], which only accepts
//! validated names.
//!
//! # Example
//!
//! ```
//! use dvol::core::paths::PoolPaths;
//! use dvol::core::types::{BranchName, VolumeName};
//! use std::path::PathBuf;
//!
//! let paths = PoolPaths::new("/var/lib/dvol/volumes");
//! let volume = VolumeName::new("foo").unwrap();
//!
//! assert_eq!(
//!     paths.branch_dir(&volume, &BranchName::master()),
//!     PathBuf::from("/var/lib/dvol/volumes/foo/branches/master")
//! );
//! ```

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use super::types::{BranchName, CommitId, VolumeName};

/// Default pool location.
pub const DEFAULT_POOL: &str = "/var/lib/dvol/volumes";

/// Anchor a pool location given on the command line to the current directory.
///
/// Running-point symlinks and container bind sources store the pool path
/// verbatim, so it must never be relative.
pub fn absolute_pool(pool: &Path) -> io::Result<PathBuf> {
    if pool.is_absolute() {
        Ok(pool.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(pool))
    }
}

/// Path routing for one pool directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolPaths {
    root: PathBuf,
}

impl PoolPaths {
    /// Create path routing for the pool at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The pool root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Pool-scoped paths
    // =========================================================================

    /// `<pool>/current_volume.json`
    pub fn current_volume_path(&self) -> PathBuf {
        self.root.join("current_volume.json")
    }

    /// `<pool>/config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    // =========================================================================
    // Volume-scoped paths
    // =========================================================================

    /// `<pool>/<volume>`
    pub fn volume_dir(&self, volume: &VolumeName) -> PathBuf {
        self.root.join(volume.as_str())
    }

    /// `<pool>/<volume>/current_branch.json`
    pub fn current_branch_path(&self, volume: &VolumeName) -> PathBuf {
        self.volume_dir(volume).join("current_branch.json")
    }

    /// `<pool>/<volume>/branches`
    pub fn branches_dir(&self, volume: &VolumeName) -> PathBuf {
        self.volume_dir(volume).join("branches")
    }

    /// `<pool>/<volume>/branches/<branch>`
    pub fn branch_dir(&self, volume: &VolumeName, branch: &BranchName) -> PathBuf {
        self.branches_dir(volume).join(branch.as_str())
    }

    /// `<pool>/<volume>/branches/<branch>.json`
    pub fn branch_log_path(&self, volume: &VolumeName, branch: &BranchName) -> PathBuf {
        self.branches_dir(volume)
            .join(format!("{}.json", branch.as_str()))
    }

    /// `<pool>/<volume>/commits`
    pub fn commits_dir(&self, volume: &VolumeName) -> PathBuf {
        self.volume_dir(volume).join("commits")
    }

    /// `<pool>/<volume>/commits/<commit>`
    pub fn commit_dir(&self, volume: &VolumeName, commit: &CommitId) -> PathBuf {
        self.commits_dir(volume).join(commit.as_str())
    }

    /// `<pool>/<volume>/running_point`
    pub fn running_point(&self, volume: &VolumeName) -> PathBuf {
        self.volume_dir(volume).join("running_point")
    }
}
