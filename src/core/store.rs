//! core::store
//!
//! The version store: owner of every directory and pointer file in a pool.
//!
//! # Architecture
//!
//! [`VersionStore`] is the only component that creates or removes
//! directories under the pool. Commit logs are owned by
//! [`CommitLog`](super::commit_log::CommitLog); everything else on disk
//! (volumes, working trees, snapshots, active pointers, the running point)
//! goes through here.
//!
//! The store holds no cached state. Every call reads the filesystem, so two
//! handles on the same pool always agree.
//!
//! # Active pointers
//!
//! - `current_volume.json` names the active volume of the pool
//! - `<volume>/current_branch.json` names the volume's active branch; a
//!   missing file means `master`
//!
//! # Example
//!
//! ```no_run
//! use dvol::core::paths::PoolPaths;
//! use dvol::core::store::VersionStore;
//! use dvol::core::types::VolumeName;
//!
//! let store = VersionStore::new(PoolPaths::new("/var/lib/dvol/volumes"));
//! let volume = VolumeName::new("mysql").unwrap();
//!
//! store.create_volume(&volume).unwrap();
//! assert!(store.volume_exists(&volume));
//! assert_eq!(store.active_volume().unwrap().as_deref(), Some("mysql"));
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fsops::{self, CopyError};
use super::paths::PoolPaths;
use super::types::{BranchName, CommitId, VolumeName};

/// Errors from version store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("volume {0} already exists")]
    VolumeExists(VolumeName),

    #[error("branch {0} already exists")]
    BranchExists(BranchName),

    #[error("{action} '{path}' failed: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("pointer file '{path}' is corrupt: {message}")]
    Pointer { path: PathBuf, message: String },

    #[error(transparent)]
    Copy(#[from] CopyError),
}

impl StoreError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CurrentVolume {
    current_volume: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CurrentBranch {
    current_branch: BranchName,
}

/// Filesystem-backed store of volumes, branches and commits.
#[derive(Debug, Clone)]
pub struct VersionStore {
    paths: PoolPaths,
}

impl VersionStore {
    pub fn new(paths: PoolPaths) -> Self {
        Self { paths }
    }

    /// Path routing for this store's pool.
    pub fn paths(&self) -> &PoolPaths {
        &self.paths
    }

    // =========================================================================
    // Volumes
    // =========================================================================

    /// Create a volume with an empty `master` branch and make it active.
    ///
    /// # Errors
    ///
    /// `StoreError::VolumeExists` if the volume directory is already there;
    /// nothing is touched in that case.
    pub fn create_volume(&self, volume: &VolumeName) -> Result<(), StoreError> {
        let dir = self.paths.volume_dir(volume);
        if dir.exists() {
            return Err(StoreError::VolumeExists(volume.clone()));
        }

        fs::create_dir_all(self.paths.root())
            .map_err(|e| StoreError::io("create pool", self.paths.root(), e))?;
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => StoreError::VolumeExists(volume.clone()),
            _ => StoreError::io("create volume", &dir, e),
        })?;

        self.create_branch_dir(volume, &BranchName::master())?;
        self.set_active_volume(volume)?;
        debug!("created volume {}", volume);
        Ok(())
    }

    pub fn volume_exists(&self, volume: &VolumeName) -> bool {
        self.paths.volume_dir(volume).is_dir()
    }

    /// All volumes in the pool, sorted. A missing pool has no volumes.
    pub fn list_volumes(&self) -> Result<Vec<VolumeName>, StoreError> {
        let mut volumes: Vec<VolumeName> = list_dirs(self.paths.root())?
            .into_iter()
            .filter_map(|name| match VolumeName::new(name.as_str()) {
                Ok(volume) => Some(volume),
                Err(e) => {
                    debug!("skipping pool entry {}: {}", name, e);
                    None
                }
            })
            .collect();
        volumes.sort();
        Ok(volumes)
    }

    /// Delete a volume and everything in it.
    pub fn remove_volume(&self, volume: &VolumeName) -> Result<(), StoreError> {
        let dir = self.paths.volume_dir(volume);
        fsops::remove_tree(&dir).map_err(|e| StoreError::io("remove volume", &dir, e))
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Create a branch's working tree with world-writable permissions.
    ///
    /// Containers may run as non-root users and must be able to write into
    /// the bind-mounted tree.
    pub fn create_branch_dir(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
    ) -> Result<(), StoreError> {
        let dir = self.paths.branch_dir(volume, branch);
        if dir.exists() {
            return Err(StoreError::BranchExists(branch.clone()));
        }
        fs::create_dir_all(&dir).map_err(|e| StoreError::io("create branch", &dir, e))?;
        fsops::make_world_writable(&dir).map_err(|e| StoreError::io("chmod", &dir, e))
    }

    pub fn branch_exists(&self, volume: &VolumeName, branch: &BranchName) -> bool {
        self.paths.branch_dir(volume, branch).is_dir()
    }

    /// All branches of a volume, sorted.
    pub fn list_branches(&self, volume: &VolumeName) -> Result<Vec<BranchName>, StoreError> {
        let mut branches: Vec<BranchName> = list_dirs(&self.paths.branches_dir(volume))?
            .into_iter()
            .filter_map(|name| BranchName::new(name).ok())
            .collect();
        branches.sort();
        Ok(branches)
    }

    /// Delete a branch's working tree. The commit log is not touched.
    pub fn remove_branch_dir(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
    ) -> Result<(), StoreError> {
        let dir = self.paths.branch_dir(volume, branch);
        fsops::remove_tree(&dir).map_err(|e| StoreError::io("remove branch", &dir, e))
    }

    // =========================================================================
    // Active pointers
    // =========================================================================

    /// The raw active volume name, if a pointer has been written.
    ///
    /// The name is not checked against the pool; the volume may have been
    /// removed since it was made active.
    pub fn active_volume(&self) -> Result<Option<String>, StoreError> {
        let path = self.paths.current_volume_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io("read", &path, e)),
        };
        let pointer: CurrentVolume =
            serde_json::from_str(&contents).map_err(|e| StoreError::Pointer {
                path,
                message: e.to_string(),
            })?;
        Ok(Some(pointer.current_volume))
    }

    pub fn set_active_volume(&self, volume: &VolumeName) -> Result<(), StoreError> {
        let pointer = CurrentVolume {
            current_volume: volume.to_string(),
        };
        self.write_pointer(&self.paths.current_volume_path(), &pointer)
    }

    /// The active branch of a volume, `master` if none was ever recorded.
    pub fn active_branch(&self, volume: &VolumeName) -> Result<BranchName, StoreError> {
        let path = self.paths.current_branch_path(volume);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BranchName::master()),
            Err(e) => return Err(StoreError::io("read", &path, e)),
        };
        let pointer: CurrentBranch =
            serde_json::from_str(&contents).map_err(|e| StoreError::Pointer {
                path,
                message: e.to_string(),
            })?;
        Ok(pointer.current_branch)
    }

    pub fn set_active_branch(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
    ) -> Result<(), StoreError> {
        let pointer = CurrentBranch {
            current_branch: branch.clone(),
        };
        self.write_pointer(&self.paths.current_branch_path(volume), &pointer)
    }

    fn write_pointer<T: Serialize>(&self, path: &Path, pointer: &T) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(pointer).map_err(|e| StoreError::Pointer {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fsops::write_atomic(path, &contents).map_err(|e| StoreError::io("write", path, e))
    }

    // =========================================================================
    // Running point
    // =========================================================================

    /// Path of the volume's running point (the stable mount target).
    pub fn running_point(&self, volume: &VolumeName) -> PathBuf {
        self.paths.running_point(volume)
    }

    /// Point the running point at the active branch's working tree.
    ///
    /// Returns the running point path.
    pub fn update_running_point(&self, volume: &VolumeName) -> Result<PathBuf, StoreError> {
        let branch = self.active_branch(volume)?;
        let target = self.paths.branch_dir(volume, &branch);
        let link = self.paths.running_point(volume);

        if fs::symlink_metadata(&link).is_ok() {
            fs::remove_file(&link).map_err(|e| StoreError::io("remove", &link, e))?;
        }
        symlink_dir(&target, &link).map_err(|e| StoreError::io("symlink", &link, e))?;
        debug!("{} -> {}", link.display(), target.display());
        Ok(link)
    }

    // =========================================================================
    // Commits
    // =========================================================================

    pub fn commit_exists(&self, volume: &VolumeName, commit: &CommitId) -> bool {
        self.paths.commit_dir(volume, commit).is_dir()
    }

    /// Copy a branch's working tree into a new commit directory.
    ///
    /// Fails if the commit directory already exists. A failed copy leaves
    /// no commit directory behind.
    pub fn snapshot(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
        commit: &CommitId,
    ) -> Result<(), StoreError> {
        let commits_dir = self.paths.commits_dir(volume);
        fs::create_dir_all(&commits_dir)
            .map_err(|e| StoreError::io("create commits", &commits_dir, e))?;

        let from = self.paths.branch_dir(volume, branch);
        let to = self.paths.commit_dir(volume, commit);
        fsops::copy_tree(&from, &to)?;
        if let Err(e) = fsops::make_world_writable(&to) {
            let _ = fsops::remove_tree(&to);
            return Err(StoreError::io("chmod", &to, e));
        }
        Ok(())
    }

    /// Replace a branch's working tree with a copy of a commit.
    pub fn restore(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
        commit: &CommitId,
    ) -> Result<(), StoreError> {
        let tree = self.paths.branch_dir(volume, branch);
        fsops::remove_tree(&tree).map_err(|e| StoreError::io("remove branch", &tree, e))?;
        self.populate_branch(volume, branch, commit)
    }

    /// Create a branch's working tree as a copy of a commit.
    pub fn populate_branch(
        &self,
        volume: &VolumeName,
        branch: &BranchName,
        commit: &CommitId,
    ) -> Result<(), StoreError> {
        let from = self.paths.commit_dir(volume, commit);
        let to = self.paths.branch_dir(volume, branch);
        fsops::copy_tree(&from, &to)?;
        fsops::make_world_writable(&to).map_err(|e| StoreError::io("chmod", &to, e))
    }

    /// Physically delete a commit's snapshot.
    pub fn remove_commit(&self, volume: &VolumeName, commit: &CommitId) -> Result<(), StoreError> {
        let dir = self.paths.commit_dir(volume, commit);
        fsops::remove_tree(&dir).map_err(|e| StoreError::io("remove commit", &dir, e))
    }
}

/// Names of the subdirectories of `dir`. A missing `dir` has none.
fn list_dirs(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io("list", dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io("list", dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| StoreError::io("stat", &entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink_dir(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "running points require symlink support",
    ))
}
