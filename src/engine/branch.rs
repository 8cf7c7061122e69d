//! engine::branch
//!
//! Branch checkout, creation, listing and deletion.
//!
//! A new branch starts as a copy of the current branch at its HEAD: the
//! current branch's log is copied by value (same commit ids) and the HEAD
//! snapshot becomes the new working tree. Uncommitted changes on the
//! current branch are not carried over.

use log::{debug, info};

use super::{Engine, EngineError};
use crate::core::resolver::resolve;
use crate::core::types::{BranchName, VolumeName};
use crate::lock::ScopedLock;

const ACTIVE_BRANCH_DELETE: &str =
    "Cannot delete active branch, use 'dvol checkout' to switch branches first";

/// What `checkout` did.
///
/// Only `Created` and `Switched` change anything; the other outcomes are
/// reported conditions, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Created(BranchName),
    Switched(BranchName),
    /// `create` was requested for a branch that exists.
    AlreadyExists(BranchName),
    /// `create` was requested but the current branch has no commits.
    NeedsCommit,
    /// Switching to a branch that doesn't exist.
    NoSuchBranch(BranchName),
}

/// What `delete_branch` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deleted, with this many snapshots collected.
    Deleted { collected: usize },
    Aborted,
}

/// A branch in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    pub name: BranchName,
    pub active: bool,
}

impl Engine {
    /// Switch `volume` to `branch`, creating it from the current HEAD when
    /// `create` is set.
    ///
    /// On success the active branch pointer and the running point both name
    /// the new branch. The running point is rewritten under the lock.
    pub fn checkout(
        &mut self,
        volume: &VolumeName,
        branch: &str,
        create: bool,
    ) -> Result<CheckoutOutcome, EngineError> {
        let branch = BranchName::new(branch)?;
        let current = self.active_branch(volume)?;

        if create {
            if self.store.branch_exists(volume, &branch) {
                return Ok(CheckoutOutcome::AlreadyExists(branch));
            }
            let log = self.commits.read(volume, &current)?;
            let head = match resolve(&log, "HEAD") {
                Ok(id) => id,
                Err(_) => return Ok(CheckoutOutcome::NeedsCommit),
            };

            self.commits.write(volume, &branch, &log)?;
            if let Err(e) = self.store.populate_branch(volume, &branch, &head) {
                if let Err(cleanup) = self.commits.remove(volume, &branch) {
                    debug!("could not remove log of failed branch {}: {}", branch, cleanup);
                }
                return Err(e.into());
            }
            info!("created branch {}/{} at {}", volume, branch, head);
        } else if !self.store.branch_exists(volume, &branch) {
            return Ok(CheckoutOutcome::NoSuchBranch(branch));
        }

        self.store.set_active_branch(volume, &branch)?;

        let guard = ScopedLock::acquire(self.lock.as_mut(), volume)?;
        let updated = self.store.update_running_point(volume);
        let released = guard.release();
        updated?;
        released?;

        Ok(if create {
            CheckoutOutcome::Created(branch)
        } else {
            CheckoutOutcome::Switched(branch)
        })
    }

    /// Branches of `volume`, sorted, with the active one marked.
    pub fn list_branches(&self, volume: &VolumeName) -> Result<Vec<BranchSummary>, EngineError> {
        let active = self.active_branch(volume)?;
        Ok(self
            .store
            .list_branches(volume)?
            .into_iter()
            .map(|name| BranchSummary {
                active: name == active,
                name,
            })
            .collect())
    }

    /// Delete a branch of `volume` and collect the snapshots only it listed.
    ///
    /// `confirm` is asked after validation and before anything is removed.
    ///
    /// # Errors
    ///
    /// - `Usage` if `branch` is the active branch
    /// - `NoSuchBranch` if it doesn't exist
    pub fn delete_branch<F>(
        &mut self,
        volume: &VolumeName,
        branch: &str,
        confirm: F,
    ) -> Result<DeleteOutcome, EngineError>
    where
        F: FnOnce(&BranchName) -> bool,
    {
        let branch = BranchName::new(branch)?;
        if self.active_branch(volume)? == branch {
            return Err(EngineError::Usage(ACTIVE_BRANCH_DELETE.to_string()));
        }
        if !self.store.branch_exists(volume, &branch) {
            return Err(EngineError::NoSuchBranch(branch));
        }
        if !confirm(&branch) {
            return Ok(DeleteOutcome::Aborted);
        }

        let log = self.commits.read(volume, &branch)?;
        self.store.remove_branch_dir(volume, &branch)?;
        self.commits.remove(volume, &branch)?;

        let referenced = self.referenced_commits(volume, None)?;
        let collected = self.collect_unreferenced(volume, &log, &referenced)?;
        info!(
            "deleted branch {}/{} ({} snapshots collected)",
            volume, branch, collected
        );
        Ok(DeleteOutcome::Deleted { collected })
    }
}
