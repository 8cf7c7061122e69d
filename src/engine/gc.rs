//! engine::gc
//!
//! Reachability of commit snapshots.
//!
//! A commit's snapshot is shared by every branch whose log lists its id. It
//! may only be deleted once no branch of the volume lists it. Logs are
//! always rewritten *before* snapshots are deleted, so an interrupted
//! collection leaves unreferenced snapshots behind, never a log entry
//! without its snapshot.

use std::collections::HashSet;

use log::debug;

use super::{Engine, EngineError};
use crate::core::types::{BranchName, Commit, CommitId, VolumeName};

impl Engine {
    /// Commit ids listed in the logs of every branch of `volume` except
    /// `except`.
    pub(super) fn referenced_commits(
        &self,
        volume: &VolumeName,
        except: Option<&BranchName>,
    ) -> Result<HashSet<CommitId>, EngineError> {
        let mut referenced = HashSet::new();
        for branch in self.store.list_branches(volume)? {
            if Some(&branch) == except {
                continue;
            }
            referenced.extend(
                self.commits
                    .read(volume, &branch)?
                    .into_iter()
                    .map(|c| c.id),
            );
        }
        Ok(referenced)
    }

    /// Delete the snapshots of `candidates` that are not in `referenced`.
    ///
    /// Returns how many snapshots were deleted.
    pub(super) fn collect_unreferenced(
        &self,
        volume: &VolumeName,
        candidates: &[Commit],
        referenced: &HashSet<CommitId>,
    ) -> Result<usize, EngineError> {
        let mut deleted = 0;
        for commit in candidates {
            if referenced.contains(&commit.id) {
                debug!("keeping {}: still referenced by another branch", commit.id);
                continue;
            }
            debug!("deleting unreferenced commit {}", commit.id);
            self.store.remove_commit(volume, &commit.id)?;
            deleted += 1;
        }
        Ok(deleted)
    }
}
