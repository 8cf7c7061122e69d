//! engine::snapshot
//!
//! Commit, reset and log.
//!
//! # Commit
//!
//! ```text
//! validate message -> pick fresh id -> [lock] copy tree -> commits/<id> [unlock] -> append log
//! ```
//!
//! The log entry is written last, so a failed or interrupted copy never
//! leaves a logged commit without a snapshot.
//!
//! # Reset
//!
//! ```text
//! resolve ref -> [lock] replace tree with commits/<id> [unlock] -> truncate log -> collect
//! ```
//!
//! Commits after the target are dropped from the active branch's log.
//! Their snapshots are deleted unless another branch still lists them.

use log::{debug, info, warn};

use super::{Engine, EngineError};
use crate::core::resolver::resolve;
use crate::core::types::{Commit, CommitId, VolumeName};
use crate::lock::ScopedLock;

const COMMIT_MESSAGE_REQUIRED: &str = "You must provide a commit message";

const HARD_RESET_REQUIRED: &str = "Please specify --hard to confirm you intend to lose data \
     (to save your state, commit and branch, then come back to reset)";

impl Engine {
    /// Snapshot the active branch of `volume`.
    ///
    /// # Errors
    ///
    /// - `Usage` if `message` is missing or blank
    /// - `CommitCollision` if the generated id is already taken
    /// - storage errors if the copy or the log write fails; nothing is
    ///   recorded in that case
    pub fn commit(
        &mut self,
        volume: &VolumeName,
        message: Option<&str>,
    ) -> Result<CommitId, EngineError> {
        let message = match message {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => return Err(EngineError::Usage(COMMIT_MESSAGE_REQUIRED.to_string())),
        };
        let branch = self.active_branch(volume)?;

        let id = (self.next_commit_id)();
        if self.store.commit_exists(volume, &id) {
            return Err(EngineError::CommitCollision(id));
        }

        let guard = ScopedLock::acquire(self.lock.as_mut(), volume)?;
        let copied = self.store.snapshot(volume, &branch, &id);
        let released = guard.release();
        copied?;

        if let Err(e) = released {
            self.discard_snapshot(volume, &id);
            return Err(e.into());
        }
        if let Err(e) = self
            .commits
            .append(volume, &branch, Commit::new(id.clone(), message))
        {
            self.discard_snapshot(volume, &id);
            return Err(e.into());
        }

        info!("committed {} on {}/{}", id, volume, branch);
        Ok(id)
    }

    fn discard_snapshot(&self, volume: &VolumeName, id: &CommitId) {
        if let Err(e) = self.store.remove_commit(volume, id) {
            warn!("could not remove unrecorded commit {}: {}", id, e);
        }
    }

    /// Roll the active branch of `volume` back to `reference`.
    ///
    /// `hard` must be true: a reset always destroys the working tree.
    ///
    /// # Errors
    ///
    /// - `Usage` without `hard`
    /// - `MalformedReference` for `HEAD` followed by anything but carets
    /// - `NoSuchCommit` if the reference is out of range, is not in this
    ///   branch's log, or has no snapshot
    pub fn reset(
        &mut self,
        volume: &VolumeName,
        reference: &str,
        hard: bool,
    ) -> Result<CommitId, EngineError> {
        if !hard {
            return Err(EngineError::Usage(HARD_RESET_REQUIRED.to_string()));
        }
        let branch = self.active_branch(volume)?;
        let log = self.commits.read(volume, &branch)?;

        let id = resolve(&log, reference)?;
        let position = log
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| EngineError::NoSuchCommit(reference.to_string()))?;
        if !self.store.commit_exists(volume, &id) {
            return Err(EngineError::NoSuchCommit(reference.to_string()));
        }

        let guard = ScopedLock::acquire(self.lock.as_mut(), volume)?;
        let restored = self.store.restore(volume, &branch, &id);
        let released = guard.release();
        restored?;
        released?;

        let (kept, dropped) = log.split_at(position + 1);
        if !dropped.is_empty() {
            self.commits.write(volume, &branch, kept)?;
            let referenced = self.referenced_commits(volume, Some(&branch))?;
            let deleted = self.collect_unreferenced(volume, dropped, &referenced)?;
            debug!(
                "dropped {} commits from {}/{}, deleted {} snapshots",
                dropped.len(),
                volume,
                branch,
                deleted
            );
        }

        info!("reset {}/{} to {}", volume, branch, id);
        Ok(id)
    }

    /// Commits of the active branch of `volume`, oldest first.
    pub fn log(&self, volume: &VolumeName) -> Result<Vec<Commit>, EngineError> {
        let branch = self.active_branch(volume)?;
        Ok(self.commits.read(volume, &branch)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{engine, read, write};
    use super::*;
    use crate::core::types::BranchName;
    use crate::engine::CheckoutOutcome;

    #[test]
    fn commit_requires_message() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();

        for message in [None, Some(""), Some("   ")] {
            let err = engine.commit(&v, message).unwrap_err();
            assert!(matches!(err, EngineError::Usage(_)));
        }
        assert!(engine.log(&v).unwrap().is_empty());
    }

    #[test]
    fn commit_snapshots_and_logs() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        write(&engine, &v, "file.txt", "alpha");

        let id = engine.commit(&v, Some("hello")).unwrap();

        let snapshot = engine.store().paths().commit_dir(&v, &id).join("file.txt");
        assert_eq!(std::fs::read_to_string(snapshot).unwrap(), "alpha");
        let log = engine.log(&v).unwrap();
        assert_eq!(log, vec![Commit::new(id, "hello")]);
    }

    #[test]
    fn commit_releases_lock() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        engine.commit(&v, Some("one")).unwrap();
        assert!(!engine.lock().is_locked(&v));
    }

    #[test]
    fn failed_copy_records_nothing() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        let tree = engine.store().paths().branch_dir(&v, &BranchName::master());
        std::fs::remove_dir_all(&tree).unwrap();

        assert!(matches!(
            engine.commit(&v, Some("doomed")),
            Err(EngineError::Store(_))
        ));

        assert!(engine.log(&v).unwrap().is_empty());
        assert!(!engine.lock().is_locked(&v));
        let commits = engine.store().paths().commits_dir(&v);
        if commits.exists() {
            assert_eq!(std::fs::read_dir(&commits).unwrap().count(), 0);
        }
    }

    fn fixed_id() -> CommitId {
        CommitId::new("c0111de").unwrap()
    }

    #[test]
    fn commit_refuses_taken_id() {
        let (_temp, engine) = engine();
        let mut engine = engine.with_commit_ids(fixed_id);
        let v = engine.init_volume("foo").unwrap();
        let existing = engine.store().paths().commit_dir(&v, &fixed_id());
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("old.txt"), "old").unwrap();
        write(&engine, &v, "file.txt", "new");

        match engine.commit(&v, Some("clash")) {
            Err(EngineError::CommitCollision(id)) => assert_eq!(id, fixed_id()),
            other => panic!("expected collision, got {:?}", other),
        }

        assert!(engine.log(&v).unwrap().is_empty());
        assert!(!engine.lock().is_locked(&v));
        assert_eq!(
            std::fs::read_to_string(existing.join("old.txt")).unwrap(),
            "old"
        );
        assert!(!existing.join("file.txt").exists());
    }

    #[test]
    fn reset_requires_hard() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        engine.commit(&v, Some("one")).unwrap();
        write(&engine, &v, "file.txt", "beta");

        let err = engine.reset(&v, "HEAD", false).unwrap_err();
        assert!(err.to_string().starts_with("Please specify --hard"));
        assert_eq!(read(&engine, &v, "file.txt"), "beta");
    }

    #[test]
    fn reset_head_restores_tree() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        write(&engine, &v, "file.txt", "alpha");
        engine.commit(&v, Some("hello")).unwrap();

        write(&engine, &v, "file.txt", "beta");
        engine.reset(&v, "HEAD", true).unwrap();
        assert_eq!(read(&engine, &v, "file.txt"), "alpha");
        assert!(!engine.lock().is_locked(&v));
    }

    #[test]
    fn reset_truncates_and_collects() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        let c1 = engine.commit(&v, Some("one")).unwrap();
        let c2 = engine.commit(&v, Some("two")).unwrap();
        let c3 = engine.commit(&v, Some("three")).unwrap();

        engine.reset(&v, "HEAD^^", true).unwrap();

        let ids: Vec<_> = engine.log(&v).unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c1.clone()]);
        assert!(engine.store().commit_exists(&v, &c1));
        assert!(!engine.store().commit_exists(&v, &c2));
        assert!(!engine.store().commit_exists(&v, &c3));
    }

    #[test]
    fn reset_keeps_commits_other_branches_list() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        let c1 = engine.commit(&v, Some("one")).unwrap();
        let c2 = engine.commit(&v, Some("two")).unwrap();

        assert!(matches!(
            engine.checkout(&v, "other", true).unwrap(),
            CheckoutOutcome::Created(_)
        ));
        engine.checkout(&v, "master", false).unwrap();
        let c3 = engine.commit(&v, Some("three")).unwrap();

        engine.reset(&v, c1.as_str(), true).unwrap();

        assert!(engine.store().commit_exists(&v, &c1));
        assert!(engine.store().commit_exists(&v, &c2));
        assert!(!engine.store().commit_exists(&v, &c3));
        assert_eq!(engine.active_branch(&v).unwrap(), BranchName::master());
    }

    #[test]
    fn reset_rejects_bad_references_before_mutating() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        engine.commit(&v, Some("one")).unwrap();
        write(&engine, &v, "file.txt", "dirty");

        assert!(matches!(
            engine.reset(&v, "HEAD^", true),
            Err(EngineError::NoSuchCommit(_))
        ));
        assert!(matches!(
            engine.reset(&v, "HEAD~1", true),
            Err(EngineError::MalformedReference(_))
        ));
        assert!(matches!(
            engine.reset(&v, "0123456789abcdef", true),
            Err(EngineError::NoSuchCommit(_))
        ));
        assert_eq!(read(&engine, &v, "file.txt"), "dirty");
        assert_eq!(engine.log(&v).unwrap().len(), 1);
    }

    #[test]
    fn reset_missing_snapshot_is_no_such_commit() {
        let (_temp, mut engine) = engine();
        let v = engine.init_volume("foo").unwrap();
        let c1 = engine.commit(&v, Some("one")).unwrap();
        engine.store().remove_commit(&v, &c1).unwrap();

        assert!(matches!(
            engine.reset(&v, "HEAD", true),
            Err(EngineError::NoSuchCommit(_))
        ));
    }

    #[test]
    fn operations_on_missing_volume() {
        let (_temp, mut engine) = engine();
        let v = VolumeName::new("ghost").unwrap();
        assert!(matches!(
            engine.commit(&v, Some("x")),
            Err(EngineError::NoSuchVolume(_))
        ));
        assert!(matches!(
            engine.reset(&v, "HEAD", true),
            Err(EngineError::NoSuchVolume(_))
        ));
    }
}
