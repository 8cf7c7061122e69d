//! engine::volume
//!
//! Volume lifecycle: init, switch, list, remove, and the mount queries the
//! Docker plugin answers.

use std::fs;
use std::path::PathBuf;

use log::info;

use super::{Engine, EngineError};
use crate::core::store::StoreError;
use crate::core::types::{BranchName, VolumeName};

/// What `remove_volume` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Aborted,
}

/// A volume in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSummary {
    pub name: VolumeName,
    /// The volume's active branch.
    pub branch: BranchName,
    /// Names of running containers using the volume.
    pub containers: Vec<String>,
    /// Whether this is the pool's active volume.
    pub active: bool,
}

impl Engine {
    /// Create a volume with an empty `master` branch and make it active.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` is not a valid volume name
    /// - `AlreadyExists` if the volume exists; it is left untouched
    pub fn init_volume(&self, name: &str) -> Result<VolumeName, EngineError> {
        let volume = VolumeName::new(name)?;
        self.store.create_volume(&volume).map_err(|e| match e {
            StoreError::VolumeExists(v) => EngineError::AlreadyExists(v),
            other => EngineError::Store(other),
        })?;
        self.store.update_running_point(&volume)?;
        info!("created volume {}", volume);
        Ok(volume)
    }

    /// Create the volume unless it already exists.
    pub fn ensure_volume(&self, name: &str) -> Result<VolumeName, EngineError> {
        let volume = VolumeName::new(name)?;
        if self.store.volume_exists(&volume) {
            return Ok(volume);
        }
        match self.init_volume(name) {
            Err(EngineError::AlreadyExists(v)) => Ok(v),
            other => other,
        }
    }

    /// Make `name` the active volume.
    pub fn switch_volume(&self, name: &str) -> Result<VolumeName, EngineError> {
        let volume = VolumeName::new(name)?;
        self.require_volume(&volume)?;
        self.store.set_active_volume(&volume)?;
        Ok(volume)
    }

    /// Every volume in the pool, sorted, with its active branch and
    /// related containers.
    pub fn list_volumes(&self) -> Result<Vec<VolumeSummary>, EngineError> {
        let active = self.store.active_volume()?;
        let mut summaries = Vec::new();
        for name in self.store.list_volumes()? {
            summaries.push(VolumeSummary {
                branch: self.store.active_branch(&name)?,
                containers: self.related_containers(&name),
                active: active.as_deref() == Some(name.as_str()),
                name,
            });
        }
        Ok(summaries)
    }

    /// Delete a volume and all its branches and commits.
    ///
    /// Refused while any running container uses the volume. `confirm` is
    /// asked after the checks and before anything is removed.
    pub fn remove_volume<F>(&self, name: &str, confirm: F) -> Result<RemoveOutcome, EngineError>
    where
        F: FnOnce(&VolumeName) -> bool,
    {
        let volume = VolumeName::new(name)?;
        self.require_volume(&volume)?;

        let containers = self.related_containers(&volume);
        if !containers.is_empty() {
            return Err(EngineError::InUse { volume, containers });
        }
        if !confirm(&volume) {
            return Ok(RemoveOutcome::Aborted);
        }

        self.store.remove_volume(&volume)?;
        info!("removed volume {}", volume);
        Ok(RemoveOutcome::Removed)
    }

    /// Refresh the running point of `name` and return it.
    ///
    /// No containers are stopped: this is called by Docker while it is
    /// starting the container that will use the volume.
    pub fn mount(&self, name: &str) -> Result<PathBuf, EngineError> {
        let volume = VolumeName::new(name)?;
        self.require_volume(&volume)?;
        Ok(self.store.update_running_point(&volume)?)
    }

    /// The running point of `name`, if it has been created.
    pub fn mountpoint(&self, name: &str) -> Result<Option<PathBuf>, EngineError> {
        let volume = VolumeName::new(name)?;
        let link = self.store.running_point(&volume);
        Ok(fs::symlink_metadata(&link).ok().map(|_| link))
    }

    /// Every volume with its running point, if created.
    pub fn mountpoints(&self) -> Result<Vec<(VolumeName, Option<PathBuf>)>, EngineError> {
        let mut out = Vec::new();
        for volume in self.store.list_volumes()? {
            let point = self.mountpoint(volume.as_str())?;
            out.push((volume, point));
        }
        Ok(out)
    }
}
