//! lock::docker
//!
//! Lock that stops and restarts the containers using a volume.
//!
//! # Failure policy
//!
//! Container coordination is best effort. Each stop is attempted up to the
//! configured number of times, logging every failed attempt; a container
//! that still won't stop is logged and the lock is taken anyway. Start
//! failures on release are logged and never retried. Neither fails the
//! operation the lock is protecting.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use super::{ContainerLock, LockError};
use crate::containers::{related_containers, ContainerRuntime};
use crate::core::config::{DEFAULT_DRIVER, DEFAULT_STOP_RETRIES};
use crate::core::types::VolumeName;

/// Seconds docker waits for a container to stop before killing it.
pub const STOP_TIMEOUT_SECS: u32 = 10;

/// Container lock backed by a container runtime.
#[derive(Debug)]
pub struct DockerLock<R: ContainerRuntime> {
    runtime: R,
    driver: String,
    pool_root: PathBuf,
    retries: u32,
    /// Containers stopped per held volume.
    stopped: HashMap<VolumeName, BTreeSet<String>>,
}

impl<R: ContainerRuntime> DockerLock<R> {
    pub fn new(runtime: R, driver: impl Into<String>, pool_root: &Path) -> Self {
        Self {
            runtime,
            driver: driver.into(),
            pool_root: pool_root.to_path_buf(),
            retries: DEFAULT_STOP_RETRIES,
            stopped: HashMap::new(),
        }
    }

    /// Lock for the default `dvol` driver.
    pub fn with_default_driver(runtime: R, pool_root: &Path) -> Self {
        Self::new(runtime, DEFAULT_DRIVER, pool_root)
    }

    /// Set the number of stop attempts per container (at least 1).
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Container ids stopped for `volume`, if held.
    pub fn stopped(&self, volume: &VolumeName) -> Option<&BTreeSet<String>> {
        self.stopped.get(volume)
    }

    fn attempt_stop(&self, id: &str, name: &str) -> bool {
        for attempt in 1..=self.retries {
            match self.runtime.stop(id, STOP_TIMEOUT_SECS) {
                Ok(()) => {
                    info!("stopped container {} ({})", name, id);
                    return true;
                }
                Err(e) => warn!(
                    "attempt {}/{} to stop container {} failed: {}",
                    attempt, self.retries, name, e
                ),
            }
        }
        error!(
            "giving up stopping container {} after {} attempts",
            name, self.retries
        );
        false
    }
}

impl<R: ContainerRuntime> ContainerLock for DockerLock<R> {
    fn acquire(&mut self, volume: &VolumeName) -> Result<(), LockError> {
        if self.stopped.contains_key(volume) {
            return Err(LockError::AlreadyLocked(volume.clone()));
        }

        let containers =
            match related_containers(&self.runtime, &self.driver, &self.pool_root, volume) {
                Ok(containers) => containers,
                Err(e) => {
                    warn!("could not list containers using {}: {}", volume, e);
                    Vec::new()
                }
            };

        let mut stopped = BTreeSet::new();
        for container in &containers {
            self.attempt_stop(&container.id, &container.name);
            // Remembered even if the stop failed; starting a running
            // container is harmless.
            stopped.insert(container.id.clone());
        }
        debug!("locked {} ({} containers)", volume, stopped.len());
        self.stopped.insert(volume.clone(), stopped);
        Ok(())
    }

    fn release(&mut self, volume: &VolumeName) -> Result<(), LockError> {
        let stopped = self
            .stopped
            .remove(volume)
            .ok_or_else(|| LockError::NeverLocked(volume.clone()))?;

        for id in &stopped {
            match self.runtime.start(id) {
                Ok(()) => info!("started container {}", id),
                Err(e) => error!("failed to start container {}: {}", id, e),
            }
        }
        debug!("unlocked {}", volume);
        Ok(())
    }

    fn related_containers(&self, volume: &VolumeName) -> Result<Vec<String>, LockError> {
        let containers = related_containers(&self.runtime, &self.driver, &self.pool_root, volume)?;
        Ok(containers.into_iter().map(|c| c.name).collect())
    }

    fn is_locked(&self, volume: &VolumeName) -> bool {
        self.stopped.contains_key(volume)
    }
}
