//! lock
//!
//! Per-volume container locks.
//!
//! # Architecture
//!
//! Before a snapshot or restore touches a working tree, every running
//! container using that volume is stopped; afterwards the same containers
//! are started again. [`ContainerLock`] is that capability, with two
//! implementations chosen when the engine is built:
//!
//! - [`DockerLock`] - stops and starts containers through a
//!   [`ContainerRuntime`](crate::containers::ContainerRuntime)
//! - [`NoopLock`] - touches no containers, for hosts without Docker
//!
//! Both enforce the same pairing contract: acquiring a held volume fails
//! with `AlreadyLocked`, releasing an unheld one fails with `NeverLocked`.
//!
//! # Scope
//!
//! Exclusion is per process and keyed by volume name. Nothing stops a
//! second dvol process from working on the same volume at the same time.
//!
//! # Example
//!
//! ```
//! use dvol::core::types::VolumeName;
//! use dvol::lock::{ContainerLock, NoopLock, ScopedLock};
//!
//! let mut lock = NoopLock::new();
//! let volume = VolumeName::new("foo").unwrap();
//!
//! {
//!     let guard = ScopedLock::acquire(&mut lock, &volume).unwrap();
//!     // ... mutate the working tree ...
//!     guard.release().unwrap();
//! }
//! assert!(!lock.is_locked(&volume));
//! ```

mod docker;
mod noop;

pub use docker::{DockerLock, STOP_TIMEOUT_SECS};
pub use noop::NoopLock;

use std::path::Path;

use log::warn;
use thiserror::Error;

use crate::containers::docker::DockerCli;
use crate::containers::RuntimeError;
use crate::core::config::Config;
use crate::core::types::VolumeName;

/// Errors from container locks.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("already locked {0}, can't lock it")]
    AlreadyLocked(VolumeName),

    #[error("never locked {0}, can't unlock it")]
    NeverLocked(VolumeName),

    #[error("container runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Mutual exclusion over a volume's containers.
pub trait ContainerLock {
    /// Stop every running container using `volume` and remember them.
    ///
    /// Stop failures are logged, not returned.
    fn acquire(&mut self, volume: &VolumeName) -> Result<(), LockError>;

    /// Start every container remembered for `volume` and forget them.
    ///
    /// Start failures are logged, not returned.
    fn release(&mut self, volume: &VolumeName) -> Result<(), LockError>;

    /// Names of the running containers currently using `volume`.
    fn related_containers(&self, volume: &VolumeName) -> Result<Vec<String>, LockError>;

    /// Whether `volume` is held by this lock.
    fn is_locked(&self, volume: &VolumeName) -> bool;
}

/// Guard that releases a volume's lock when dropped.
///
/// Prefer [`ScopedLock::release`], which reports release errors; a release
/// from `Drop` can only log them.
pub struct ScopedLock<'a> {
    lock: &'a mut dyn ContainerLock,
    volume: VolumeName,
    released: bool,
}

impl<'a> ScopedLock<'a> {
    /// Acquire `volume` on `lock`.
    pub fn acquire(lock: &'a mut dyn ContainerLock, volume: &VolumeName) -> Result<Self, LockError> {
        lock.acquire(volume)?;
        Ok(Self {
            lock,
            volume: volume.clone(),
            released: false,
        })
    }

    /// Release the lock, reporting any error.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.lock.release(&self.volume)
    }
}

impl Drop for ScopedLock<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.lock.release(&self.volume) {
            warn!("failed to release lock on {}: {}", self.volume, e);
        }
    }
}

/// Build the lock for a pool from its configuration.
///
/// `disable_docker` (the `--disable-docker-integration` flag) wins over the
/// config file.
pub fn create_lock(config: &Config, pool_root: &Path, disable_docker: bool) -> Box<dyn ContainerLock> {
    if disable_docker || !config.docker_integration() {
        return Box::new(NoopLock::new());
    }
    Box::new(
        DockerLock::new(DockerCli::new(), config.driver(), pool_root)
            .with_retries(config.stop_retries()),
    )
}
