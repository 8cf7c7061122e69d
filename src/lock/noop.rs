//! lock::noop
//!
//! Lock that coordinates no containers.

use std::collections::HashSet;

use super::{ContainerLock, LockError};
use crate::core::types::VolumeName;

/// Container lock for hosts without a container runtime.
///
/// Still tracks which volumes are held so acquire/release pairing is
/// enforced exactly as with [`DockerLock`](super::DockerLock).
#[derive(Debug, Default)]
pub struct NoopLock {
    held: HashSet<VolumeName>,
}

impl NoopLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContainerLock for NoopLock {
    fn acquire(&mut self, volume: &VolumeName) -> Result<(), LockError> {
        if !self.held.insert(volume.clone()) {
            return Err(LockError::AlreadyLocked(volume.clone()));
        }
        Ok(())
    }

    fn release(&mut self, volume: &VolumeName) -> Result<(), LockError> {
        if !self.held.remove(volume) {
            return Err(LockError::NeverLocked(volume.clone()));
        }
        Ok(())
    }

    fn related_containers(&self, _volume: &VolumeName) -> Result<Vec<String>, LockError> {
        Ok(Vec::new())
    }

    fn is_locked(&self, volume: &VolumeName) -> bool {
        self.held.contains(volume)
    }
}
