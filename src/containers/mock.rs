//! containers::mock
//!
//! In-memory container runtime for deterministic testing.
//!
//! # Design
//!
//! `MockRuntime` keeps a table of containers, records every call, and can be
//! told to fail a given operation a fixed number of times. Stopping a
//! container marks it not running; starting marks it running again, so tests
//! can observe the lock's effect on container state.
//!
//! # Example
//!
//! ```
//! use dvol::containers::mock::{MockOperation, MockRuntime};
//! use dvol::containers::{Container, ContainerRuntime};
//!
//! let runtime = MockRuntime::new();
//! runtime.add_container(Container::running("c1", "db"));
//!
//! runtime.stop("c1", 10).unwrap();
//! assert!(!runtime.is_running("c1"));
//! assert_eq!(
//!     runtime.operations(),
//!     vec![MockOperation::Stop { id: "c1".to_string() }]
//! );
//! ```

use std::sync::{Arc, Mutex};

use super::{Container, ContainerRuntime, RuntimeError};

/// Mock runtime for testing.
///
/// Clones share state, so a test can hand one clone to the lock and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct MockRuntime {
    inner: Arc<Mutex<MockRuntimeInner>>,
}

#[derive(Debug, Default)]
struct MockRuntimeInner {
    containers: Vec<Container>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which operation should fail, and how many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Fail `list_running` every time.
    List,
    /// Fail the next `times` stops of container `id`.
    Stop { id: String, times: u32 },
    /// Fail every start of container `id`.
    Start { id: String },
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    List,
    Stop { id: String },
    Start { id: String },
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container to the runtime.
    pub fn add_container(&self, container: Container) {
        let mut inner = self.inner.lock().unwrap();
        inner.containers.push(container);
    }

    /// Configure a failure.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// All recorded operations, in call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Whether container `id` is currently running.
    pub fn is_running(&self, id: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.containers.iter().any(|c| c.id == id && c.running)
    }

    fn set_running(inner: &mut MockRuntimeInner, id: &str, running: bool) -> Result<(), RuntimeError> {
        let container = inner
            .containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        container.running = running;
        Ok(())
    }
}

impl ContainerRuntime for MockRuntime {
    fn list_running(&self) -> Result<Vec<Container>, RuntimeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::List);
        if inner.fail_on == Some(FailOn::List) {
            return Err(RuntimeError::CommandFailed {
                command: "docker ps".to_string(),
                stderr: "Cannot connect to the Docker daemon".to_string(),
            });
        }
        Ok(inner.containers.iter().filter(|c| c.running).cloned().collect())
    }

    fn stop(&self, id: &str, _timeout_secs: u32) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::Stop { id: id.to_string() });

        if let Some(FailOn::Stop { id: fail_id, times }) = &mut inner.fail_on {
            if fail_id == id && *times > 0 {
                *times -= 1;
                return Err(RuntimeError::CommandFailed {
                    command: format!("docker stop {}", id),
                    stderr: "timeout".to_string(),
                });
            }
        }
        Self::set_running(&mut inner, id, false)
    }

    fn start(&self, id: &str) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::Start { id: id.to_string() });

        if let Some(FailOn::Start { id: fail_id }) = &inner.fail_on {
            if fail_id == id {
                return Err(RuntimeError::CommandFailed {
                    command: format!("docker start {}", id),
                    stderr: "no such container".to_string(),
                });
            }
        }
        Self::set_running(&mut inner, id, true)
    }
}
