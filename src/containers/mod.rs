//! containers
//!
//! Container runtime abstraction.
//!
//! # Architecture
//!
//! The lock layer needs exactly three things from a container runtime:
//! list the running containers with their mounts, stop one, start one.
//! [`ContainerRuntime`] is that seam. [`docker::DockerCli`] implements it
//! against the `docker` command; [`mock::MockRuntime`] implements it in
//! memory for tests.
//!
//! # Relatedness
//!
//! A container is related to a volume when it is running and one of its
//! mounts either comes from our volume driver under the volume's name, or
//! has a source path inside that volume's directory in the pool.
//!
//! # Example
//!
//! ```
//! use dvol::containers::mock::MockRuntime;
//! use dvol::containers::{related_containers, Container, Mount};
//! use dvol::core::types::VolumeName;
//! use std::path::Path;
//!
//! let runtime = MockRuntime::new();
//! runtime.add_container(Container::running("c1", "db").with_mount(Mount::driver("dvol", "foo")));
//!
//! let volume = VolumeName::new("foo").unwrap();
//! let related = related_containers(&runtime, "dvol", Path::new("/pool"), &volume).unwrap();
//! assert_eq!(related.len(), 1);
//! ```

pub mod docker;
pub mod mock;

use std::path::{Component, Path};

use serde::Deserialize;
use thiserror::Error;

use crate::core::types::VolumeName;

/// Errors from the container runtime.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("failed to run '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("could not parse container runtime output: {0}")]
    Parse(String),

    #[error("no such container: {0}")]
    NotFound(String),
}

/// One mount of a container, as reported by `docker inspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Mount {
    #[serde(rename = "Driver", default)]
    pub driver: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Source", default)]
    pub source: String,
}

impl Mount {
    /// A named volume mount from `driver`.
    pub fn driver(driver: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            name: name.into(),
            source: String::new(),
        }
    }

    /// A bind mount of `source`.
    pub fn bind(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }
}

/// A container known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    /// Name without the leading `/` docker reports.
    pub name: String,
    pub running: bool,
    pub mounts: Vec<Mount>,
}

impl Container {
    pub fn running(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            running: true,
            mounts: Vec::new(),
        }
    }

    pub fn with_mount(mut self, mount: Mount) -> Self {
        self.mounts.push(mount);
        self
    }

    /// Whether this container uses `volume` from the pool at `pool_root`.
    pub fn uses_volume(&self, driver: &str, pool_root: &Path, volume: &VolumeName) -> bool {
        self.mounts.iter().any(|mount| {
            (mount.driver == driver && mount.name == volume.as_str())
                || source_volume(pool_root, &mount.source) == Some(volume.as_str())
        })
    }
}

/// The volume a mount source path belongs to, if it lies inside the pool.
fn source_volume<'a>(pool_root: &Path, source: &'a str) -> Option<&'a str> {
    let relative = Path::new(source).strip_prefix(pool_root).ok()?;
    match relative.components().next()? {
        Component::Normal(name) => name.to_str(),
        _ => None,
    }
}

/// Access to a container runtime.
pub trait ContainerRuntime {
    /// Running containers, with their mounts.
    fn list_running(&self) -> Result<Vec<Container>, RuntimeError>;

    /// Stop a container, waiting at most `timeout_secs` before killing it.
    fn stop(&self, id: &str, timeout_secs: u32) -> Result<(), RuntimeError>;

    /// Start a stopped container.
    fn start(&self, id: &str) -> Result<(), RuntimeError>;
}

impl<R: ContainerRuntime + ?Sized> ContainerRuntime for Box<R> {
    fn list_running(&self) -> Result<Vec<Container>, RuntimeError> {
        (**self).list_running()
    }

    fn stop(&self, id: &str, timeout_secs: u32) -> Result<(), RuntimeError> {
        (**self).stop(id, timeout_secs)
    }

    fn start(&self, id: &str) -> Result<(), RuntimeError> {
        (**self).start(id)
    }
}

/// Running containers related to `volume`.
pub fn related_containers<R: ContainerRuntime + ?Sized>(
    runtime: &R,
    driver: &str,
    pool_root: &Path,
    volume: &VolumeName,
) -> Result<Vec<Container>, RuntimeError> {
    Ok(runtime
        .list_running()?
        .into_iter()
        .filter(|c| c.running && c.uses_volume(driver, pool_root, volume))
        .collect())
}
