//! containers::docker
//!
//! Container runtime backed by the `docker` command line client.
//!
//! Listing is `docker ps -q --no-trunc` followed by one `docker inspect` per
//! container. A container that disappears between the two calls is logged
//! and skipped; the listing is a best-effort view of docker's state.

use std::process::{Command, Output};

use log::{debug, warn};
use serde::Deserialize;

use super::{Container, ContainerRuntime, Mount, RuntimeError};

/// Default docker executable.
pub const DOCKER_BIN: &str = "docker";

/// Runtime that shells out to `docker`.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

#[derive(Debug, Deserialize)]
struct InspectState {
    #[serde(rename = "Running", default)]
    running: bool,
}

#[derive(Debug, Deserialize)]
struct InspectContainer {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "State")]
    state: InspectState,
    #[serde(rename = "Mounts", default)]
    mounts: Option<Vec<Mount>>,
}

impl From<InspectContainer> for Container {
    fn from(c: InspectContainer) -> Self {
        Container {
            id: c.id,
            name: c.name.trim_start_matches('/').to_string(),
            running: c.state.running,
            mounts: c.mounts.unwrap_or_default(),
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program(DOCKER_BIN)
    }

    /// Use a different docker executable (e.g. a wrapper script).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output, RuntimeError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("running {}", command);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| RuntimeError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn inspect(&self, id: &str) -> Result<Container, RuntimeError> {
        let output = self.run(&["inspect", "--type", "container", id])?;
        parse_inspect(&output.stdout)?
            .into_iter()
            .next()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for DockerCli {
    fn list_running(&self) -> Result<Vec<Container>, RuntimeError> {
        let output = self.run(&["ps", "-q", "--no-trunc"])?;
        let ids = String::from_utf8_lossy(&output.stdout);

        let mut containers = Vec::new();
        for id in ids.lines().map(str::trim).filter(|id| !id.is_empty()) {
            match self.inspect(id) {
                Ok(container) => containers.push(container),
                Err(e) => warn!("while fetching state of container {}, maybe it was deleted: {}", id, e),
            }
        }
        Ok(containers)
    }

    fn stop(&self, id: &str, timeout_secs: u32) -> Result<(), RuntimeError> {
        let timeout = timeout_secs.to_string();
        self.run(&["stop", "-t", &timeout, id]).map(|_| ())
    }

    fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(&["start", id]).map(|_| ())
    }
}

/// Parse `docker inspect` output (a JSON array of containers).
fn parse_inspect(stdout: &[u8]) -> Result<Vec<Container>, RuntimeError> {
    let parsed: Vec<InspectContainer> =
        serde_json::from_slice(stdout).map_err(|e| RuntimeError::Parse(e.to_string()))?;
    Ok(parsed.into_iter().map(Container::from).collect())
}
