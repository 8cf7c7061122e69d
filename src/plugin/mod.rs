//! plugin
//!
//! Docker volume plugin protocol.
//!
//! # Protocol
//!
//! Docker POSTs JSON to `/<Endpoint>` on the plugin's unix socket and
//! expects JSON back, always with an `Err` field that is empty on success:
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `Plugin.Activate` | - | `{"Implements": ["VolumeDriver"]}` |
//! | `VolumeDriver.Create` | `{"Name"}` | `{"Err"}` |
//! | `VolumeDriver.Remove` | `{"Name"}` | `{"Err": ""}` always |
//! | `VolumeDriver.Path` | `{"Name"}` | `{"Mountpoint", "Err"}` |
//! | `VolumeDriver.Mount` | `{"Name", "ID"}` | `{"Mountpoint", "Err"}` |
//! | `VolumeDriver.Unmount` | `{"Name", "ID"}` | `{"Err": ""}` always |
//! | `VolumeDriver.Get` | `{"Name"}` | `{"Volume": {"Name", "Mountpoint"}, "Err"}` |
//! | `VolumeDriver.List` | - | `{"Volumes": [...], "Err"}` |
//! | `VolumeDriver.Capabilities` | - | `{"Capabilities": {"Scope": "local"}}` |
//!
//! Removing a Docker volume never deletes dvol data: a dvol volume may
//! outlive every container that used it.
//!
//! # Architecture
//!
//! [`handle`] maps one request to one response and has no I/O of its own
//! beyond the engine calls, so the protocol is tested without a socket.
//! [`server`] owns the socket and the accept loop.

pub mod server;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::types::VolumeName;
use crate::engine::{Engine, EngineError};

/// Content type of every plugin response.
pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1+json";

/// Directory Docker scans for plugin sockets.
pub const DEFAULT_PLUGINS_DIR: &str = "/run/docker/plugins";

/// Socket file name; Docker derives the driver name from it.
pub const SOCKET_NAME: &str = "dvol.sock";

/// Plugin endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Activate,
    Create,
    Remove,
    Path,
    Mount,
    Unmount,
    Get,
    List,
    Capabilities,
}

impl Endpoint {
    /// Parse a request URL path such as `/VolumeDriver.Mount`.
    pub fn from_path(path: &str) -> Option<Self> {
        let endpoint = match path.trim_start_matches('/') {
            "Plugin.Activate" => Endpoint::Activate,
            "VolumeDriver.Create" => Endpoint::Create,
            "VolumeDriver.Remove" => Endpoint::Remove,
            "VolumeDriver.Path" => Endpoint::Path,
            "VolumeDriver.Mount" => Endpoint::Mount,
            "VolumeDriver.Unmount" => Endpoint::Unmount,
            "VolumeDriver.Get" => Endpoint::Get,
            "VolumeDriver.List" => Endpoint::List,
            "VolumeDriver.Capabilities" => Endpoint::Capabilities,
            _ => return None,
        };
        Some(endpoint)
    }
}

#[derive(Debug, Deserialize)]
struct NameRequest {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Serialize)]
struct ErrResponse {
    #[serde(rename = "Err")]
    err: String,
}

#[derive(Debug, Serialize)]
struct MountResponse {
    #[serde(rename = "Mountpoint")]
    mountpoint: String,
    #[serde(rename = "Err")]
    err: String,
}

#[derive(Debug, Serialize)]
struct VolumeInfo {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Mountpoint")]
    mountpoint: String,
}

/// Answer one plugin request.
///
/// Returns the HTTP status and JSON body. Failures are reported in the
/// body's `Err` field with status 200, which is what Docker expects; only
/// an unknown endpoint gets a 404.
pub fn handle(engine: &Engine, path: &str, body: &[u8]) -> (u16, Value) {
    info!("<= {}", path);

    let endpoint = match Endpoint::from_path(path) {
        Some(endpoint) => endpoint,
        None => {
            warn!("unknown plugin endpoint {}", path);
            return (404, json!({ "Err": "unknown endpoint" }));
        }
    };

    let response = match endpoint {
        Endpoint::Activate => json!({ "Implements": ["VolumeDriver"] }),
        Endpoint::Capabilities => json!({ "Capabilities": { "Scope": "local" } }),
        Endpoint::List => list(engine),
        Endpoint::Remove | Endpoint::Unmount => to_value(ErrResponse { err: String::new() }),
        Endpoint::Create => with_name(body, |name| create(engine, name)),
        Endpoint::Path => with_name(body, |name| path_of(engine, name)),
        Endpoint::Mount => with_name(body, |name| mount(engine, name)),
        Endpoint::Get => with_name(body, |name| get(engine, name)),
    };
    (200, response)
}

/// Parse a `{"Name": ...}` request body and answer it with `f`.
fn with_name(body: &[u8], f: impl FnOnce(&str) -> Value) -> Value {
    match serde_json::from_slice::<NameRequest>(body) {
        Ok(request) => f(&request.name),
        Err(e) => to_value(ErrResponse {
            err: format!("malformed request: {}", e),
        }),
    }
}

fn to_value<T: Serialize>(response: T) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| json!({ "Err": e.to_string() }))
}

fn create(engine: &Engine, name: &str) -> Value {
    let err = match engine.ensure_volume(name) {
        Ok(_) => String::new(),
        Err(e) => {
            warn!("creating volume {} failed: {}", name, e);
            format!("voluminous '{}' creation failed: {}", name, e)
        }
    };
    to_value(ErrResponse { err })
}

fn path_of(engine: &Engine, name: &str) -> Value {
    let response = match engine.mountpoint(name) {
        Ok(point) => MountResponse {
            mountpoint: point.map(|p| p.display().to_string()).unwrap_or_default(),
            err: String::new(),
        },
        Err(e) => MountResponse {
            mountpoint: String::new(),
            err: e.to_string(),
        },
    };
    to_value(response)
}

fn mount(engine: &Engine, name: &str) -> Value {
    let response = match engine.mount(name) {
        Ok(point) => MountResponse {
            mountpoint: point.display().to_string(),
            err: String::new(),
        },
        Err(EngineError::NoSuchVolume(_)) => MountResponse {
            mountpoint: String::new(),
            err: format!(
                "Voluminous '{}' does not exist, create it with: dvol init {}",
                name, name
            ),
        },
        Err(e) => MountResponse {
            mountpoint: String::new(),
            err: e.to_string(),
        },
    };
    to_value(response)
}

fn get(engine: &Engine, name: &str) -> Value {
    let missing = || json!({ "Err": format!("volume '{}' does not exist", name) });
    match VolumeName::new(name) {
        Ok(volume) if engine.store().volume_exists(&volume) => {}
        _ => return missing(),
    }
    match engine.mountpoint(name) {
        Ok(point) => json!({
            "Volume": to_value(VolumeInfo {
                name: name.to_string(),
                mountpoint: point.map(|p| p.display().to_string()).unwrap_or_default(),
            }),
            "Err": "",
        }),
        Err(e) => json!({ "Err": e.to_string() }),
    }
}

fn list(engine: &Engine) -> Value {
    match engine.mountpoints() {
        Ok(volumes) => {
            let volumes: Vec<Value> = volumes
                .into_iter()
                .map(|(volume, point)| {
                    to_value(VolumeInfo {
                        name: volume.to_string(),
                        mountpoint: point.map(|p| p.display().to_string()).unwrap_or_default(),
                    })
                })
                .collect();
            json!({ "Volumes": volumes, "Err": "" })
        }
        Err(e) => json!({ "Volumes": [], "Err": e.to_string() }),
    }
}
