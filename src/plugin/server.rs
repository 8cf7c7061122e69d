//! plugin::server
//!
//! Unix-socket HTTP listener for the volume plugin.
//!
//! Requests are served one at a time on the calling thread; each is passed
//! to [`handle`](super::handle) and its answer written back as JSON.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

use super::{handle, PLUGIN_CONTENT_TYPE, SOCKET_NAME};
use crate::engine::Engine;

/// Errors from the plugin listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("could not prepare plugin directory '{path}': {source}")]
    Prepare { path: PathBuf, source: io::Error },

    #[error("could not listen on '{path}': {message}")]
    Bind { path: PathBuf, message: String },
}

/// Create `plugins_dir` (mode 0700) if needed and remove a stale socket in it.
///
/// Returns the socket path to bind.
pub fn prepare_socket(plugins_dir: &Path) -> Result<PathBuf, ServerError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(plugins_dir).map_err(|source| ServerError::Prepare {
        path: plugins_dir.to_path_buf(),
        source,
    })?;

    let socket = plugins_dir.join(SOCKET_NAME);
    if fs::symlink_metadata(&socket).is_ok() {
        debug!("removing stale socket {}", socket.display());
        fs::remove_file(&socket).map_err(|source| ServerError::Prepare {
            path: socket.clone(),
            source,
        })?;
    }
    Ok(socket)
}

/// A bound plugin listener.
pub struct PluginServer {
    server: Server,
    socket: PathBuf,
}

impl PluginServer {
    /// Listen on the unix socket at `socket`.
    pub fn bind(socket: &Path) -> Result<Self, ServerError> {
        let server = Server::http_unix(socket).map_err(|e| ServerError::Bind {
            path: socket.to_path_buf(),
            message: e.to_string(),
        })?;
        info!("listening on {}", socket.display());
        Ok(Self {
            server,
            socket: socket.to_path_buf(),
        })
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Serve requests forever. Receive errors are logged and skipped.
    pub fn serve(&self, engine: &Engine) {
        loop {
            let request = match self.server.recv() {
                Ok(request) => request,
                Err(e) => {
                    error!("plugin recv error: {}", e);
                    continue;
                }
            };
            respond(engine, request);
        }
    }
}

fn respond(engine: &Engine, mut request: Request) {
    let path = request.url().to_string();

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        error!("could not read request body for {}: {}", path, e);
        body.clear();
    }

    let (status, answer) = handle(engine, &path, &body);
    let mut response = Response::from_string(answer.to_string()).with_status_code(status);
    if let Ok(content_type) = Header::from_bytes(&b"Content-Type"[..], PLUGIN_CONTENT_TYPE.as_bytes()) {
        response.add_header(content_type);
    }
    if let Err(e) = request.respond(response) {
        error!("could not answer {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prepare_creates_dir_and_clears_stale_socket() {
        let temp = TempDir::new().unwrap();
        let plugins = temp.path().join("run/docker/plugins");

        let socket = prepare_socket(&plugins).unwrap();
        assert!(plugins.is_dir());
        assert_eq!(socket, plugins.join("dvol.sock"));

        fs::write(&socket, "stale").unwrap();
        prepare_socket(&plugins).unwrap();
        assert!(!socket.exists());
    }
}
