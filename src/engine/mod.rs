//! engine
//!
//! The snapshot engine: every dvol operation, composed from the store, the
//! commit logs and the container lock.
//!
//! # Architecture
//!
//! ```text
//! cli / plugin
//!     |
//!   Engine ----> CommitLog        (per-branch history)
//!     |   \----> VersionStore     (directories, pointers, running point)
//!     |    \---> ContainerLock    (stop/start containers around tree writes)
//!     v
//!   resolver                      (HEAD^^ arithmetic, pure)
//! ```
//!
//! Operations take the volume they act on explicitly. Callers that default
//! to the active volume resolve it first with [`Engine::active_volume`].
//!
//! # Invariants
//!
//! - Names and references are validated before anything is mutated
//! - A commit id is in a log only if its snapshot directory exists
//! - A snapshot directory is deleted only when no branch's log lists it
//! - A lock acquired by an operation is released before it returns
//!
//! # Example
//!
//! ```no_run
//! use dvol::engine::{Context, Engine};
//!
//! let ctx = Context::default();
//! let mut engine = Engine::open(&ctx).unwrap();
//!
//! let volume = engine.init_volume("mysql").unwrap();
//! let id = engine.commit(&volume, Some("empty database")).unwrap();
//! engine.reset(&volume, "HEAD", true).unwrap();
//! println!("{}", id);
//! ```

mod branch;
mod gc;
mod snapshot;
mod volume;

pub use branch::{BranchSummary, CheckoutOutcome, DeleteOutcome};
pub use volume::{RemoveOutcome, VolumeSummary};

use std::path::PathBuf;

use thiserror::Error;

use crate::core::commit_log::{CommitLog, CommitLogError};
use crate::core::config::{Config, ConfigError};
use crate::core::paths::{PoolPaths, DEFAULT_POOL};
use crate::core::resolver::ResolveError;
use crate::core::store::{StoreError, VersionStore};
use crate::core::types::{BranchName, CommitId, TypeError, VolumeName};
use crate::lock::{create_lock, ContainerLock, LockError};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone)]
pub struct Context {
    /// Pool directory holding all volumes.
    pub pool: PathBuf,
    /// Never touch containers, regardless of config.
    pub disable_docker_integration: bool,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            pool: PathBuf::from(DEFAULT_POOL),
            disable_docker_integration: false,
            debug: false,
            quiet: false,
            interactive: true,
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("volume {0} already exists")]
    AlreadyExists(VolumeName),

    #[error("referenced commit {0} does not exist; check dvol log")]
    NoSuchCommit(String),

    #[error("branch '{0}' does not exist")]
    NoSuchBranch(BranchName),

    #[error("volume '{0}' does not exist")]
    NoSuchVolume(String),

    #[error("malformed reference '{0}'")]
    MalformedReference(String),

    #[error("already locked {0}, can't lock it")]
    AlreadyLocked(VolumeName),

    #[error("never locked {0}, can't unlock it")]
    NeverLocked(VolumeName),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    NoActiveVolume(String),

    #[error("cannot remove '{volume}' while it is in use by '{}'", .containers.join(","))]
    InUse {
        volume: VolumeName,
        containers: Vec<String>,
    },

    #[error("commit {0} already exists, refusing to overwrite it")]
    CommitCollision(CommitId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    CommitLog(#[from] CommitLogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lock(LockError),
}

impl From<LockError> for EngineError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::AlreadyLocked(v) => EngineError::AlreadyLocked(v),
            LockError::NeverLocked(v) => EngineError::NeverLocked(v),
            other => EngineError::Lock(other),
        }
    }
}

impl From<ResolveError> for EngineError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NoSuchCommit(r) => EngineError::NoSuchCommit(r),
            ResolveError::Malformed(r) => EngineError::MalformedReference(r),
        }
    }
}

/// The dvol engine for one pool.
pub struct Engine {
    store: VersionStore,
    commits: CommitLog,
    lock: Box<dyn ContainerLock>,
    config: Config,
    next_commit_id: fn() -> CommitId,
}

impl Engine {
    /// Build an engine over `paths` with an explicit lock and default config.
    pub fn new(paths: PoolPaths, lock: Box<dyn ContainerLock>) -> Self {
        Self {
            store: VersionStore::new(paths.clone()),
            commits: CommitLog::new(paths),
            lock,
            config: Config::default(),
            next_commit_id: CommitId::generate,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replace the commit id generator (random ids by default).
    pub fn with_commit_ids(mut self, next: fn() -> CommitId) -> Self {
        self.next_commit_id = next;
        self
    }

    /// Open the pool named by `ctx`, loading its config and choosing the
    /// container lock from config and flags.
    pub fn open(ctx: &Context) -> Result<Self, EngineError> {
        let config = Config::load(&ctx.pool)?;
        let lock = create_lock(&config, &ctx.pool, ctx.disable_docker_integration);
        Ok(Self::new(PoolPaths::new(&ctx.pool), lock).with_config(config))
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lock(&self) -> &dyn ContainerLock {
        self.lock.as_ref()
    }

    /// The active volume.
    ///
    /// # Errors
    ///
    /// `EngineError::NoActiveVolume` if no volume was ever made active, or
    /// the active one no longer exists.
    pub fn active_volume(&self) -> Result<VolumeName, EngineError> {
        let raw = self.store.active_volume()?.ok_or_else(|| {
            EngineError::NoActiveVolume(
                "No active volume: use dvol switch to choose one".to_string(),
            )
        })?;

        match VolumeName::new(raw.as_str()) {
            Ok(volume) if self.store.volume_exists(&volume) => Ok(volume),
            _ => Err(EngineError::NoActiveVolume(format!(
                "Active volume {} does not exist: use dvol switch to choose another",
                raw
            ))),
        }
    }

    /// The active branch of `volume`.
    pub fn active_branch(&self, volume: &VolumeName) -> Result<BranchName, EngineError> {
        self.require_volume(volume)?;
        Ok(self.store.active_branch(volume)?)
    }

    fn require_volume(&self, volume: &VolumeName) -> Result<(), EngineError> {
        if !self.store.volume_exists(volume) {
            return Err(EngineError::NoSuchVolume(volume.to_string()));
        }
        Ok(())
    }

    /// Names of running containers using `volume`. Listing failures are
    /// logged and read as no containers.
    fn related_containers(&self, volume: &VolumeName) -> Vec<String> {
        match self.lock.related_containers(volume) {
            Ok(names) => names,
            Err(e) => {
                log::warn!("could not list containers using {}: {}", volume, e);
                Vec::new()
            }
        }
    }
}
