//! dvol - version control for Docker volumes
//!
//! dvol lets an operator commit, branch and reset the contents of a volume
//! directory tree. Running containers that use a volume are stopped around
//! every snapshot and started again afterwards. A Docker volume plugin
//! exposes the active branch of each volume as a stable mount target.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`plugin`] - Docker volume-plugin protocol and socket listener
//! - [`engine`] - Commit, reset, checkout and volume operations
//! - [`lock`] - Stopping and restarting containers around tree writes
//! - [`containers`] - Single interface to the container runtime
//! - [`core`] - Domain types, on-disk layout, commit logs, configuration
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! dvol maintains the following invariants:
//!
//! 1. Names and references are validated before any mutation
//! 2. A commit is logged only after its snapshot is complete
//! 3. A snapshot is deleted only when no branch of its volume lists it
//! 4. Containers stopped for an operation are started again when it ends

pub mod cli;
pub mod containers;
pub mod core;
pub mod engine;
pub mod lock;
pub mod plugin;
pub mod ui;
