//! core
//!
//! Core domain types, on-disk layout, and storage for dvol.
//!
//! # Modules
//!
//! - [`types`] - Strong types: VolumeName, BranchName, CommitId, Commit
//! - [`naming`] - Volume and branch naming rules
//! - [`paths`] - Centralized path routing for a volume pool
//! - [`fsops`] - Tree copies, atomic writes, permissions
//! - [`commit_log`] - Per-branch commit logs
//! - [`resolver`] - `HEAD^^`-style reference resolution
//! - [`store`] - Volumes, branches, snapshots and active pointers
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Names are validated once, at construction, and are path-safe after
//! - Nothing here talks to the container runtime
//! - Resolution is pure and deterministic

pub mod commit_log;
pub mod config;
pub mod fsops;
pub mod naming;
pub mod paths;
pub mod resolver;
pub mod store;
pub mod types;
