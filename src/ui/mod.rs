//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts and confirmations
//! - [`output`] - Output formatting, tables and verbosity
//!
//! # Design
//!
//! All output and prompts go through this module so that quiet and
//! non-interactive modes are handled in one place.

pub mod output;
pub mod prompts;
