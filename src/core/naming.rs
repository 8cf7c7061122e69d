//! core::naming
//!
//! Volume and branch naming rules.
//!
//! Every volume and branch name becomes a single directory name under the
//! pool, so names are validated as path segments before any filesystem call
//! is made with them.
//!
//! # Rules
//!
//! - Must not be empty, `.` or `..`
//! - Must not contain a path separator (`/` or `\`) or NUL
//! - Must start with an ASCII letter, followed by letters, digits, `-` or `_`
//! - At most [`MAX_NAME_LENGTH`] characters

use thiserror::Error;

/// Longest accepted volume or branch name.
pub const MAX_NAME_LENGTH: usize = 40;

/// Why a name was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name cannot be longer than {MAX_NAME_LENGTH} characters")]
    TooLong,

    #[error("name cannot refer to a parent or current directory")]
    Traversal,

    #[error("name cannot contain a path separator")]
    Separator,

    #[error("name must start with a letter")]
    BadStart,

    #[error("name cannot contain '{0}'")]
    BadChar(char),
}

/// Validate a volume or branch name as a safe path segment.
///
/// # Example
///
/// ```
/// use dvol::core::naming::{validate_name, NameError};
///
/// assert!(validate_name("mysql-data").is_ok());
/// assert_eq!(validate_name("../etc"), Err(NameError::Traversal));
/// assert_eq!(validate_name("a/b"), Err(NameError::Separator));
/// ```
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    // Traversal and separators first, so the error names the real problem
    if name == "." || name == ".." || name.starts_with("../") || name.starts_with("..\\") {
        return Err(NameError::Traversal);
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(NameError::Separator);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong);
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(NameError::BadStart),
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(NameError::BadChar(c));
        }
    }

    Ok(())
}
