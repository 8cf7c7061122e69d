//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`VolumeName`] - Validated volume name (a safe path segment)
//! - [`BranchName`] - Validated branch name (a safe path segment)
//! - [`CommitId`] - Identifier of an immutable snapshot
//! - [`Commit`] - One entry of a branch's commit log
//!
//! # Validation
//!
//! These types enforce validity at construction time. A value of any of
//! them can be joined onto a pool path without escaping it.
//!
//! # Examples
//!
//! ```
//! use dvol::core::types::{BranchName, CommitId, VolumeName};
//!
//! let volume = VolumeName::new("mysql").unwrap();
//! let branch = BranchName::master();
//! let id = CommitId::generate();
//!
//! assert_eq!(volume.as_str(), "mysql");
//! assert_eq!(branch.as_str(), "master");
//! assert_eq!(id.as_str().len(), 40);
//!
//! assert!(VolumeName::new("../etc").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::naming::{validate_name, NameError};

/// Name of the branch every volume starts with.
pub const DEFAULT_BRANCH: &str = "master";

/// Length of generated commit identifiers.
pub const COMMIT_ID_LEN: usize = 40;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{name} is not a valid name: {reason}")]
    InvalidName { name: String, reason: NameError },

    #[error("invalid commit id: {0}")]
    InvalidCommitId(String),
}

macro_rules! segment_name {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $ty(String);

        impl $ty {
            /// Create a new validated name.
            ///
            /// # Errors
            ///
            /// Returns `TypeError::InvalidName` if the name is not a safe path segment.
            pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
                let name = name.into();
                match validate_name(&name) {
                    Ok(()) => Ok(Self(name)),
                    Err(reason) => Err(TypeError::InvalidName { name, reason }),
                }
            }

            /// Get the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(name: $ty) -> Self {
                name.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

segment_name!(
    /// A validated volume name.
    ///
    /// Immutable once the volume is created; it is the directory name of the
    /// volume under the pool.
    VolumeName
);

segment_name!(
    /// A validated branch name within a volume.
    BranchName
);

impl BranchName {
    /// The default branch created by `init`.
    pub fn master() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

/// Identifier of a commit (an immutable snapshot directory).
///
/// Generated ids are 40 lowercase hex characters taken from two random
/// UUIDs. Ids read back from a commit log or typed by the user are only
/// required to be ASCII alphanumeric, so they can never escape the
/// `commits/` directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Parse a commit id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommitId` if the id is empty, too long, or
    /// contains anything other than ASCII letters and digits.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() || id.len() > 64 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypeError::InvalidCommitId(id));
        }
        Ok(Self(id))
    }

    /// Generate a fresh random commit id.
    ///
    /// Uniqueness is not guaranteed here; the caller checks that no
    /// snapshot with this id exists before using it.
    pub fn generate() -> Self {
        let mut hex = uuid::Uuid::new_v4().simple().to_string();
        hex.push_str(&uuid::Uuid::new_v4().simple().to_string());
        hex.truncate(COMMIT_ID_LEN);
        Self(hex)
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get an abbreviated form of the id.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in a branch's commit log.
///
/// Serialized as `{"id": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
}

impl Commit {
    pub fn new(id: CommitId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}
