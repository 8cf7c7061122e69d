//! core::resolver
//!
//! Commit reference resolution.
//!
//! # Grammar
//!
//! ```text
//! reference := "HEAD" "^"*      relative to the end of the branch's log
//!            | <commit id>      literal, existence is checked by the caller
//! ```
//!
//! # History model
//!
//! A branch's history is its own flat commit log, not a parent-linked
//! graph. `HEAD^` is always the previous entry of *this branch's* log. A
//! branch created from another copies that log by value, so after a branch
//! point the two logs share a prefix and then diverge independently; `HEAD^`
//! never follows a parent link into another branch. This can differ from
//! what git would answer for the same sequence of operations.
//!
//! # Example
//!
//! ```
//! use dvol::core::resolver::resolve;
//! use dvol::core::types::{Commit, CommitId};
//!
//! let log = vec![
//!     Commit::new(CommitId::new("c1").unwrap(), "one"),
//!     Commit::new(CommitId::new("c2").unwrap(), "two"),
//! ];
//!
//! assert_eq!(resolve(&log, "HEAD").unwrap().as_str(), "c2");
//! assert_eq!(resolve(&log, "HEAD^").unwrap().as_str(), "c1");
//! assert!(resolve(&log, "HEAD^^").is_err());
//! ```

use thiserror::Error;

use super::types::{Commit, CommitId};

const HEAD: &str = "HEAD";

/// Errors from reference resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("referenced commit does not exist: {0}")]
    NoSuchCommit(String),

    #[error("malformed reference '{0}'")]
    Malformed(String),
}

/// A parsed commit reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `HEAD` followed by `offset` carets.
    Head { offset: usize },
    /// A literal commit id.
    Id(CommitId),
}

impl Reference {
    /// Parse a reference string.
    ///
    /// Anything starting with `HEAD` must be followed only by carets. A
    /// literal that cannot be a commit id is reported as a missing commit.
    pub fn parse(reference: &str) -> Result<Self, ResolveError> {
        if let Some(rest) = reference.strip_prefix(HEAD) {
            if !rest.chars().all(|c| c == '^') {
                return Err(ResolveError::Malformed(reference.to_string()));
            }
            return Ok(Reference::Head { offset: rest.len() });
        }

        CommitId::new(reference)
            .map(Reference::Id)
            .map_err(|_| ResolveError::NoSuchCommit(reference.to_string()))
    }
}

/// Resolve `reference` against a branch's commits (oldest first).
///
/// Relative references index back from the end of the log. Literal ids are
/// returned as-is without checking that they appear in `commits`.
pub fn resolve(commits: &[Commit], reference: &str) -> Result<CommitId, ResolveError> {
    match Reference::parse(reference)? {
        Reference::Head { offset } => {
            if offset >= commits.len() {
                return Err(ResolveError::NoSuchCommit(reference.to_string()));
            }
            Ok(commits[commits.len() - 1 - offset].id.clone())
        }
        Reference::Id(id) => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(ids: &[&str]) -> Vec<Commit> {
        ids.iter()
            .map(|id| Commit::new(CommitId::new(*id).unwrap(), format!("msg {}", id)))
            .collect()
    }

    #[test]
    fn head_arithmetic() {
        let commits = log(&["c1", "c2", "c3"]);
        assert_eq!(resolve(&commits, "HEAD").unwrap().as_str(), "c3");
        assert_eq!(resolve(&commits, "HEAD^").unwrap().as_str(), "c2");
        assert_eq!(resolve(&commits, "HEAD^^").unwrap().as_str(), "c1");
        assert_eq!(
            resolve(&commits, "HEAD^^^"),
            Err(ResolveError::NoSuchCommit("HEAD^^^".to_string()))
        );
    }

    #[test]
    fn head_on_empty_log() {
        assert!(matches!(
            resolve(&[], "HEAD"),
            Err(ResolveError::NoSuchCommit(_))
        ));
    }

    #[test]
    fn malformed_head() {
        let commits = log(&["c1"]);
        assert_eq!(
            resolve(&commits, "HEAD~1"),
            Err(ResolveError::Malformed("HEAD~1".to_string()))
        );
        assert!(matches!(
            resolve(&commits, "HEADS"),
            Err(ResolveError::Malformed(_))
        ));
        assert!(matches!(
            resolve(&commits, "HEAD^x^"),
            Err(ResolveError::Malformed(_))
        ));
    }

    #[test]
    fn literal_ids_pass_through() {
        let commits = log(&["c1"]);
        assert_eq!(resolve(&commits, "deadbeef").unwrap().as_str(), "deadbeef");
    }

    #[test]
    fn unusable_literal_is_missing_commit() {
        assert!(matches!(
            resolve(&[], "../etc"),
            Err(ResolveError::NoSuchCommit(_))
        ));
    }

    #[test]
    fn lowercase_head_is_a_literal() {
        let commits = log(&["c1"]);
        assert_eq!(resolve(&commits, "head").unwrap().as_str(), "head");
    }
}
