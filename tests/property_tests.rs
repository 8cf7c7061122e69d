//! Property-based tests for names and reference resolution.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use dvol::core::naming::{validate_name, MAX_NAME_LENGTH};
use dvol::core::resolver::{resolve, Reference, ResolveError};
use dvol::core::types::{BranchName, Commit, CommitId, VolumeName};

/// Strategy for generating valid volume and branch names.
fn valid_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,39}"
}

/// Strategy for a log of `n` distinct commits.
fn commit_log(max: usize) -> impl Strategy<Value = Vec<Commit>> {
    (0..=max).prop_map(|n| {
        (0..n)
            .map(|i| Commit::new(CommitId::generate(), format!("commit {}", i)))
            .collect()
    })
}

proptest! {
    #[test]
    fn valid_names_accepted(name in valid_name()) {
        prop_assert!(validate_name(&name).is_ok());
        prop_assert!(VolumeName::new(name.clone()).is_ok());
        prop_assert!(BranchName::new(name).is_ok());
    }

    #[test]
    fn names_with_separators_rejected(
        left in valid_name(),
        sep in prop_oneof![Just('/'), Just('\\')],
        right in valid_name(),
    ) {
        let name = format!("{}{}{}", left, sep, right);
        prop_assert!(validate_name(&name).is_err());
        prop_assert!(VolumeName::new(name).is_err());
    }

    #[test]
    fn overlong_names_rejected(name in "[a-z]{41,80}") {
        prop_assert!(name.len() > MAX_NAME_LENGTH);
        prop_assert!(validate_name(&name).is_err());
    }

    #[test]
    fn validated_names_are_single_segments(name in "\\PC{1,50}") {
        if validate_name(&name).is_ok() {
            let path = std::path::Path::new(&name);
            prop_assert_eq!(path.components().count(), 1);
            prop_assert!(!name.contains(".."));
        }
    }

    #[test]
    fn head_offsets_walk_the_log(log in commit_log(8), offset in 0usize..12) {
        let reference = format!("HEAD{}", "^".repeat(offset));
        let result = resolve(&log, &reference);

        if offset < log.len() {
            prop_assert_eq!(result, Ok(log[log.len() - 1 - offset].id.clone()));
        } else {
            prop_assert_eq!(result, Err(ResolveError::NoSuchCommit(reference)));
        }
    }

    #[test]
    fn head_with_other_suffix_is_malformed(suffix in "[~0-9a-z]{1,5}") {
        let reference = format!("HEAD{}", suffix);
        prop_assert_eq!(
            Reference::parse(&reference),
            Err(ResolveError::Malformed(reference.clone()))
        );
    }

    #[test]
    fn literal_ids_pass_through(log in commit_log(4)) {
        let id = CommitId::generate();
        prop_assert_eq!(resolve(&log, id.as_str()), Ok(id));
    }
}
