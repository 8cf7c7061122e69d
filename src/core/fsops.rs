//! core::fsops
//!
//! Filesystem primitives used by the store: whole-tree copies, atomic file
//! replacement and permission fixes.
//!
//! # Tree copies
//!
//! Snapshots are full copies of a working tree. The copy is delegated to
//! `cp -a`, which preserves symlinks, FIFOs, device nodes, ownership and
//! permission bits; a hand-rolled walk would silently drop special files.
//!
//! # Invariants
//!
//! - The destination of a copy must not exist beforehand
//! - A failed copy never leaves a destination directory behind

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use log::{debug, warn};
use thiserror::Error;

/// Errors from tree copies.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("cannot copy {from} to {to} because it exists")]
    DestinationExists { from: PathBuf, to: PathBuf },

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to run cp: {0}")]
    Spawn(#[source] io::Error),

    #[error("copying {from} to {to} failed: {stderr}")]
    Failed {
        from: PathBuf,
        to: PathBuf,
        stderr: String,
    },

    #[error("copy i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Copy the directory `from` to the new path `to`, preserving special files.
///
/// `to` must not exist. On failure any partially written `to` is removed
/// before the error is returned.
pub fn copy_tree(from: &Path, to: &Path) -> Result<(), CopyError> {
    let meta = fs::metadata(from)?;
    if !meta.is_dir() {
        return Err(CopyError::NotADirectory(from.to_path_buf()));
    }
    if fs::symlink_metadata(to).is_ok() {
        return Err(CopyError::DestinationExists {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }

    debug!("cp -a {} {}", from.display(), to.display());
    let output = Command::new("cp")
        .arg("-a")
        .arg(from)
        .arg(to)
        .output()
        .map_err(CopyError::Spawn)?;

    if !output.status.success() {
        discard_partial(to);
        return Err(CopyError::Failed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Remove a partially copied destination, logging rather than failing.
fn discard_partial(path: &Path) {
    if fs::symlink_metadata(path).is_err() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(path) {
        warn!("could not clean up partial copy {}: {}", path.display(), e);
    }
}

/// Remove a directory tree if it exists.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Make a directory world-writable (`chmod a=rwx`).
///
/// Working trees are bind-mounted into containers whose processes may run
/// as any uid, and it is the permissions of the symlink target that govern
/// the mount.
pub fn make_world_writable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o777))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Replace the file at `path` with `contents` atomically.
///
/// Writes to a sibling temp file, syncs it, then renames over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_tree_copies_contents() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("src");
        fs::create_dir_all(from.join("nested")).unwrap();
        fs::write(from.join("file.txt"), "alpha").unwrap();
        fs::write(from.join("nested/inner.txt"), "beta").unwrap();

        let to = temp.path().join("dst");
        copy_tree(&from, &to).expect("copy");

        assert_eq!(fs::read_to_string(to.join("file.txt")).unwrap(), "alpha");
        assert_eq!(
            fs::read_to_string(to.join("nested/inner.txt")).unwrap(),
            "beta"
        );
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_preserves_symlinks_and_modes() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("src");
        fs::create_dir_all(&from).unwrap();
        fs::write(from.join("script.sh"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(from.join("script.sh"), fs::Permissions::from_mode(0o750)).unwrap();
        std::os::unix::fs::symlink("script.sh", from.join("link")).unwrap();

        let to = temp.path().join("dst");
        copy_tree(&from, &to).expect("copy");

        let link = fs::symlink_metadata(to.join("link")).unwrap();
        assert!(link.file_type().is_symlink());
        assert_eq!(
            fs::read_link(to.join("link")).unwrap(),
            PathBuf::from("script.sh")
        );
        let mode = fs::metadata(to.join("script.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn copy_tree_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("src");
        let to = temp.path().join("dst");
        fs::create_dir_all(&from).unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(to.join("keep.txt"), "keep").unwrap();

        let err = copy_tree(&from, &to).unwrap_err();
        assert!(matches!(err, CopyError::DestinationExists { .. }));
        assert_eq!(fs::read_to_string(to.join("keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn copy_tree_requires_directory_source() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("file");
        fs::write(&from, "x").unwrap();

        let err = copy_tree(&from, &temp.path().join("dst")).unwrap_err();
        assert!(matches!(err, CopyError::NotADirectory(_)));
    }

    #[test]
    fn copy_tree_missing_source_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = copy_tree(&temp.path().join("nope"), &temp.path().join("dst")).unwrap_err();
        assert!(matches!(err, CopyError::Io(_)));
        assert!(!temp.path().join("dst").exists());
    }

    #[test]
    fn write_atomic_replaces_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!temp.path().join(".data.json.tmp").exists());
    }

    #[test]
    fn remove_tree_ignores_missing() {
        let temp = TempDir::new().unwrap();
        remove_tree(&temp.path().join("missing")).expect("missing is fine");
    }

    #[cfg(unix)]
    #[test]
    fn world_writable_mode() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("tree");
        fs::create_dir(&dir).unwrap();
        make_world_writable(&dir).unwrap();
        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }
}
