//! File system utilities for the staging tree.
//!
//! Provides idempotent directory handling, permission normalization before
//! removal, and deterministic directory listings.

use crate::staging::error::{Context, Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Removes a directory tree if it exists.
///
/// Every entry is made owner-writable first so read-only leftovers from a
/// previous run do not block the removal. Returns whether anything was removed.
pub async fn clear_dir(path: &Path) -> Result<bool> {
    if !fs::try_exists(path)
        .await
        .fs_context("checking directory", path)?
    {
        return Ok(false);
    }

    let root = path.to_path_buf();
    tokio::task::spawn_blocking(move || make_tree_writable(&root))
        .await
        .map_err(|e| Error::GenericError(format!("permission reset task panicked: {e}")))??;

    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

fn make_tree_writable(root: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry.context(format!("walking {}", root.display()))?;
        if entry.file_type().is_symlink() {
            continue;
        }
        let metadata = entry
            .metadata()
            .context(format!("reading {}", entry.path().display()))?;
        let mut permissions = metadata.permissions();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = permissions.mode();
            let wanted = if metadata.is_dir() { mode | 0o700 } else { mode | 0o600 };
            if wanted == mode {
                continue;
            }
            permissions.set_mode(wanted);
        }
        #[cfg(not(unix))]
        {
            if !permissions.readonly() {
                continue;
            }
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
        }

        std::fs::set_permissions(entry.path(), permissions)
            .fs_context("making writable", entry.path())?;
    }
    Ok(())
}

/// Creates all of the directories of the specified path. Succeeds if it exists.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Creates a directory that must not exist yet.
///
/// A leftover from an earlier run is removed and recreated, with a warning;
/// its previous contents are never merged with the new ones.
pub async fn create_fresh_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }
    match fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            log::warn!(
                "{} is left over from a previous run, recreating it",
                path.display()
            );
            if !clear_dir(path).await? {
                return Err(Error::StagingDirConflict(path.to_path_buf()));
            }
            fs::create_dir(path)
                .await
                .map_err(|_| Error::StagingDirConflict(path.to_path_buf()))
        }
        Err(e) => Err(e).fs_context("creating directory", path),
    }
}

/// Copies a regular file, failing if the source is missing or not a file.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let metadata = fs::metadata(from).await.fs_context("reading", from)?;
    if !metadata.is_file() {
        crate::bail!("{} is not a file", from.display());
    }
    fs::copy(from, to).await.fs_context("copying to", to)?;
    Ok(())
}

/// Removes a file, treating an already missing file as success.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing file", path),
    }
}

/// Lists regular files directly inside `dir`, sorted by name.
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await.fs_context("reading directory", dir)?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading directory entry", dir)?
    {
        let file_type = entry
            .file_type()
            .await
            .fs_context("reading file type", entry.path())?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Whether `path` has the given extension.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}
