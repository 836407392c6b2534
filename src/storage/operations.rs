//! Storage operations
//!
//! Filesystem operations behind the HTTP API: list, download preparation,
//! upload placement, delete, create folder, move, and copy. Every function
//! takes the canonical base directory and raw user input, and resolves the
//! input through [`crate::storage::validation`] before touching the disk.

use log::{debug, error, info, warn};
use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::StorageError;
use crate::storage::results::{DownloadSource, FileEntry};
use crate::storage::validation::{
    is_valid_filename, resolve_child, resolve_safe_path, to_virtual_path,
};

/// Lists a directory: directories first, then files, each group sorted
/// case-insensitively. Entries that cannot be stat'd are skipped.
pub fn list_directory(base_dir: &Path, user_path: &str) -> Result<Vec<FileEntry>, StorageError> {
    let real_path = resolve_safe_path(base_dir, user_path)?;
    let virtual_path = to_virtual_path(base_dir, &real_path);

    let metadata = stat_existing(&real_path, &virtual_path)?;
    if !metadata.is_dir() {
        return Err(StorageError::NotADirectory(virtual_path));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(&real_path)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", real_path.display(), e);
                continue;
            }
        };

        let entry_path = entry.path();
        // Follows symlinks, so a link to a directory lists as a directory
        let metadata = match fs::metadata(&entry_path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Skipping {} (stat failed: {})", entry_path.display(), e);
                continue;
            }
        };

        let is_dir = metadata.is_dir();
        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            size: if is_dir { 0 } else { metadata.len() },
            path: to_virtual_path(base_dir, &real_path.join(entry.file_name())),
        });
    }

    entries.sort_by_cached_key(|e| (!e.is_dir, e.name.to_lowercase()));

    info!(
        "Listed directory {} (real: {}) - {} entries",
        virtual_path,
        real_path.display(),
        entries.len()
    );

    Ok(entries)
}

/// Resolves a download target and reports whether it is a file or a directory.
pub fn prepare_download(base_dir: &Path, user_path: &str) -> Result<DownloadSource, StorageError> {
    let real_path = resolve_safe_path(base_dir, user_path)?;
    let virtual_path = to_virtual_path(base_dir, &real_path);
    let metadata = stat_existing(&real_path, &virtual_path)?;

    info!(
        "Prepared download for {} (real: {})",
        virtual_path,
        real_path.display()
    );

    if metadata.is_dir() {
        Ok(DownloadSource::Directory(real_path))
    } else {
        Ok(DownloadSource::File(real_path))
    }
}

/// Moves a fully received upload from `staged` to `<target dir>/<filename>`,
/// replacing any existing file of that name.
pub fn store_upload(
    base_dir: &Path,
    user_dir: &str,
    filename: &str,
    staged: &Path,
) -> Result<PathBuf, StorageError> {
    let target_dir = resolve_safe_path(base_dir, user_dir)?;
    if !target_dir.is_dir() {
        return Err(StorageError::NotADirectory(format!(
            "Invalid directory: {}",
            to_virtual_path(base_dir, &target_dir)
        )));
    }

    if !is_valid_filename(filename) {
        return Err(StorageError::InvalidPath(format!("Invalid filename: {filename}")));
    }
    let file_path = resolve_child(base_dir, &target_dir, filename)?;
    if file_path.is_dir() {
        return Err(StorageError::AlreadyExists(to_virtual_path(base_dir, &file_path)));
    }

    relocate(staged, &file_path)?;

    info!(
        "Stored upload {} (virtual: {}, real: {})",
        filename,
        to_virtual_path(base_dir, &file_path),
        file_path.display()
    );

    Ok(file_path)
}

/// Deletes a file, or a directory with everything below it.
pub fn delete_path(base_dir: &Path, user_path: &str) -> Result<(), StorageError> {
    let real_path = resolve_safe_path(base_dir, user_path)?;
    let virtual_path = to_virtual_path(base_dir, &real_path);
    if real_path == base_dir {
        return Err(StorageError::InvalidPath(
            "The base directory cannot be deleted".into(),
        ));
    }

    let metadata = stat_existing(&real_path, &virtual_path)?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(&real_path)
    } else {
        fs::remove_file(&real_path)
    };

    match result {
        Ok(()) => {
            info!("Deleted {} (real: {})", virtual_path, real_path.display());
            Ok(())
        }
        Err(e) => {
            error!(
                "Failed to delete {} (real: {}): {}",
                virtual_path,
                real_path.display(),
                e
            );
            Err(StorageError::from(e))
        }
    }
}

/// Creates `sub_path` (and any missing parents) below the resolved `user_path`.
/// An existing folder is not an error.
pub fn create_folder(
    base_dir: &Path,
    user_path: &str,
    sub_path: &str,
) -> Result<PathBuf, StorageError> {
    let anchor = resolve_safe_path(base_dir, user_path)?;
    let folder = resolve_child(base_dir, &anchor, sub_path)?;

    fs::create_dir_all(&folder).map_err(|e| {
        error!("Failed to create folder {}: {}", folder.display(), e);
        StorageError::from(e)
    })?;

    info!(
        "Created folder {} (real: {})",
        to_virtual_path(base_dir, &folder),
        folder.display()
    );

    Ok(folder)
}

/// Moves `source` into the directory `dest_dir`, keeping its name.
pub fn move_path(base_dir: &Path, source: &str, dest_dir: &str) -> Result<PathBuf, StorageError> {
    let (src, target) = prepare_transfer(base_dir, source, dest_dir)?;

    relocate(&src, &target)?;

    info!(
        "Moved {} -> {}",
        to_virtual_path(base_dir, &src),
        to_virtual_path(base_dir, &target)
    );

    Ok(target)
}

/// Copies `source` into the directory `dest_dir`, keeping its name.
/// Directories are copied recursively; files keep permissions and timestamps.
pub fn copy_path(base_dir: &Path, source: &str, dest_dir: &str) -> Result<PathBuf, StorageError> {
    let (src, target) = prepare_transfer(base_dir, source, dest_dir)?;
    if fs::symlink_metadata(&target).is_ok() {
        return Err(StorageError::AlreadyExists(to_virtual_path(base_dir, &target)));
    }

    let result = if src.is_dir() {
        copy_tree(&src, &target)
    } else {
        copy_file(&src, &target).map_err(StorageError::from)
    };
    if let Err(e) = result {
        error!(
            "Failed to copy {} -> {}: {}",
            src.display(),
            target.display(),
            e
        );
        discard_partial(&target);
        return Err(e);
    }

    info!(
        "Copied {} -> {}",
        to_virtual_path(base_dir, &src),
        to_virtual_path(base_dir, &target)
    );

    Ok(target)
}

/// Resolves both sides of a move/copy and computes `<dest>/<source name>`.
fn prepare_transfer(
    base_dir: &Path,
    source: &str,
    dest_dir: &str,
) -> Result<(PathBuf, PathBuf), StorageError> {
    let src = resolve_safe_path(base_dir, source)?;
    if src == base_dir {
        return Err(StorageError::InvalidPath(
            "The base directory cannot be moved or copied".into(),
        ));
    }
    stat_existing(&src, &to_virtual_path(base_dir, &src))?;

    let dest = resolve_safe_path(base_dir, dest_dir)?;
    let dest_virtual = to_virtual_path(base_dir, &dest);
    match fs::metadata(&dest) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Err(StorageError::NotADirectory(dest_virtual)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(format!(
                "Destination directory {dest_virtual}"
            )));
        }
        Err(e) => return Err(StorageError::Io(e)),
    }

    let name = src
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(source.to_string()))?;
    let target = dest.join(name);

    if target == src {
        return Err(StorageError::InvalidPath(
            "Source and destination are the same".into(),
        ));
    }
    if target.starts_with(&src) {
        return Err(StorageError::InvalidPath(
            "Cannot place a directory inside itself".into(),
        ));
    }

    Ok((src, target))
}

/// Renames `from` to `to`, falling back to copy-then-delete across filesystems.
fn relocate(from: &Path, to: &Path) -> Result<(), StorageError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(
                "Rename across devices, copying {} -> {}",
                from.display(),
                to.display()
            );
            copy_then_remove(from, to)
        }
        Err(e) => {
            error!(
                "Failed to move {} -> {}: {}",
                from.display(),
                to.display(),
                e
            );
            Err(StorageError::from(e))
        }
    }
}

/// Copies `from` to `to`, then removes `from`. A copy that fails partway is
/// discarded so the source stays the only version.
fn copy_then_remove(from: &Path, to: &Path) -> Result<(), StorageError> {
    let copied = if from.is_dir() {
        copy_tree(from, to)
    } else {
        copy_file(from, to).map_err(StorageError::from)
    };
    if let Err(e) = copied {
        error!(
            "Failed to copy {} -> {}: {}",
            from.display(),
            to.display(),
            e
        );
        discard_partial(to);
        return Err(e);
    }

    if from.is_dir() {
        fs::remove_dir_all(from)?;
    } else {
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Removes whatever a failed copy left at `path`.
fn discard_partial(path: &Path) {
    let removed = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    match removed {
        Ok(()) => debug!("Removed partial copy {}", path.display()),
        Err(e) => warn!("Failed to remove partial copy {}: {}", path.display(), e),
    }
}

/// Copies file contents and permissions, then carries over the timestamps.
///
/// The copy is reopened without write access, so read-only sources copy too.
fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;

    let metadata = fs::metadata(from)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    fs::File::open(to)?.set_times(times)
}

/// Recursive directory copy. Symlinks are recreated rather than followed.
fn copy_tree(from: &Path, to: &Path) -> Result<(), StorageError> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| StorageError::InvalidPath(entry.path().display().to_string()))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, _to: &Path) -> io::Result<()> {
    warn!("Skipping symlink {} during copy", from.display());
    Ok(())
}

fn stat_existing(real_path: &Path, virtual_path: &str) -> Result<fs::Metadata, StorageError> {
    fs::metadata(real_path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(virtual_path.to_string()),
        _ => StorageError::Io(e),
    })
}
