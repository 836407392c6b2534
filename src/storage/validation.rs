//! Path validation
//!
//! Resolves user-supplied paths against the base directory and rejects any
//! result that escapes it. Every storage operation goes through here before it
//! touches the filesystem.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Symlink hops followed before resolution gives up (matches Linux `MAXSYMLINKS`)
pub const MAX_SYMLINK_HOPS: usize = 40;

/// Resolves `user_path` below the canonical `base_dir`.
///
/// Leading `/` are stripped so absolute-looking input is taken relative to the
/// base. Empty input resolves to the base itself. `base_dir` must already be
/// canonical (see [`crate::server::AppState`]).
pub fn resolve_safe_path(base_dir: &Path, user_path: &str) -> Result<PathBuf, StorageError> {
    let clean = user_path.trim_start_matches('/');
    let resolved = resolve_lenient(base_dir, Path::new(clean))?;
    ensure_within(base_dir, &resolved, user_path)?;
    Ok(resolved)
}

/// Resolves `sub_path` relative to an already resolved `anchor`, under the same
/// confinement rules as [`resolve_safe_path`].
pub fn resolve_child(
    base_dir: &Path,
    anchor: &Path,
    sub_path: &str,
) -> Result<PathBuf, StorageError> {
    let clean = sub_path.trim_start_matches('/');
    let resolved = resolve_lenient(anchor, Path::new(clean))?;
    ensure_within(base_dir, &resolved, sub_path)?;
    Ok(resolved)
}

/// Expresses a resolved path from the base directory, always starting with `/`.
pub fn to_virtual_path(base_dir: &Path, real_path: &Path) -> String {
    let relative = real_path.strip_prefix(base_dir).unwrap_or(real_path);
    let joined = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// A filename accepted for upload: exactly one normal path component.
pub fn is_valid_filename(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !filename.contains(['/', '\\', '\0'])
}

fn ensure_within(base_dir: &Path, resolved: &Path, requested: &str) -> Result<(), StorageError> {
    if resolved.starts_with(base_dir) {
        Ok(())
    } else {
        Err(StorageError::AccessDenied(requested.to_string()))
    }
}

/// Non-strict realpath: follows every symlink that exists, collapses `.` and
/// `..`, and keeps components that do not exist yet as plain names.
fn resolve_lenient(start: &Path, relative: &Path) -> Result<PathBuf, StorageError> {
    let mut resolved = start.to_path_buf();
    let mut pending: VecDeque<OsString> = VecDeque::new();
    let mut hops = 0;

    push_components(&mut resolved, &mut pending, relative, false);

    while let Some(name) = pending.pop_front() {
        if name == ".." {
            resolved.pop();
            continue;
        }

        resolved.push(&name);
        let metadata = match fs::symlink_metadata(&resolved) {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => continue,
            Err(e) => return Err(StorageError::Io(e)),
        };
        if !metadata.file_type().is_symlink() {
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            return Err(StorageError::InvalidPath(format!(
                "too many levels of symbolic links: {}",
                resolved.display()
            )));
        }

        let target = fs::read_link(&resolved)?;
        resolved.pop();
        push_components(&mut resolved, &mut pending, &target, true);
    }

    Ok(resolved)
}

/// Queues the components of `path`. A root or prefix component restarts
/// resolution at that root.
fn push_components(
    resolved: &mut PathBuf,
    pending: &mut VecDeque<OsString>,
    path: &Path,
    front: bool,
) {
    let mut queued = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                *resolved = PathBuf::from(prefix.as_os_str());
                queued.clear();
            }
            Component::RootDir => {
                resolved.push(Component::RootDir.as_os_str());
                queued.clear();
            }
            Component::CurDir => {}
            Component::ParentDir => queued.push(OsString::from("..")),
            Component::Normal(name) => queued.push(name.to_os_string()),
        }
    }

    if front {
        for name in queued.into_iter().rev() {
            pending.push_front(name);
        }
    } else {
        pending.extend(queued);
    }
}

fn is_missing(e: &io::Error) -> bool {
    // ENOTDIR shows up when a parent component is a regular file
    e.kind() == io::ErrorKind::NotFound || e.kind() == io::ErrorKind::NotADirectory
}
