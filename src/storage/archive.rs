//! Directory archiving
//!
//! Zips a directory tree into a uniquely named file in the archive directory.
//! Entry names are relative to the archived directory and use `/` separators.

use log::{debug, error, info};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::StorageError;
use crate::utils::{is_scratch_file_name, scratch_file_name};

/// Archive name used when the directory itself has no name (filesystem root)
const UNNAMED_ARCHIVE: &str = "archive";

/// Display name for an archived directory, without the `.zip` suffix.
pub fn archive_stem(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNNAMED_ARCHIVE.to_string())
}

/// Archives `dir` into `<archive_dir>/<dirname>_<token>.zip` and returns the
/// archive path. A partially written archive is removed on failure.
///
/// When `archive_dir` lies inside `dir`, the archive being written and every
/// other in-flight scratch file there are left out.
pub fn create_archive(dir: &Path, archive_dir: &Path) -> Result<PathBuf, StorageError> {
    let archive_path = archive_dir.join(scratch_file_name(&archive_stem(dir), "zip"));
    let scratch_dir = archive_dir
        .canonicalize()
        .unwrap_or_else(|_| archive_dir.to_path_buf());
    let root = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

    match write_archive(&root, &archive_path, &scratch_dir) {
        Ok(entries) => {
            info!(
                "Archived {} into {} ({} entries)",
                dir.display(),
                archive_path.display(),
                entries
            );
            Ok(archive_path)
        }
        Err(e) => {
            error!("Failed to archive {}: {}", dir.display(), e);
            let _ = fs::remove_file(&archive_path);
            Err(StorageError::Archive(e.to_string()))
        }
    }
}

fn write_archive(
    dir: &Path,
    archive_path: &Path,
    scratch_dir: &Path,
) -> Result<usize, StorageError> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);
    let mut entries = 0;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry?;
        if is_scratch_file(entry.path(), scratch_dir) {
            debug!("Skipping scratch file {}", entry.path().display());
            continue;
        }
        let name = entry_name(dir, entry.path())?;

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.path().is_file() {
            // Symlinks to regular files are archived with the target's contents
            zip.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, &mut zip)?;
        } else {
            debug!("Not archiving {}", entry.path().display());
            continue;
        }
        entries += 1;
    }

    zip.finish()?.flush()?;
    Ok(entries)
}

/// Whether `path` (or the file a symlink at `path` points to) is a temporary
/// archive or staged upload in `scratch_dir`.
fn is_scratch_file(path: &Path, scratch_dir: &Path) -> bool {
    let real = if path.is_symlink() {
        match path.canonicalize() {
            Ok(real) => real,
            Err(_) => return false,
        }
    } else {
        path.to_path_buf()
    };

    real.parent() == Some(scratch_dir)
        && real
            .file_name()
            .is_some_and(|name| is_scratch_file_name(&name.to_string_lossy()))
}

fn entry_name(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| StorageError::InvalidPath(path.display().to_string()))?;
    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/"))
}
