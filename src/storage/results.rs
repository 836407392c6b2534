//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;
use std::path::PathBuf;

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes, 0 for directories
    pub size: u64,
    /// Location expressed from the base directory, e.g. `/docs/readme.txt`
    pub path: String,
}

/// What a download request resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    File(PathBuf),
    Directory(PathBuf),
}
