//! File system storage management
//!
//! Handles path confinement and the file operations it gates: listing,
//! upload placement, deletion, folder creation, move, copy, and archiving.

pub mod archive;
pub mod operations;
pub mod results;
pub mod validation;

// Re-export commonly used items
pub use archive::create_archive;
pub use operations::{
    copy_path, create_folder, delete_path, list_directory, move_path, prepare_download,
    store_upload,
};
pub use results::{DownloadSource, FileEntry};
pub use validation::{is_valid_filename, resolve_child, resolve_safe_path, to_virtual_path};
