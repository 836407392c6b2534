//! Transfer module for the file manager
//!
//! Handles streaming downloads, receiving uploads, and the lifecycle of the
//! temporary files both of them create.

pub mod cleanup;
pub mod file_ops;

// Re-export key types and functions
pub use cleanup::{CleanupStream, TempFile};
pub use file_ops::{OCTET_STREAM, ZIP, content_disposition, receive_upload, stream_file};
