//! Utility functions
//!
//! Provides logging setup and random token generation.

pub mod logging;
pub mod token;

pub use token::{is_scratch_file_name, random_token, scratch_file_name};
