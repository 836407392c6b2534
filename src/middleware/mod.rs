//! Server middleware
//!
//! Provides request logging and cross-origin middleware.

pub mod cors;
pub mod logging;

pub use cors::permissive_cors;
pub use logging::log_request;
