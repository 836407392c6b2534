//! Server core functionality
//!
//! This module contains the HTTP server, its route table, the shared request
//! state, and front-end serving.

pub mod core;
pub mod frontend;
pub mod router;
pub mod state;

pub use self::core::Server;
pub use router::build_router;
pub use state::AppState;
