//! HTTP API
//!
//! Request types, JSON responses, and the handlers behind `/api/*`.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Action, ActionRequest, DownloadQuery, ListQuery};
pub use responses::{SavedResponse, StatusResponse};
