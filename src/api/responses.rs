//! API responses
//!
//! JSON acknowledgments returned on success.

use serde::Serialize;

pub const AUTHENTICATED: &str = "authenticated";
pub const DELETED: &str = "deleted";
pub const CREATED: &str = "created";
pub const SUCCESS: &str = "success";

/// `{"status": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn new(status: &'static str) -> Self {
        Self { status }
    }
}

/// `{"info": "saved"}`, returned by uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedResponse {
    pub info: &'static str,
}

impl Default for SavedResponse {
    fn default() -> Self {
        Self { info: "saved" }
    }
}
