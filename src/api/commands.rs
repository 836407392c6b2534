//! API request types
//!
//! Query strings and JSON bodies accepted by the `/api` routes.

use serde::Deserialize;

/// Mutation requested through `POST /api/action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Delete,
    CreateFolder,
    Move,
    Copy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: Action,
    pub source_path: String,
    #[serde(default)]
    pub dest_path: Option<String>,
}

impl ActionRequest {
    /// `dest_path`, treating an empty string as absent
    pub fn destination(&self) -> Option<&str> {
        self.dest_path.as_deref().filter(|dest| !dest.is_empty())
    }
}

/// `GET /api/files?path=...`; a missing path lists the base directory
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub path: String,
}

/// `GET /api/download?path=...`
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadQuery {
    pub path: String,
}
