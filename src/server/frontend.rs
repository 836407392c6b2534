//! Front-end serving
//!
//! The prebuilt bundle's `index.html` is served at `/` and for every route
//! nothing else matched, so client-side routing works without a proxy rule.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use log::debug;
use serde_json::json;

use crate::server::AppState;

/// Serves `index.html` for `/` and every unmatched route.
pub async fn serve_index(State(state): State<AppState>) -> Response {
    let index = state.config().index_file();
    match tokio::fs::read(&index).await {
        Ok(contents) => Html(contents).into_response(),
        Err(e) => {
            debug!("No front-end at {}: {}", index.display(), e);
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Frontend not found" })),
            )
                .into_response()
        }
    }
}
