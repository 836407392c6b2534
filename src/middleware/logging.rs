//! Logging middleware
//!
//! Provides request logging functionality.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Log every request with its outcome and latency
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();

    if status.is_server_error() {
        warn!("{} {} -> {} ({:?})", method, path, status.as_u16(), started.elapsed());
    } else {
        info!("{} {} -> {} ({:?})", method, path, status.as_u16(), started.elapsed());
    }

    response
}
