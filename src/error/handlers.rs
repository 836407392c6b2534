//! Error handlers
//!
//! Converts boundary errors into HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde::Serialize;

use crate::error::types::ApiError;

/// JSON body attached to every API error
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ApiError::AccessDenied => StatusCode::FORBIDDEN,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = error_to_status(&self);
        match &self {
            ApiError::Internal(msg) => error!("Request failed: {}", msg),
            ApiError::AccessDenied => warn!("Rejected path outside the base directory"),
            _ => {}
        }

        let body = Json(ErrorBody {
            detail: self.to_string(),
        });
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        }
        response
    }
}
