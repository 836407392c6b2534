//! Error types
//!
//! Defines domain-specific error types for each module of the file manager
//! and the boundary error every HTTP handler returns.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use std::io;

/// Authentication module errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,
    #[error("Incorrect username or password")]
    InvalidCredentials,
}

/// Storage module errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Path not found: {0}")]
    NotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Failed to zip folder: {0}")]
    Archive(String),
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl From<zip::result::ZipError> for StorageError {
    fn from(error: zip::result::ZipError) -> Self {
        StorageError::Archive(error.to_string())
    }
}

impl From<walkdir::Error> for StorageError {
    fn from(error: walkdir::Error) -> Self {
        match error.into_io_error() {
            Some(e) => StorageError::Io(e),
            None => StorageError::Io(io::Error::other("filesystem loop detected")),
        }
    }
}

/// Error returned at the HTTP boundary.
///
/// Each variant maps to exactly one status code; see [`super::handlers`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(AuthError),
    #[error("Access denied")]
    AccessDenied,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Unauthorized(error)
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::AccessDenied(_) => ApiError::AccessDenied,
            StorageError::NotFound(_) => ApiError::NotFound(error.to_string()),
            StorageError::InvalidPath(_)
            | StorageError::NotADirectory(_)
            | StorageError::AlreadyExists(_) => ApiError::BadRequest(error.to_string()),
            StorageError::Io(ref e) if e.kind() == io::ErrorKind::NotFound => {
                ApiError::NotFound(error.to_string())
            }
            StorageError::Archive(_) | StorageError::Io(_) => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(error: io::Error) -> Self {
        ApiError::from(StorageError::Io(error))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::BadRequest(error.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        ApiError::Internal(error.to_string())
    }
}
