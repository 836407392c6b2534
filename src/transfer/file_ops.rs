//! Module `file_ops`
//!
//! Streams files to HTTP clients and receives multipart uploads onto disk.

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{error, info};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use super::cleanup::{CleanupStream, TempFile};
use crate::error::ApiError;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const ZIP: &str = "application/zip";

/// Streams `path` back as an attachment named `download_name`.
///
/// When `cleanup` is given, the file is removed after the body is dropped,
/// whether it was sent completely or not.
pub async fn stream_file(
    path: &Path,
    download_name: &str,
    content_type: &'static str,
    cleanup: Option<TempFile>,
) -> Result<Response, ApiError> {
    let file = File::open(path).await.map_err(|e| {
        error!("Failed to open {} for download: {}", path.display(), e);
        ApiError::from(e)
    })?;
    let length = file.metadata().await?.len();

    let disposition = HeaderValue::from_str(&content_disposition(download_name))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(
        "Starting download: {} as '{}' ({} bytes)",
        path.display(),
        download_name,
        length
    );

    let body = Body::from_stream(CleanupStream::new(ReaderStream::new(file), cleanup));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// `attachment` disposition, RFC 5987 encoded when the name is not plain ASCII.
pub fn content_disposition(filename: &str) -> String {
    let plain = filename
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    if plain {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename*=utf-8''{}",
            urlencoding::encode(filename)
        )
    }
}

/// Writes an upload field chunk by chunk into `destination`.
pub async fn receive_upload(mut field: Field<'_>, destination: &Path) -> Result<u64, ApiError> {
    let mut file = File::create(destination).await.map_err(|e| {
        error!("Failed to create upload file {}: {}", destination.display(), e);
        ApiError::from(e)
    })?;
    let mut total_bytes_received = 0u64;

    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        total_bytes_received += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(total_bytes_received)
}
