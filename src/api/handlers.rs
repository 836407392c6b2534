//! Request handlers for the `/api` routes.
//!
//! Each handler resolves user paths through the storage layer, runs the
//! blocking filesystem work on tokio's blocking pool, and converts any failure
//! into an [`ApiError`] at the boundary.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::response::Response;
use log::info;

use crate::api::commands::{Action, ActionRequest, DownloadQuery, ListQuery};
use crate::api::responses::{
    AUTHENTICATED, CREATED, DELETED, SUCCESS, SavedResponse, StatusResponse,
};
use crate::error::{ApiError, StorageError};
use crate::server::AppState;
use crate::storage::archive::archive_stem;
use crate::storage::{self, DownloadSource, FileEntry};
use crate::transfer::{OCTET_STREAM, TempFile, ZIP, receive_upload, stream_file};
use crate::utils::scratch_file_name;

/// Runs a storage operation on the blocking pool.
async fn blocking<T, F>(operation: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(operation).await??)
}

/// `POST /api/login`: the auth middleware has already checked the credentials.
pub async fn login() -> Json<StatusResponse> {
    Json(StatusResponse::new(AUTHENTICATED))
}

/// `GET /api/files`
pub async fn list_files(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let Query(ListQuery { path }) = query?;
    let base_dir = state.base_dir().to_path_buf();

    let entries = blocking(move || storage::list_directory(&base_dir, &path)).await?;
    Ok(Json(entries))
}

/// `GET /api/download`: a file as-is, a directory as a temporary zip archive.
pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(DownloadQuery { path }) = query?;
    let base_dir = state.base_dir().to_path_buf();

    match blocking(move || storage::prepare_download(&base_dir, &path)).await? {
        DownloadSource::File(file) => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            stream_file(&file, &name, OCTET_STREAM, None).await
        }
        DownloadSource::Directory(dir) => {
            let download_name = format!("{}.zip", archive_stem(&dir));
            let archive_dir = state.config().archive_dir();
            let archive = blocking(move || storage::create_archive(&dir, &archive_dir)).await?;
            let guard = TempFile::new(archive.clone());
            stream_file(&archive, &download_name, ZIP, Some(guard)).await
        }
    }
}

/// `POST /api/upload`: multipart form with a `path` field and a `file` field.
///
/// Fields may arrive in either order, so the file is staged in the archive
/// directory and moved into place once the target is known and validated.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SavedResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut target_dir: Option<String> = None;
    let mut staged: Option<(String, TempFile)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "path" => target_dir = Some(field.text().await?),
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ApiError::BadRequest("Missing filename".into()))?;
                if !storage::is_valid_filename(&filename) {
                    return Err(ApiError::BadRequest(format!("Invalid filename: {filename}")));
                }

                let staging = TempFile::new(
                    state
                        .config()
                        .archive_dir()
                        .join(scratch_file_name("upload", "part")),
                );
                let received = receive_upload(field, staging.path()).await?;
                info!("Received upload '{}' ({} bytes)", filename, received);
                staged = Some((filename, staging));
            }
            _ => {}
        }
    }

    let target_dir =
        target_dir.ok_or_else(|| ApiError::BadRequest("Missing form field: path".into()))?;
    let (filename, staging) =
        staged.ok_or_else(|| ApiError::BadRequest("Missing form field: file".into()))?;

    let base_dir = state.base_dir().to_path_buf();
    blocking(move || {
        storage::store_upload(&base_dir, &target_dir, &filename, staging.path())?;
        staging.disarm();
        Ok(())
    })
    .await?;

    Ok(Json(SavedResponse::default()))
}

/// `POST /api/action`: delete, create_folder, move, or copy.
pub async fn file_action(
    State(state): State<AppState>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = payload?;
    let base_dir = state.base_dir().to_path_buf();

    let status = match request.action {
        Action::Delete => {
            blocking(move || storage::delete_path(&base_dir, &request.source_path)).await?;
            DELETED
        }
        Action::CreateFolder => {
            let folder = required_destination(&request, "Folder name required")?;
            blocking(move || storage::create_folder(&base_dir, &request.source_path, &folder))
                .await?;
            CREATED
        }
        Action::Move => {
            let dest = required_destination(&request, "Dest required")?;
            blocking(move || storage::move_path(&base_dir, &request.source_path, &dest)).await?;
            SUCCESS
        }
        Action::Copy => {
            let dest = required_destination(&request, "Dest required")?;
            blocking(move || storage::copy_path(&base_dir, &request.source_path, &dest)).await?;
            SUCCESS
        }
    };

    Ok(Json(StatusResponse::new(status)))
}

fn required_destination(request: &ActionRequest, message: &str) -> Result<String, ApiError> {
    request
        .destination()
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(message.into()))
}
