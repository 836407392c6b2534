//! Temporary file cleanup
//!
//! A [`TempFile`] removes its file when dropped. Removal is handed to the
//! blocking pool and never waited on; failures are logged and ignored.
//! [`CleanupStream`] ties a guard to a response body so the file disappears
//! once the body has been sent or abandoned.

use bytes::Bytes;
use futures_util::Stream;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Owns a temporary file on disk until dropped
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keeps the file on disk, e.g. after it has been renamed into place.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_quietly(&path));
            }
            Err(_) => remove_quietly(&path),
        }
    }
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed temporary file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temporary file {}: {}", path.display(), e),
    }
}

/// Body stream that keeps an optional [`TempFile`] alive until the stream is dropped
pub struct CleanupStream<S> {
    inner: S,
    _guard: Option<TempFile>,
}

impl<S> CleanupStream<S> {
    pub fn new(inner: S, guard: Option<TempFile>) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }
}

impl<S> Stream for CleanupStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
