//! Shared request state
//!
//! Everything here is fixed at startup and only ever read by handlers.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::AdminCredentials;
use crate::config::ServerConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    base_dir: Arc<PathBuf>,
}

impl AppState {
    /// Canonicalizes the configured base directory. Fails if it is missing or
    /// not a directory.
    pub fn new(config: ServerConfig) -> io::Result<Self> {
        let base_dir = config.base_dir.canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("base directory {}: {}", config.base_dir.display(), e),
            )
        })?;
        if !base_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("base directory {} is not a directory", base_dir.display()),
            ));
        }

        Ok(Self {
            config: Arc::new(config),
            base_dir: Arc::new(base_dir),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Canonical base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn credentials(&self) -> &AdminCredentials {
        &self.config.admin
    }
}
