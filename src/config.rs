//! Configuration management for RAX File Manager
//!
//! Configuration is loaded once at startup from built-in defaults, an optional
//! `config.toml`, and `RAX_FM_*` environment variables. It is immutable for the
//! lifetime of the process and handed to request handlers behind an `Arc`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::auth::AdminCredentials;

/// Prefix for environment overrides, e.g. `RAX_FM_BASE_DIR`
pub const ENV_PREFIX: &str = "RAX_FM";

/// Locations searched for `config.toml`, in order
const CONFIG_PATHS: [&str; 2] = [
    "rax-file-manager/config", // Docker production: /app/rax-file-manager/config.toml
    "config",                  // Local development: ./config.toml
];

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK (restart required) ═══
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    // ═══ STORAGE ═══
    /// Root below which every file operation is confined
    pub base_dir: PathBuf,

    /// Directory holding the prebuilt front-end (`index.html`, `assets/`)
    pub static_dir: PathBuf,

    /// Where directory downloads are archived; OS temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    // ═══ AUTHENTICATION ═══
    #[serde(flatten)]
    pub admin: AdminCredentials,
}

impl ServerConfig {
    /// Load configuration from config.toml (if present) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;
        for config_path in CONFIG_PATHS {
            if Path::new(&format!("{config_path}.toml")).exists() {
                builder = builder.add_source(File::with_name(config_path));
                break;
            }
        }

        let config: ServerConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from a TOML document layered over the defaults
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = Self::defaults()?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 8059_i64)?
            .set_default("base_dir", "/")?
            .set_default("static_dir", "static")?
            .set_default("admin_username", "admin")?
            .set_default("admin_password", "")
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message("base_dir cannot be empty".into()));
        }

        if self.admin.username().is_empty() {
            return Err(ConfigError::Message(
                "admin_username cannot be empty".into(),
            ));
        }

        if self.admin.password().is_empty() {
            return Err(ConfigError::Message(format!(
                "admin_password must be set (config.toml or {ENV_PREFIX}_ADMIN_PASSWORD)"
            )));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Directory temporary zip archives are written to
    pub fn archive_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Path of the front-end entry document
    pub fn index_file(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }

    /// Directory served under `/assets`
    pub fn assets_dir(&self) -> PathBuf {
        self.static_dir.join("assets")
    }
}
