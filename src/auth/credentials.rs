//! Credential storage
//!
//! The admin identity is read from configuration once at startup.

use serde::Deserialize;
use std::fmt;

/// The single administrator allowed to use the API
#[derive(Clone, Deserialize)]
pub struct AdminCredentials {
    #[serde(rename = "admin_username")]
    username: String,
    #[serde(rename = "admin_password")]
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
