//! Site configuration
//!
//! Values come from built-in defaults overridden by `RECIPES_*` environment
//! variables, e.g. `RECIPES_PORT=8080` or `RECIPES_UPLOAD_DIR=/srv/uploads`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

/// Uploads are capped at 3 MiB per request
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Web service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory recipe images are written to and served from
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
    /// Session lifetime in seconds, refreshed whenever the session is written
    pub session_ttl_secs: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl AppConfig {
    /// Load the configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("RECIPES"))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 5000_i64)?
            .set_default("upload_dir", "static/uploads")?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("session_ttl_secs", 604_800_i64)?
            .set_default("secure_cookies", false)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Address the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("static/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_secs: 604_800,
            secure_cookies: false,
        }
    }
}
