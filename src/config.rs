//! Configuration management for the upload server
//!
//! Values come from built-in defaults, then an optional `config.toml`, then
//! `USERUPLOAD_*` environment variables. The result is immutable for the
//! lifetime of the process.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Locations searched for `config.toml`, first match wins.
const CONFIG_PATHS: [&str; 2] = [
    "userupload-server/config", // container layout: /app/userupload-server/config.toml
    "config",                   // local development: ./config.toml
];

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the listener to
    pub bind_address: String,

    /// Port for the listener
    pub port: u16,

    /// Directory uploads are stored in
    /// Environment: USERUPLOAD_STORAGE_ROOT
    pub storage_root: String,

    /// Maximum concurrent clients
    pub max_clients: usize,

    /// Maximum length of a command or item header line
    pub max_command_length: usize,

    /// Maximum number of files in a single UPLD batch
    pub max_batch_files: usize,

    /// Maximum size of a single uploaded file in MB
    pub max_upload_size_mb: u64,
}

impl ServerConfig {
    /// Load configuration from the first `config.toml` found, with
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        if let Some(path) = CONFIG_PATHS
            .iter()
            .find(|path| Path::new(&format!("{path}.toml")).is_file())
        {
            builder = builder.add_source(File::with_name(path));
        }

        Self::finish(builder)
    }

    /// Load configuration from an explicit file, with environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::finish(Self::defaults()?.add_source(File::from(path)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("port", 2121_i64)?
            .set_default("storage_root", "")?
            .set_default("max_clients", 10_i64)?
            .set_default("max_command_length", 512_i64)?
            .set_default("max_batch_files", 32_i64)?
            .set_default("max_upload_size_mb", 100_i64)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ServerConfig = builder
            .add_source(Environment::with_prefix("USERUPLOAD").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message(
                "storage_root cannot be empty (set USERUPLOAD_STORAGE_ROOT)".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        if self.max_batch_files == 0 {
            return Err(ConfigError::Message(
                "max_batch_files must be greater than 0".into(),
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.max_upload_size_mb.checked_mul(1024 * 1024).is_none() {
            return Err(ConfigError::Message(
                "max_upload_size_mb is too large".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}
