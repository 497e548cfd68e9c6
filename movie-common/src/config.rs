//! Configuration loading and config file resolution

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::auth::GOOGLE_USERINFO_URL;
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MOVIE_API_CONFIG";

/// Service configuration, read from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default tracing filter directive (RUST_LOG still wins)
    pub log_level: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Maximum accepted request body, bytes
    pub request_body_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub userinfo_url: String,
    /// Empty means every authenticated user is authorized
    pub authorized_emails: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            request_body_limit: 1024 * 1024,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: 10,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            authorized_emails: Vec::new(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line or via `MOVIE_API_CONFIG`; must be readable
    Explicit(PathBuf),
    /// Platform default location; may be absent
    Default(PathBuf),
    /// No file; compiled defaults
    Compiled,
}

/// Config file resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory (`<config_dir>/movie-api/config.toml`)
/// 4. Compiled defaults (fallback)
pub fn resolve_config_source(cli_arg: Option<&Path>, env_var_name: &str) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    if let Some(dir) = dirs::config_dir() {
        return ConfigSource::Default(dir.join("movie-api").join("config.toml"));
    }

    // Priority 4: Compiled defaults
    ConfigSource::Compiled
}

impl Config {
    /// Load configuration from the resolved source
    ///
    /// A missing default file falls back to compiled defaults; an explicit
    /// file that cannot be read is an error.
    pub fn load(source: &ConfigSource) -> Result<Self> {
        match source {
            ConfigSource::Explicit(path) => Self::from_file(path),
            ConfigSource::Default(path) if path.exists() => Self::from_file(path),
            ConfigSource::Default(_) | ConfigSource::Compiled => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.listen_addr.trim().is_empty() {
            return Err(Error::Config("server.listen_addr must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.auth.userinfo_url.trim().is_empty() {
            return Err(Error::Config("auth.userinfo_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Get OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("movie-api"))
        .unwrap_or_else(|| PathBuf::from("./movie_api_data"))
        .join("movies.db")
}
