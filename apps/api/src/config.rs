//! # API Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PORT=3001  JWT_SECRET=...  SAORI_DB_PATH=./data/saori.db            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $SAORI_CONFIG, else <config dir>/saori.toml                        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     127.0.0.1:3001, <data dir>/saori.db                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # saori.toml
//! host = "0.0.0.0"
//! port = 3001
//! database_path = "/var/lib/saori/saori.db"
//! jwt_access_lifetime_secs = 28800
//! cors_origins = ["http://localhost:5173"]
//! ```
//!
//! ## JWT Secret
//! A configured secret must have at least 32 characters. Without one, a
//! random secret is generated once and kept in `<data dir>/secrets/jwt.secret`
//! so sessions survive restarts.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Minimum accepted length of a configured JWT secret.
pub const MIN_SECRET_LEN: usize = 32;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind.
    pub host: String,

    pub port: u16,

    /// Directory for the database file and generated secrets.
    pub data_dir: PathBuf,

    /// SQLite database file. Defaults to `<data_dir>/saori.db`.
    pub database_path: Option<PathBuf>,

    /// Secret for signing session tokens.
    pub jwt_secret: Option<String>,

    /// Access token lifetime in seconds (8 hours).
    pub jwt_access_lifetime_secs: i64,

    /// Refresh token lifetime in seconds (7 days).
    pub jwt_refresh_lifetime_secs: i64,

    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
            data_dir: default_data_dir(),
            database_path: None,
            jwt_secret: None,
            jwt_access_lifetime_secs: 28_800,
            jwt_refresh_lifetime_secs: 604_800,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl ApiConfig {
    /// Loads configuration from defaults, the TOML file and the environment.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`SAORI_CONFIG` or `saori.toml` in the config dir)
    /// 3. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("SAORI_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(Self::default_config_path);
        Self::load_from(path)
    }

    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("API_HOST") {
            self.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;
        }

        if let Ok(dir) = env::var("SAORI_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        // DATABASE_URL may carry a sqlite: scheme; SAORI_DB_PATH wins.
        if let Ok(url) = env::var("DATABASE_URL") {
            let path = url
                .strip_prefix("sqlite://")
                .or_else(|| url.strip_prefix("sqlite:"))
                .or_else(|| url.strip_prefix("file:"))
                .unwrap_or(&url);
            self.database_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("SAORI_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }

        if let Ok(secs) = env::var("JWT_ACCESS_LIFETIME_SECS") {
            self.jwt_access_lifetime_secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?;
        }

        if let Ok(secs) = env::var("JWT_REFRESH_LIFETIME_SECS") {
            self.jwt_refresh_lifetime_secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()))?;
        }

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            self.cors_origins = parse_origins(&origins);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_access_lifetime_secs".to_string()));
        }
        if self.jwt_refresh_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_refresh_lifetime_secs".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("saori.db"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The signing secret: the configured one if it is long enough,
    /// otherwise the persisted generated one.
    pub fn resolve_jwt_secret(&self) -> Result<String, ConfigError> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if secret.chars().count() >= MIN_SECRET_LEN => {
                return Ok(secret.to_string());
            }
            Some(_) => warn!(
                min = MIN_SECRET_LEN,
                "Configured JWT secret is too short, falling back to the generated secret"
            ),
            None => debug!("No JWT secret configured"),
        }
        load_or_generate_secret(&self.data_dir.join("secrets").join("jwt.secret"))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "saori", "saori")
            .map(|dirs| dirs.config_dir().join("saori.toml"))
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "saori", "saori")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads the secret at `path`, or writes a fresh 64 hex char one there.
fn load_or_generate_secret(path: &Path) -> Result<String, ConfigError> {
    if path.exists() {
        let stored = std::fs::read_to_string(path)?;
        let stored = stored.trim();
        if stored.len() >= MIN_SECRET_LEN {
            debug!(?path, "Using persisted JWT secret");
            return Ok(stored.to_string());
        }
        warn!(?path, "Persisted JWT secret is invalid, regenerating");
    }

    let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &secret)?;
    info!(?path, "Generated JWT secret");
    Ok(secret)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
