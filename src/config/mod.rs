//! Configuration management
//!
//! Configuration is read from a `config.yml` file and can be overridden by
//! `NEWSDESK_*` environment variables. Missing values fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Uploaded media configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Session cookie configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Template override configuration
    #[serde(default)]
    pub templates: TemplatesConfig,
    /// Site-wide presentation settings
    #[serde(default)]
    pub site: SiteConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/newsdesk.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Uploaded media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Media root directory
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Public URL prefix the media root is served under
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Maximum article image size in bytes (default: 5MB)
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    /// Maximum request body size in bytes (default: 16MB)
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            url_prefix: default_url_prefix(),
            max_image_size: default_max_image_size(),
            max_request_size: default_max_request_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("media")
}

fn default_url_prefix() -> String {
    "/media".to_string()
}

fn default_max_image_size() -> u64 {
    5 * 1024 * 1024
}

fn default_max_request_size() -> usize {
    16 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/bmp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Public URL for a path relative to the media root
    pub fn url_for(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            relative_path.trim_start_matches('/')
        )
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in days
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
    /// Add the `Secure` attribute to the cookie
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expiration_days: default_expiration_days(),
            secure_cookie: false,
        }
    }
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_expiration_days() -> i64 {
    14
}

/// Template override configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory whose `.html` files replace the embedded templates
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Site-wide presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in page titles
    #[serde(default = "default_site_name")]
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
        }
    }
}

fn default_site_name() -> String {
    "Новости".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration.
    /// Invalid YAML is reported with its location.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - NEWSDESK_SERVER_HOST, NEWSDESK_SERVER_PORT
    /// - NEWSDESK_DATABASE_DRIVER, NEWSDESK_DATABASE_URL
    /// - NEWSDESK_UPLOAD_PATH, NEWSDESK_UPLOAD_MAX_IMAGE_SIZE
    /// - NEWSDESK_SESSION_EXPIRATION_DAYS, NEWSDESK_SESSION_SECURE_COOKIE
    /// - NEWSDESK_TEMPLATES_PATH
    /// - NEWSDESK_SITE_NAME
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the application cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_image_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_image_size must be greater than zero".to_string(),
            ));
        }
        if (self.upload.max_request_size as u64) < self.upload.max_image_size {
            return Err(ConfigError::ValidationError(
                "upload.max_request_size must not be smaller than upload.max_image_size"
                    .to_string(),
            ));
        }
        let prefix = self.upload.url_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') || prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.url_prefix must start with '/' and not be the site root".to_string(),
            ));
        }
        if self.session.expiration_days <= 0 {
            return Err(ConfigError::ValidationError(
                "session.expiration_days must be positive".to_string(),
            ));
        }
        if self.session.cookie_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "session.cookie_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NEWSDESK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NEWSDESK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("NEWSDESK_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("NEWSDESK_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("NEWSDESK_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("NEWSDESK_UPLOAD_MAX_IMAGE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_image_size = size;
            }
        }

        if let Ok(days) = std::env::var("NEWSDESK_SESSION_EXPIRATION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.session.expiration_days = days;
            }
        }
        if let Ok(secure) = std::env::var("NEWSDESK_SESSION_SECURE_COOKIE") {
            match secure.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.session.secure_cookie = true,
                "0" | "false" | "no" => self.session.secure_cookie = false,
                _ => {}
            }
        }

        if let Ok(path) = std::env::var("NEWSDESK_TEMPLATES_PATH") {
            self.templates.path = Some(PathBuf::from(path));
        }

        if let Ok(name) = std::env::var("NEWSDESK_SITE_NAME") {
            self.site.name = name;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
