//! Configuration management
//!
//! This module handles loading and parsing configuration for the site.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Locale;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Content source configuration
    #[serde(default)]
    pub content: ContentConfig,
    /// Site presentation settings
    #[serde(default)]
    pub site: SiteConfig,
    /// Session lookup configuration
    #[serde(default)]
    pub auth: AuthConfig,
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
    /// CORS allowed origin for the JSON API
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Theme configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory with templates overriding the embedded theme
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Content configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding `posts.yml` and `i18n.yml`; embedded content is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Site presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Brand name shown in the navbar and `<title>`
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Locale `/` redirects to
    #[serde(default)]
    pub default_locale: Locale,
    /// Maximum related posts shown under an article
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    /// Number of latest posts on the localized home page
    #[serde(default = "default_home_posts")]
    pub home_posts: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            default_locale: Locale::DEFAULT,
            related_limit: default_related_limit(),
            home_posts: default_home_posts(),
        }
    }
}

fn default_site_name() -> String {
    "OddsPress".to_string()
}

fn default_related_limit() -> usize {
    3
}

fn default_home_posts() -> usize {
    3
}

/// Session lookup configuration (Supabase Auth)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Supabase project URL; sessions are disabled when unset
    #[serde(default)]
    pub supabase_url: Option<String>,
    /// Supabase anon (public) key sent as `apikey`
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// Cookie carrying the access token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// How long a validated token is trusted before asking Supabase again
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
    /// Login page linked from the navbar; site paths get the locale prefix
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Where signed-in readers are sent from the navbar
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            cookie_name: default_cookie_name(),
            session_ttl_seconds: default_session_ttl(),
            login_url: default_login_url(),
            dashboard_url: default_dashboard_url(),
        }
    }
}

fn default_cookie_name() -> String {
    "sb-access-token".to_string()
}

fn default_session_ttl() -> u64 {
    60
}

fn default_login_url() -> String {
    "/login".to_string()
}

fn default_dashboard_url() -> String {
    "/dashboard".to_string()
}

impl AuthConfig {
    /// Whether enough is configured to talk to Supabase
    pub fn is_enabled(&self) -> bool {
        self.supabase_url.as_deref().is_some_and(|u| !u.is_empty())
            && self.supabase_anon_key.as_deref().is_some_and(|k| !k.is_empty())
    }
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
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
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

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - ODDSPRESS_SERVER_HOST
    /// - ODDSPRESS_SERVER_PORT
    /// - ODDSPRESS_SERVER_CORS_ORIGIN
    /// - ODDSPRESS_CACHE_TTL_SECONDS
    /// - ODDSPRESS_CACHE_MAX_CAPACITY
    /// - ODDSPRESS_THEME_PATH
    /// - ODDSPRESS_CONTENT_PATH
    /// - ODDSPRESS_SITE_NAME
    /// - ODDSPRESS_SITE_DEFAULT_LOCALE
    /// - ODDSPRESS_AUTH_SUPABASE_URL
    /// - ODDSPRESS_AUTH_SUPABASE_ANON_KEY
    /// - ODDSPRESS_AUTH_LOGIN_URL
    /// - ODDSPRESS_AUTH_DASHBOARD_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.related_limit == 0 {
            return Err(ConfigError::ValidationError(
                "site.related_limit must be at least 1".to_string(),
            ));
        }
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("ODDSPRESS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ODDSPRESS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("ODDSPRESS_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(ttl) = std::env::var("ODDSPRESS_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }
        if let Ok(capacity) = std::env::var("ODDSPRESS_CACHE_MAX_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<u64>() {
                self.cache.max_capacity = capacity;
            }
        }

        if let Ok(path) = std::env::var("ODDSPRESS_THEME_PATH") {
            self.theme.path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("ODDSPRESS_CONTENT_PATH") {
            self.content.path = Some(PathBuf::from(path));
        }

        if let Ok(name) = std::env::var("ODDSPRESS_SITE_NAME") {
            self.site.name = name;
        }
        if let Ok(code) = std::env::var("ODDSPRESS_SITE_DEFAULT_LOCALE") {
            // Ignore unknown locales
            if let Some(locale) = Locale::parse(&code) {
                self.site.default_locale = locale;
            }
        }

        if let Ok(url) = std::env::var("ODDSPRESS_AUTH_SUPABASE_URL") {
            self.auth.supabase_url = Some(url);
        }
        if let Ok(key) = std::env::var("ODDSPRESS_AUTH_SUPABASE_ANON_KEY") {
            self.auth.supabase_anon_key = Some(key);
        }
        if let Ok(url) = std::env::var("ODDSPRESS_AUTH_LOGIN_URL") {
            self.auth.login_url = url;
        }
        if let Ok(url) = std::env::var("ODDSPRESS_AUTH_DASHBOARD_URL") {
            self.auth.dashboard_url = url;
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

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
