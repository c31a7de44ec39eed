//! Configuration for the game backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// OpenAI-compatible chat completions upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_url")]
    pub base_url: String,
    pub api_key: String,
    /// Model used for both challenge generation and photo validation.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_challenge_max_tokens")]
    pub challenge_max_tokens: u32,
    #[serde(default = "default_validation_max_tokens")]
    pub validation_max_tokens: u32,
    /// Per-request timeout for upstream calls.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, optionally prefixed with `sqlite:` (`:memory:` works too).
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HS256 secret shared with the login service.
    pub jwt_secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

/// Timing and scoring rules.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Minimum seconds between two prompt issuances.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Seconds a prompt stays submittable.
    #[serde(default = "default_expiry")]
    pub expiry_secs: u64,
    /// Points for a match at the instant of issuance.
    #[serde(default = "default_max_points")]
    pub max_points: u64,
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            expiry_secs: default_expiry(),
            max_points: default_max_points(),
            max_photo_bytes: default_max_photo_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*`.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_challenge_max_tokens() -> u32 {
    60
}
fn default_validation_max_tokens() -> u32 {
    10
}
fn default_timeout() -> u64 {
    60
}
fn default_database_url() -> String {
    "sqlite:./data/skyhunt.db".to_string()
}
fn default_cookie_name() -> String {
    "access_token".to_string()
}
fn default_cooldown() -> u64 {
    20
}
fn default_expiry() -> u64 {
    600
}
fn default_max_points() -> u64 {
    600
}
fn default_max_photo_bytes() -> usize {
    8 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (SKYHUNT__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            File::with_name("config").required(false),
            Environment::with_prefix("SKYHUNT")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_from<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = ConfigLoader::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .add_source(file)
            .add_source(env)
            .build()?;

        config.try_deserialize()
    }
}
