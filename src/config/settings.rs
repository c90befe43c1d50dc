//! Settings structure and loading
//!
//! Values are layered: built-in defaults, then `config.toml` (or the file
//! given on the command line), then `config.local.toml`, then environment
//! variables such as `CAMPUS_EVENTS_AUTH__JWT_SECRET`.

use std::net::SocketAddr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub site: SiteConfig,
    pub payments: PaymentsConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
}

/// Access token verification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub cookie_name: String,
}

/// Public site configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub base_url: String,
}

/// Payment collection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    /// When false every registration takes the free confirmation path
    pub enabled: bool,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub api_url: String,
    pub currency: String,
    pub timeout_seconds: u64,
}

/// Object storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Memory,
}

/// Object storage configuration for uploaded registration files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub public_base_url: String,
}

/// Rate limiter backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    Redis,
    Memory,
}

/// Fixed window rate limiting for registration and check-in
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSettings {
    pub backend: RateLimitBackend,
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load("config", false)
    }

    /// Load settings from an explicit configuration file
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        Self::load(path, true)
    }

    fn load(path: &str, required: bool) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path).required(required))
            .add_source(config::File::with_name("config.local").required(false))
            .add_source(
                config::Environment::with_prefix("CAMPUS_EVENTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CampusEventsError> {
        super::validation::validate_settings(self)
    }
}

impl ServerConfig {
    /// Socket address the HTTP listener binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/campus_events".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "campus_events:".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                cookie_name: "access_token".to_string(),
            },
            site: SiteConfig {
                base_url: "http://localhost:3000".to_string(),
            },
            payments: PaymentsConfig {
                enabled: false,
                razorpay_key_id: String::new(),
                razorpay_key_secret: String::new(),
                api_url: "https://api.razorpay.com".to_string(),
                currency: "INR".to_string(),
                timeout_seconds: 10,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                bucket: "registration-files".to_string(),
                endpoint: None,
                region: "us-east-1".to_string(),
                access_key_id: None,
                secret_access_key: None,
                public_base_url: "http://localhost:8080/files/registration-files".to_string(),
            },
            rate_limit: RateLimitSettings {
                backend: RateLimitBackend::Redis,
                max_requests: 10,
                window_seconds: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                json: false,
            },
        }
    }
}
