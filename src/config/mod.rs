//! Settings loaded from an optional `config.toml` and `CAMPUS_EVENTS_*` variables

pub mod settings;
pub mod validation;

pub use settings::{
    Settings, ServerConfig, DatabaseConfig, RedisConfig, AuthConfig, SiteConfig, PaymentsConfig,
    StorageConfig, StorageBackend, RateLimitSettings, RateLimitBackend, LoggingConfig,
};
