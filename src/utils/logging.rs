//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Campus Events service.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, "campus-events.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("{},tower_http=info", config.level)));

    let (stdout_layer, file_layer) = if config.json {
        (
            tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed(),
            tracing_subscriber::fmt::layer().json().with_writer(non_blocking).boxed(),
        )
    } else {
        (
            tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed(),
            tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking).boxed(),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::utils::errors::CampusEventsError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration lifecycle steps
pub fn log_registration_event(registration_id: Uuid, event_id: Uuid, user_id: Uuid, step: &str) {
    info!(
        registration_id = %registration_id,
        event_id = %event_id,
        user_id = %user_id,
        step = step,
        "Registration step completed"
    );
}

/// Log check-in outcomes
pub fn log_check_in(registration_id: Uuid, method: &str, already_checked_in: bool) {
    if already_checked_in {
        debug!(registration_id = %registration_id, method = method, "Check-in repeated, attendance already recorded");
    } else {
        info!(registration_id = %registration_id, method = method, "Attendee checked in");
    }
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target = target,
        "Admin action performed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
