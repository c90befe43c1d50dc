//! Error handling for Campus Events
//!
//! This module defines the main error type used throughout the application
//! and the uniform `{success: false, error}` HTTP rendering of it.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Main error type for the Campus Events application
#[derive(Error, Debug)]
pub enum CampusEventsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object storage error: {0}")]
    Storage(#[from] opendal::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    CapacityExceeded(String),

    #[error("{0}")]
    RegistrationFailed(String),

    #[error("Capacity is lower than confirmed registrations")]
    CapacityBelowConfirmed { capacity: i32, confirmed: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Result type alias for Campus Events operations
pub type Result<T> = std::result::Result<T, CampusEventsError>;

impl CampusEventsError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CampusEventsError::Database(_) => false,
            CampusEventsError::Migration(_) => false,
            CampusEventsError::Redis(_) => true,
            CampusEventsError::Http(_) => true,
            CampusEventsError::Storage(_) => true,
            CampusEventsError::Serialization(_) => false,
            CampusEventsError::Io(_) => true,
            CampusEventsError::UrlParse(_) => false,
            CampusEventsError::Jwt(_) => false,
            CampusEventsError::Config(_) => false,
            CampusEventsError::Authentication(_) => false,
            CampusEventsError::PermissionDenied(_) => false,
            CampusEventsError::Validation(_) => false,
            CampusEventsError::CapacityExceeded(_) => false,
            CampusEventsError::RegistrationFailed(_) => false,
            CampusEventsError::CapacityBelowConfirmed { .. } => false,
            CampusEventsError::InvalidStateTransition { .. } => false,
            CampusEventsError::NotFound(_) => false,
            CampusEventsError::RateLimitExceeded { .. } => true,
            CampusEventsError::PaymentGateway(_) => true,
            CampusEventsError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CampusEventsError::Database(_) => ErrorSeverity::Critical,
            CampusEventsError::Migration(_) => ErrorSeverity::Critical,
            CampusEventsError::Config(_) => ErrorSeverity::Critical,
            CampusEventsError::PermissionDenied(_) => ErrorSeverity::Warning,
            CampusEventsError::Authentication(_) => ErrorSeverity::Warning,
            CampusEventsError::Jwt(_) => ErrorSeverity::Warning,
            CampusEventsError::RateLimitExceeded { .. } => ErrorSeverity::Warning,
            CampusEventsError::Validation(_)
            | CampusEventsError::CapacityExceeded(_)
            | CampusEventsError::RegistrationFailed(_)
            | CampusEventsError::CapacityBelowConfirmed { .. }
            | CampusEventsError::InvalidStateTransition { .. }
            | CampusEventsError::NotFound(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status the error is rendered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            CampusEventsError::Authentication(_) | CampusEventsError::Jwt(_) => StatusCode::UNAUTHORIZED,
            CampusEventsError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            CampusEventsError::Validation(_)
            | CampusEventsError::CapacityExceeded(_)
            | CampusEventsError::RegistrationFailed(_)
            | CampusEventsError::CapacityBelowConfirmed { .. }
            | CampusEventsError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            CampusEventsError::NotFound(_) => StatusCode::NOT_FOUND,
            CampusEventsError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            CampusEventsError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            CampusEventsError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            CampusEventsError::Jwt(_) => "Invalid or expired session".to_string(),
            CampusEventsError::PaymentGateway(_) => "Unable to initiate payment".to_string(),
            CampusEventsError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            _ if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Machine readable code for errors the client reacts to
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CampusEventsError::CapacityBelowConfirmed { .. } => Some("CAPACITY_BELOW_CONFIRMED"),
            CampusEventsError::CapacityExceeded(_) => Some("CAPACITY_EXCEEDED"),
            CampusEventsError::RateLimitExceeded { .. } => Some("RATE_LIMITED"),
            _ => None,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Uniform error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_registrations: Option<i64>,
}

impl IntoResponse for CampusEventsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                severity = %self.severity(),
                recoverable = self.is_recoverable(),
                "Request failed"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: self.public_message(),
            code: self.code(),
            confirmed_registrations: match &self {
                CampusEventsError::CapacityBelowConfirmed { confirmed, .. } => Some(*confirmed),
                _ => None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let CampusEventsError::RateLimitExceeded { retry_after_seconds } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
