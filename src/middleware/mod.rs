//! Middleware module
//!
//! Request guards shared by the HTTP handlers

pub mod auth;
pub mod rate_limit;

pub use auth::{TokenVerifier, Claims, CurrentUser, StaffUser, AdminUser, require_role, authorize};
pub use rate_limit::{RateLimiter, InMemoryRateLimiter, RedisRateLimiter, build_rate_limiter, rate_limit_key, client_address, enforce};
