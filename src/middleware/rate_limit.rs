//! Rate limiting middleware
//!
//! Registration and check-in requests are throttled per `user_id:client_address`
//! with a fixed window. The limiter is injected into the router state behind the
//! [`RateLimiter`] trait so tests can swap the Redis backend for the in-memory one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use async_trait::async_trait;
use axum::http::HeaderMap;
use tracing::{debug, warn};
use uuid::Uuid;
use crate::config::{RateLimitBackend, RateLimitSettings};
use crate::services::RedisService;
use crate::utils::errors::{CampusEventsError, Result};

/// Address used when the request carries no `X-Forwarded-For` header
pub const UNKNOWN_CLIENT: &str = "unknown";

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key`; false once the window is exhausted
    async fn allow(&self, key: &str) -> bool;

    /// Seconds a rejected caller should wait before retrying
    fn retry_after(&self) -> u64;
}

/// First entry of `X-Forwarded-For`, else [`UNKNOWN_CLIENT`]
pub fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

pub fn rate_limit_key(user_id: Uuid, headers: &HeaderMap) -> String {
    format!("{}:{}", user_id, client_address(headers))
}

/// Reject the request with 429 when the limiter says so
pub async fn enforce(limiter: &dyn RateLimiter, key: &str) -> Result<()> {
    if limiter.allow(key).await {
        Ok(())
    } else {
        warn!(key = %key, "Rate limit exceeded");
        Err(CampusEventsError::RateLimitExceeded {
            retry_after_seconds: limiter.retry_after(),
        })
    }
}

/// Build the configured limiter backend
pub fn build_rate_limiter(settings: &RateLimitSettings, redis: Option<RedisService>) -> Arc<dyn RateLimiter> {
    match (settings.backend, redis) {
        (RateLimitBackend::Redis, Some(redis)) => Arc::new(RedisRateLimiter::new(redis, settings)),
        (RateLimitBackend::Redis, None) => {
            warn!("Redis rate limiter requested without a Redis connection, using in-memory buckets");
            Arc::new(InMemoryRateLimiter::new(settings.max_requests, settings.window()))
        }
        (RateLimitBackend::Memory, _) => Arc::new(InMemoryRateLimiter::new(settings.max_requests, settings.window())),
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    window_start: Instant,
}

/// Fixed-window buckets kept in process memory
///
/// Only suitable for a single instance; counters are not shared.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        match buckets.get_mut(key) {
            Some(bucket) if now.duration_since(bucket.window_start) < self.window => {
                if bucket.count >= self.max_requests {
                    return false;
                }
                bucket.count += 1;
                true
            }
            _ => {
                buckets.insert(key.to_string(), Bucket { count: 1, window_start: now });
                true
            }
        }
    }

    /// Drop buckets whose window has passed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let before = buckets.len();
        buckets.retain(|_, b| now.duration_since(b.window_start) < self.window);
        let removed = before - buckets.len();
        debug!(removed = removed, remaining = buckets.len(), "Purged expired rate limit buckets");
        removed
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn retry_after(&self) -> u64 {
        self.window.as_secs()
    }
}

/// Fixed-window counters shared across instances through Redis
#[derive(Clone)]
pub struct RedisRateLimiter {
    redis: RedisService,
    max_requests: u32,
    window_seconds: u64,
}

impl RedisRateLimiter {
    pub fn new(redis: RedisService, settings: &RateLimitSettings) -> Self {
        Self {
            redis,
            max_requests: settings.max_requests,
            window_seconds: settings.window_seconds,
        }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, key: &str) -> bool {
        match self.redis.check_rate_limit(key, self.max_requests, self.window_seconds).await {
            Ok((allowed, _)) => allowed,
            Err(e) => {
                // Fail open: a Redis outage must not block registrations
                warn!(error = %e, key = %key, "Rate limiter unavailable, allowing request");
                true
            }
        }
    }

    fn retry_after(&self) -> u64 {
        self.window_seconds
    }
}
