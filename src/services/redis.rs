//! Redis integration service implementation
//!
//! Redis holds the shared fixed-window counters used by the rate limiter.
//! Nothing authoritative is cached here.

use redis::{Client, RedisResult};
use tracing::{debug, warn};
use crate::config::RedisConfig;
use crate::utils::errors::Result;

/// Outcome of one fixed-window counter increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Requests seen in the current window, including this one
    pub count: i64,
    /// Seconds until the window resets
    pub ttl_seconds: i64,
}

#[derive(Clone, Debug)]
pub struct RedisService {
    client: Client,
    prefix: String,
}

impl RedisService {
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self {
            client,
            prefix: config.prefix.clone(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Increment a counter whose TTL is set only when the window opens
    ///
    /// Unlike a plain INCR + EXPIRE pair this never extends a running window.
    pub async fn increment_in_window(&self, key: &str, window_seconds: u64) -> Result<WindowCount> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let (count, ttl_seconds): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&full_key)
            .arg(0)
            .arg("EX")
            .arg(window_seconds)
            .arg("NX")
            .ignore()
            .incr(&full_key, 1)
            .ttl(&full_key)
            .query_async(&mut conn)
            .await?;

        debug!(key = %full_key, count = count, ttl = ttl_seconds, "Window counter incremented");
        Ok(WindowCount { count, ttl_seconds })
    }

    /// Fixed-window rate limiting check
    pub async fn check_rate_limit(&self, identifier: &str, limit: u32, window_seconds: u64) -> Result<(bool, WindowCount)> {
        let key = format!("rate_limit:{}", identifier);
        let window = self.increment_in_window(&key, window_seconds).await?;

        let allowed = window.count <= limit as i64;
        debug!(
            identifier = %identifier,
            current_count = window.count,
            limit = limit,
            allowed = allowed,
            "Rate limit check"
        );

        Ok((allowed, window))
    }

    /// Health check for Redis connection
    pub async fn health_check(&self) -> Result<bool> {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => {
                        debug!(response = %response, "Redis health check successful");
                        Ok(response == "PONG")
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        Ok(false)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                Ok(false)
            }
        }
    }
}
