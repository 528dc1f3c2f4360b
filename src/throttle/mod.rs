//! Per-client request throttling.
//!
//! A [`RateLimiter`] keeps a sliding log of request times per key in a
//! [`CounterStore`]: a request is allowed while fewer than `N` earlier requests
//! fall within the trailing period. Rejected requests are not logged. The store
//! is injected so a shared backend can replace the in-process map without
//! touching the middleware.

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryCounterStore;

#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("Invalid rate '{0}', expected '<requests>/<s|m|h|d>'")]
    InvalidRate(String),

    #[error("Counter store error: {0}")]
    Store(String),
}

/// Allowed number of requests per period, parsed from strings like `100/hour`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub num_requests: u64,
    pub period: Duration,
}

impl FromStr for Rate {
    type Err = ThrottleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ThrottleError::InvalidRate(s.to_string());

        let (num, period) = s.split_once('/').ok_or_else(invalid)?;
        let num_requests: u64 = num.trim().parse().map_err(|_| invalid())?;

        // Only the first letter counts: "h", "hour" and "hours" are the same
        let secs = match period.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 60 * 60,
            Some('d') => 24 * 60 * 60,
            _ => return Err(invalid()),
        };

        Ok(Self {
            num_requests,
            period: Duration::from_secs(secs),
        })
    }
}

/// Outcome of offering one request to a key's history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub allowed: bool,
    /// Requests logged within the period, this one included when allowed
    pub count: u64,
    /// Time until the oldest logged request leaves the period
    pub reset_in: Duration,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Log a request for `key` unless `limit` requests already fall within the
    /// trailing `period`. Implementations must check and log atomically per key.
    async fn hit(&self, key: &str, limit: u64, period: Duration) -> Result<Hit, ThrottleError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed { limit: u64, remaining: u64, reset_in_seconds: u64 },
    Throttled { retry_after: u64 },
}

pub struct RateLimiter {
    rate: Rate,
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(rate: Rate, store: Arc<dyn CounterStore>) -> Self {
        Self { rate, store }
    }

    pub async fn check_ip(&self, client_ip: &str) -> Result<Decision, ThrottleError> {
        let key = format!("ip:{}", client_ip);
        let hit = self
            .store
            .hit(&key, self.rate.num_requests, self.rate.period)
            .await?;
        let reset_in_seconds = ceil_secs(hit.reset_in);

        if !hit.allowed {
            tracing::debug!("Throttled {} ({} requests in period)", key, hit.count);
            return Ok(Decision::Throttled {
                retry_after: reset_in_seconds.max(1),
            });
        }

        Ok(Decision::Allowed {
            limit: self.rate.num_requests,
            remaining: self.rate.num_requests.saturating_sub(hit.count),
            reset_in_seconds,
        })
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
