//! Per-client rate limiting middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::client_address;

/// Buckets tracked before idle ones are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn refill(&mut self, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        self.refill(capacity, refill_rate);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token-bucket limiter keyed by client address.
///
/// Constructed explicitly and injected into the router; each instance keeps
/// its own counters.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    requests_per_second: f64,
    burst: f64,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            requests_per_second: requests_per_second as f64,
            burst: burst.max(1) as f64,
            trust_forwarded_for: false,
        }
    }

    pub fn from_config(config: &RateLimitConfig, trust_forwarded_for: bool) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
            .trust_forwarded_for(trust_forwarded_for)
    }

    /// Key clients by their `X-Forwarded-For` address.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Take one token for `key`. Returns false when the client is over its limit.
    pub fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");

        if buckets.len() >= PRUNE_THRESHOLD && !buckets.contains_key(key) {
            let (burst, rate) = (self.burst, self.requests_per_second);
            buckets.retain(|_, bucket| {
                bucket.refill(burst, rate);
                bucket.tokens < burst
            });
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst));

        bucket.try_acquire(self.burst, self.requests_per_second)
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().expect("rate limiter mutex poisoned").len()
    }
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_address(&request, limiter.trust_forwarded_for)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.check(&key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, "Rate limit exceeded");
        metrics::record_rejection("rate_limit");
        (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiter = RateLimiter::new(1, 3);
        assert!(limiter.check("192.0.2.1"));
        assert!(limiter.check("192.0.2.1"));
        assert!(limiter.check("192.0.2.1"));
        assert!(!limiter.check("192.0.2.1"));

        // Other clients have their own bucket
        assert!(limiter.check("192.0.2.2"));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_refill() {
        let limiter = RateLimiter::new(100, 1);
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));

        std::thread::sleep(std::time::Duration::from_millis(30));
        assert!(limiter.check("a"));
    }

    #[test]
    fn test_independent_instances() {
        let first = RateLimiter::new(1, 1);
        let second = RateLimiter::new(1, 1);
        assert!(first.check("a"));
        assert!(!first.check("a"));
        assert!(second.check("a"));
    }
}
