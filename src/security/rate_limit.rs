//! Token-bucket rate limiting per route class.
//!
//! Buckets are process-wide with no per-client partitioning: one caller
//! can drain a bucket for everyone.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;

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

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// What a denied request gets back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyPolicy {
    /// `429` with a short explanation.
    Reject,
    /// `429` with an empty body and nothing else.
    Drop,
}

/// One shared bucket guarding a class of routes.
pub struct RateLimiter {
    route: &'static str,
    bucket: Mutex<TokenBucket>,
    capacity: f64,
    /// Tokens per second.
    refill_rate: f64,
    policy: DenyPolicy,
}

impl RateLimiter {
    pub fn per_second(route: &'static str, rate: u32, burst: u32, policy: DenyPolicy) -> Self {
        Self::new(route, rate as f64, burst, policy)
    }

    pub fn per_minute(route: &'static str, rate: u32, burst: u32, policy: DenyPolicy) -> Self {
        Self::new(route, rate as f64 / 60.0, burst, policy)
    }

    fn new(route: &'static str, refill_rate: f64, burst: u32, policy: DenyPolicy) -> Self {
        let capacity = burst.max(1) as f64;
        Self {
            route,
            bucket: Mutex::new(TokenBucket::new(capacity)),
            capacity,
            refill_rate,
            policy,
        }
    }

    pub fn route(&self) -> &'static str {
        self.route
    }

    /// Check and consume one token.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_acquire(now, self.capacity, self.refill_rate)
    }

    fn deny(&self) -> Response {
        match self.policy {
            DenyPolicy::Reject => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response(),
            DenyPolicy::Drop => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
                response
            }
        }
    }
}

/// Middleware: consume a token before the wrapped handler runs.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.allow() {
        next.run(request).await
    } else {
        tracing::warn!(route = limiter.route(), "Rate limit reached due to too many requests");
        metrics::record_rate_limited(limiter.route());
        limiter.deny()
    }
}
