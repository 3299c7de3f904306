//! Sliding-window rate limiter for submission endpoints.
//!
//! One lock guards the whole bucket map, so admissions for different
//! clients serialize. The critical section is a handful of `VecDeque`
//! operations; split the map into per-bucket locks if contention ever
//! shows up on the submission routes.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use cutout_core::AppError;

use crate::error::ApiError;
use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(60);

/// In-memory sliding-window limiter keyed by client IP. A rejected request
/// is not recorded, so a client pinned at the limit recovers as soon as the
/// oldest accepted request leaves the window.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    limit: usize,
}

impl RateLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            limit,
        }
    }

    /// Attempts to admit one request for `key`.
    pub async fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let window = windows.entry(key.to_string()).or_default();

        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) > WINDOW {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.limit {
            window.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Middleware applied to submission routes.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = client_key(&request);
    if !state.rate_limiter.check(&key).await {
        state.metrics.increment("rate_limited", 1);
        return ApiError(AppError::rate_limit(format!(
            "Rate limit of {} submissions per minute exceeded",
            state.config.limits.rate_limit_per_minute
        )))
        .into_response();
    }
    next.run(request).await
}

/// Client identity: first `X-Forwarded-For` hop when present, otherwise the
/// peer address.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requests_within_limit_are_admitted() {
        let limiter = RateLimiter::new(3);
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await);
        }
        assert!(!limiter.check("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_clients_have_independent_windows() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.2").await);
        assert!(!limiter.check("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.check("k").await);
        assert!(limiter.check("k").await);
        for _ in 0..5 {
            assert!(!limiter.check("k").await);
        }
        let windows = limiter.windows.lock().await;
        assert_eq!(windows.get("k").map(VecDeque::len), Some(2));
    }
}
