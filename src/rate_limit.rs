//! Per-IP sliding window rate limiting for the `/api` routes.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::error::{AppError, Result};
use crate::state::AppState;

static LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed { remaining: usize },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
pub struct RateLimiter {
    maximum_requests: usize,
    window: Duration,
    buckets: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(maximum_requests: usize, window: Duration) -> Self {
        RateLimiter {
            maximum_requests,
            window,
            buckets: DashMap::new(),
        }
    }

    pub fn maximum_requests(&self) -> usize {
        self.maximum_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a request for `key` unless it would exceed the limit.
    pub fn check(&self, key: &str) -> Verdict {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Verdict {
        // The entry guard holds the shard lock, so check-and-record is atomic per key.
        let mut requests = self.buckets.entry(key.to_string()).or_default();

        while let Some(time) = requests.front() {
            if now.duration_since(*time) >= self.window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if requests.len() >= self.maximum_requests {
            let retry_after = requests
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            Verdict::Limited { retry_after }
        } else {
            requests.push_back(now);
            Verdict::Allowed {
                remaining: self.maximum_requests - requests.len(),
            }
        }
    }

    /// Drop buckets whose requests have all left the window.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.buckets.retain(|_, requests| {
            requests
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

/// Peer IP of the connection, when the server was started with connect info.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting clients over their request budget.
pub async fn limit_by_ip(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let key = client_key(&request);

    match state.rate_limiter.check(&key) {
        Verdict::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                LIMIT_HEADER.clone(),
                HeaderValue::from(state.rate_limiter.maximum_requests()),
            );
            headers.insert(REMAINING_HEADER.clone(), HeaderValue::from(remaining));
            Ok(response)
        }
        Verdict::Limited { retry_after } => {
            tracing::warn!(client = %key, "Rate limit exceeded");
            Err(AppError::TooManyRequests { retry_after })
        }
    }
}
