//! Fixed-window request limiting per client address.
//!
//! Each worker builds its own limiters, so the effective limit across the
//! whole service is the configured limit times the number of workers.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::RateLimitConfig;

const API_MESSAGE: &str = "Too many requests, please try again after 15 minutes.";
const AUTH_MESSAGE: &str =
    "Too many authentication attempts, please try again after 15 minutes.";

/// Buckets are swept, at most once per window, once the map grows past
/// this many entries.
const PRUNE_THRESHOLD: usize = 10_000;

const LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset: Duration },
    Limited { reset: Duration },
}

struct Buckets {
    // `None` collects requests whose peer address is unknown.
    by_client: HashMap<Option<IpAddr>, Bucket>,
    next_sweep: Instant,
}

pub struct RateLimiter {
    max: u32,
    window: Duration,
    message: &'static str,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max,
            window,
            message,
            buckets: Mutex::new(Buckets {
                by_client: HashMap::new(),
                next_sweep: Instant::now(),
            }),
        }
    }

    /// Limiter for every `/api` route.
    pub fn api(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.api_max, Duration::from_secs(cfg.window_secs), API_MESSAGE)
    }

    /// Stricter limiter for `/api/auth` routes.
    pub fn auth(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.auth_max, Duration::from_secs(cfg.window_secs), AUTH_MESSAGE)
    }

    pub async fn check(&self, client: Option<IpAddr>, now: Instant) -> Decision {
        let mut buckets = self.buckets.lock().await;

        if buckets.by_client.len() > PRUNE_THRESHOLD && now >= buckets.next_sweep {
            buckets.by_client.retain(|_, b| b.reset_at > now);
            buckets.next_sweep = now + self.window;
        }

        let bucket = buckets.by_client.entry(client).or_insert(Bucket {
            count: 0,
            reset_at: now + self.window,
        });
        if bucket.reset_at <= now {
            *bucket = Bucket {
                count: 0,
                reset_at: now + self.window,
            };
        }

        let reset = bucket.reset_at.saturating_duration_since(now);
        if bucket.count >= self.max {
            return Decision::Limited { reset };
        }
        bucket.count += 1;
        Decision::Allowed {
            remaining: self.max - bucket.count,
            reset,
        }
    }
}

/// Middleware entry point; use with `axum::middleware::from_fn_with_state`.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match limiter.check(client, Instant::now()).await {
        Decision::Allowed { remaining, reset } => {
            let mut res = next.run(req).await;
            set_headers(&mut res, limiter.max, remaining, reset);
            res
        }
        Decision::Limited { reset } => {
            warn!(client = ?client, "rate limit exceeded");
            let mut res = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": limiter.message })),
            )
                .into_response();
            set_headers(&mut res, limiter.max, 0, reset);
            res
        }
    }
}

/// Leaves headers already set by an inner, stricter limiter alone.
fn set_headers(res: &mut Response, limit: u32, remaining: u32, reset: Duration) {
    let headers = res.headers_mut();
    if headers.contains_key(LIMIT) {
        return;
    }
    headers.insert(LIMIT, HeaderValue::from(limit));
    headers.insert(REMAINING, HeaderValue::from(remaining));
    headers.insert(RESET, HeaderValue::from(reset.as_secs()));
}
