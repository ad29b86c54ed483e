//! Per-client rate limiting.

use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};

use crate::web::error::ApiError;

/// Rate limiter keyed by client address.
pub type ClientRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

fn per_minute(requests: u32) -> ClientRateLimiter {
    RateLimiter::keyed(Quota::per_minute(
        NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN),
    ))
}

/// Limiters for the login endpoint and for the rest of the API.
pub struct RateLimitState {
    login: ClientRateLimiter,
    api: ClientRateLimiter,
}

impl RateLimitState {
    /// Create limiters allowing the given requests per minute per client.
    pub fn new(login_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            login: per_minute(login_rate_limit),
            api: per_minute(api_rate_limit),
        }
    }

    pub fn check_login(&self, client: &str) -> bool {
        self.login.check_key(&client.to_string()).is_ok()
    }

    pub fn check_api(&self, client: &str) -> bool {
        self.api.check_key(&client.to_string()).is_ok()
    }

    /// Forget clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.login.retain_recent();
        self.api.retain_recent();
        self.login.shrink_to_fit();
        self.api.shrink_to_fit();
    }

    /// Run `cleanup` every five minutes.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
fn client_key(req: &Request<Body>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header("X-Forwarded-For").and_then(|v| v.split(',').next()) {
        return ip.trim().to_string();
    }
    if let Some(ip) = header("X-Real-IP") {
        return ip.to_string();
    }
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    "unknown".to_string()
}

/// Rate limiting middleware for the login endpoint.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if !state.check_login(&client) {
        tracing::warn!(client = %client, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }
    next.run(req).await
}

/// Rate limiting middleware for the general API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if !state.check_api(&client) {
        tracing::warn!(client = %client, "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }
    next.run(req).await
}
