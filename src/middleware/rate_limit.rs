// src/middleware/rate_limit.rs
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::AppState;

/// Fixed-window request counter keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    max_requests: usize,
    window: Duration,
}

struct RateLimitEntry {
    count: usize,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Counts one request. On rejection returns how long until the window
    /// resets.
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        let entry = requests
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.window_start);
            return Err(self.window.saturating_sub(elapsed));
        }

        entry.count += 1;
        Ok(())
    }

    /// Drops entries whose window has passed (call this in a background task)
    pub async fn cleanup(&self) {
        let mut requests = self.requests.write().await;
        let now = Instant::now();
        requests.retain(|_, entry| now.duration_since(entry.window_start) < self.window);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Proxy headers first, then the socket address.
fn extract_client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next().map(str::trim).filter(|ip| !ip.is_empty()) {
            return ip.to_string();
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Guards the registration and copywriter endpoints, which each cost a
/// remote call.
pub async fn submission_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_id = extract_client_id(request.headers(), peer);

    match state.rate_limiter.check(&client_id).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(client = %client_id, path = %request.uri().path(), "Submission rate limit exceeded");
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests, please try again later").into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiting() {
        let limiter = RateLimiter::new(5, 60);

        for _ in 0..5 {
            assert!(limiter.check("test_client").await.is_ok());
        }

        assert!(limiter.check("test_client").await.is_err());
        assert!(limiter.check("other_client").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reset() {
        let limiter = RateLimiter::new(2, 1);

        assert!(limiter.check("test").await.is_ok());
        assert!(limiter.check("test").await.is_ok());
        assert!(limiter.check("test").await.is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(limiter.check("test").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new(2, 10);
        limiter.check("a").await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        limiter.check("b").await.unwrap();

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[test]
    fn test_client_id_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(extract_client_id(&headers, Some(peer)), "10.0.0.9");
        assert_eq!(extract_client_id(&headers, None), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(extract_client_id(&headers, Some(peer)), "203.0.113.7");
    }
}
