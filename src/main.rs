// GlitchHunt/src/main.rs
mod config;
mod controllers;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod session;
mod templates;
mod utils;

use crate::config::Config;
use crate::middleware::rate_limit::RateLimiter;
use crate::routes::create_router;
use crate::services::analytics::{self, Analytics};
use crate::services::copywriter::CopyGateway;
use crate::services::persistence::PersistenceGateway;
use crate::session::SessionStore;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "glitchhunt=info,tower_http=info";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub registrations: PersistenceGateway,
    pub copywriter: CopyGateway,
    pub analytics: Analytics,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_line_number(true)
        .init();

    tracing::info!("🚀 Starting GlitchHunt server...");

    let config = Config::from_env().context("failed to load configuration")?;
    config.warn_missing();

    let analytics = analytics::init(&config.analytics, config.http_timeout);
    let registrations = PersistenceGateway::from_config(config.supabase.as_ref(), config.http_timeout);
    let copywriter = CopyGateway::from_config(config.gemini.as_ref(), config.http_timeout);

    let sessions = SessionStore::new(
        config.session_idle,
        analytics.clone(),
        config.rotation_interval,
    );
    let rate_limiter = RateLimiter::new(
        config.register_rate_limit,
        config.register_rate_window_secs,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        sessions: sessions.clone(),
        registrations,
        copywriter,
        analytics,
        rate_limiter: rate_limiter.clone(),
    });

    // Start background tasks
    tracing::info!("🔧 Starting background tasks...");

    // Session eviction task
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sessions.cleanup_expired().await;
            tracing::debug!(active = sessions.session_count(), "Session cleanup completed");
        }
    });

    // Rate limiter cleanup task
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
            let clients = rate_limiter.tracked_clients().await;
            tracing::debug!(clients, "Rate limiter cleanup completed");
        }
    });

    let app = create_router(state.clone());

    let addr = config.server_addr()?;
    tracing::info!("✅ GlitchHunt listening on {}", addr);
    tracing::info!("🌐 Web UI: http://{}", addr);
    tracing::info!("🔌 API: http://{}/api", addr);
    tracing::info!(
        persistence = state.registrations.is_configured(),
        copywriter = state.copywriter.is_configured(),
        analytics = state.analytics.is_enabled(),
        "Gateways ready"
    );
    if config.enable_hsts {
        tracing::info!("🔒 HSTS enabled");
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
