// src/routes.rs
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{api, web};
use crate::middleware::{rate_limit, security};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Endpoints that each trigger a remote call
    let submissions = Router::new()
        .route("/register", post(web::submit_registration))
        .route("/copy", post(web::generate_copy))
        .route("/api/registrations", post(api::create_registration))
        .route("/api/copy", post(api::generate_copy))
        .route_layer(from_fn_with_state(
            state.clone(),
            rate_limit::submission_rate_limit,
        ));

    Router::new()
        // ==================
        // WEB UI ROUTES
        // ==================
        .route("/", get(web::index))
        .route("/product", get(web::product))
        .route("/solutions", get(web::solutions))
        .route("/privacy", get(web::privacy))
        .route("/terms", get(web::terms))
        .route("/start", post(web::start_hunting))
        .route("/register", get(web::open_registration))
        .route("/register/close", post(web::close_registration))
        .route("/demo/select", post(web::select_demo_view))
        // ==================
        // API ROUTES
        // ==================
        .route("/api/demo", get(api::demo_state))
        .route("/api/demo/select", post(api::select_demo_view))
        .route("/api/health", get(api::health_check))
        .merge(submissions)
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        .layer(from_fn_with_state(state.clone(), security::security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
