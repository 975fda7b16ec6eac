// src/handlers/api.rs
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::controllers::registration::RegistrationDraft;
use crate::models::*;
use crate::session::Visitor;
use crate::utils::validation::validate_niche;
use crate::AppState;

/// 201 on success, 409 for a duplicate email, 422 for a draft that fails
/// validation and 502 for anything the row-store rejected.
pub async fn create_registration(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<RegistrationDraft>,
) -> (StatusCode, Json<RegistrationOutcome>) {
    let request = match draft.to_request() {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(RegistrationOutcome::failure(e.to_string())),
            )
        }
    };

    let outcome = state.registrations.save_registration(&request).await;
    let status = if outcome.success {
        StatusCode::CREATED
    } else if outcome.is_duplicate {
        StatusCode::CONFLICT
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(outcome))
}

pub async fn generate_copy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CopyRequest>,
) -> Result<Json<CopySuggestion>, (StatusCode, Json<serde_json::Value>)> {
    let niche = validate_niche(&request.niche)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e }))))?;

    Ok(Json(
        state
            .copywriter
            .generate_marketing_copy(&niche, &request.style)
            .await,
    ))
}

fn demo_response(visitor: Visitor, state: Option<DemoState>) -> Response {
    match state {
        Some(state) => (visitor.jar, Json(state)).into_response(),
        None => (
            visitor.jar,
            (StatusCode::NOT_FOUND, Json(json!({ "error": "Demo is not mounted" }))),
        )
            .into_response(),
    }
}

pub async fn demo_state(visitor: Visitor) -> Response {
    let state = visitor.session.lock().await.demo_state();
    demo_response(visitor, state)
}

pub async fn select_demo_view(visitor: Visitor, Json(request): Json<SelectViewRequest>) -> Response {
    let state = visitor.session.lock().await.select_view(request.view);
    demo_response(visitor, state)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        persistence: state.registrations.is_configured(),
        copywriter: state.copywriter.is_configured(),
        analytics: state.analytics.is_enabled(),
    })
}
