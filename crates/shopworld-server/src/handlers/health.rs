use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use shopworld_api::{ApiError, ApiResult};

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'static str>,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "ShopWorld Storefront",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.backend_name(),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            storage: None,
        }),
    )
}

pub async fn readyz(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if let Err(e) = state.storage.health_check().await {
        tracing::warn!(error = %e, "Readiness check failed");
        return Err(ApiError::service_unavailable("Storage unavailable"));
    }
    Ok(Json(HealthResponse {
        status: "ready",
        storage: Some(state.storage.backend_name()),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
