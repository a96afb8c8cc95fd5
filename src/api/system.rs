//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the shell answers.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// `development` or `production`.
    pub environment: String,
    /// The `/api/**` rewrite in route-rule notation.
    pub proxy: String,
    /// The held socket connection, if any.
    pub socket: Option<SocketStatus>,
}

/// Snapshot of the store's connection.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SocketStatus {
    /// Connection identifier.
    pub connection_id: uuid::Uuid,
    /// Endpoint the connection targets.
    pub url: String,
    /// `connecting`, `open`, `closing` or `closed`.
    pub state: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, proxy rule and the state of the held socket connection.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let socket = state.store.current().await.map(|handle| SocketStatus {
        connection_id: *handle.id().as_uuid(),
        url: handle.url().to_string(),
        state: handle.ready_state().to_string(),
    });

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.environment.to_string(),
            proxy: state.proxy.rule().to_string(),
            socket,
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
