//! Shell-owned HTTP endpoints and their OpenAPI description.

pub mod system;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI document for the endpoints the shell itself answers.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "arena-shell",
        description = "Application shell: API proxy, page router and socket connection store."
    ),
    paths(system::health_handler),
    components(schemas(system::HealthResponse, system::SocketStatus, ErrorResponse, ErrorBody)),
    tags((name = "System", description = "Health and diagnostics"))
)]
pub struct ApiDoc;

/// Builds the router for shell-owned endpoints, plus the OpenAPI docs.
pub fn build_router() -> Router<AppState> {
    Router::new().merge(system::routes()).merge(docs())
}

#[cfg(feature = "swagger-ui")]
fn docs() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn docs() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
