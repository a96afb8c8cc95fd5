//! Router composition.
//!
//! Shell-owned endpoints (`/health`, docs) are explicit routes. Everything
//! else lands in one fallback that sends `/api/**` through the proxy and
//! hands the rest to the page router.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::pages::PageRouter;
use crate::pages::handler::page_handler;
use crate::proxy::{ApiProxy, proxy_handler};
use crate::store::ConnectionStore;

impl AppState {
    /// Builds the state for `config` with a WebSocket-backed store.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] if the proxy's HTTP client cannot be
    /// built.
    pub fn from_config(config: ShellConfig) -> Result<Self, ShellError> {
        let store = ConnectionStore::with_websockets(config.event_bus_capacity);
        Self::with_store(config, store)
    }

    /// Builds the state for `config` around an existing store.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] if the proxy's HTTP client cannot be
    /// built.
    pub fn with_store(config: ShellConfig, store: ConnectionStore) -> Result<Self, ShellError> {
        let proxy = ApiProxy::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            proxy: Arc::new(proxy),
            pages: Arc::new(PageRouter::new()),
            store: Arc::new(store),
        })
    }
}

/// Builds the complete shell router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    if state.proxy.rule().matches(request.uri().path()) {
        return proxy_handler(State(state), request).await.into_response();
    }
    let method = request.method().clone();
    let uri = request.uri().clone();
    page_handler(State(state), method, uri).await.into_response()
}
