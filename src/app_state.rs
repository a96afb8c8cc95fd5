//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ShellConfig;
use crate::pages::PageRouter;
use crate::proxy::ApiProxy;
use crate::store::ConnectionStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration the shell was started with.
    pub config: Arc<ShellConfig>,
    /// Forwarder for `/api/**`.
    pub proxy: Arc<ApiProxy>,
    /// Page routes.
    pub pages: Arc<PageRouter>,
    /// The single socket connection the shell holds.
    pub store: Arc<ConnectionStore>,
}
