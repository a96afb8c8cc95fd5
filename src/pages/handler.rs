//! Axum fallback handler serving pages.

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{Html, IntoResponse};

use crate::app_state::AppState;
use crate::error::ShellError;

/// `GET /{page}`: Render the page registered for the request path.
///
/// Mounted as the router fallback, so it sees every path no other route
/// claimed.
///
/// # Errors
///
/// Returns [`ShellError::PageNotFound`] for unregistered paths and
/// [`ShellError::MethodNotAllowed`] for methods other than `GET`/`HEAD`
/// on a registered one.
pub async fn page_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<impl IntoResponse, ShellError> {
    let page = state
        .pages
        .resolve(uri.path())
        .ok_or_else(|| ShellError::PageNotFound(uri.path().to_string()))?;
    if method != Method::GET && method != Method::HEAD {
        return Err(ShellError::MethodNotAllowed {
            method: method.to_string(),
            path: uri.path().to_string(),
        });
    }

    tracing::debug!(path = %uri.path(), %page, "serving page");
    Ok(Html(page.render()))
}
