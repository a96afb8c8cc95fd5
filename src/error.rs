//! Shell error types with HTTP status code mapping.
//!
//! [`ShellError`] is the central error type for the shell. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "page not found: /nope",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Shell error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                   |
/// |-----------|-----------------|-------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 405 Method Not Allowed |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict  |
/// | 3000–3999 | Server/Upstream | 500 Internal / 502 Bad Gateway |
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The address handed to the connection store is not a socket URL.
    #[error("invalid socket url: {0}")]
    InvalidSocketUrl(String),

    /// The incoming request could not be relayed as received.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The page exists but only answers `GET` and `HEAD`.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        /// Rejected request method.
        method: String,
        /// Requested page path.
        path: String,
    },

    /// No page is registered for the requested path.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// The connection closed before it reached the open state.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Startup configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The proxied upstream could not be reached or answered garbage.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ShellError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidSocketUrl(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::MethodNotAllowed { .. } => 1003,
            Self::PageNotFound(_) => 2001,
            Self::ConnectionClosed(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Config(_) => 3001,
            Self::Upstream(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSocketUrl(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PageNotFound(_) => StatusCode::NOT_FOUND,
            Self::ConnectionClosed(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ShellError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl IntoResponse for ShellError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let allow = matches!(self, Self::MethodNotAllowed { .. });
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if allow {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        }
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        let cases = [
            (ShellError::InvalidSocketUrl("x".into()), 1001, 400),
            (ShellError::InvalidRequest("x".into()), 1002, 400),
            (
                ShellError::MethodNotAllowed {
                    method: "POST".into(),
                    path: "/".into(),
                },
                1003,
                405,
            ),
            (ShellError::PageNotFound("/x".into()), 2001, 404),
            (ShellError::ConnectionClosed("x".into()), 2002, 409),
            (ShellError::Upstream("x".into()), 3002, 502),
            (ShellError::Config("x".into()), 3001, 500),
            (ShellError::Internal("x".into()), 3000, 500),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.error_code(), code, "{err}");
            assert_eq!(err.status_code().as_u16(), status, "{err}");
        }
    }

    #[tokio::test]
    async fn response_body_is_structured_json() {
        let response = ShellError::PageNotFound("/missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let Ok(bytes) = axum::body::to_bytes(response.into_body(), 4096).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("body is not json");
        };
        assert_eq!(json["error"]["code"], 2001);
        assert_eq!(json["error"]["message"], "page not found: /missing");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn method_not_allowed_advertises_allowed_methods() {
        let response = ShellError::MethodNotAllowed {
            method: "DELETE".into(),
            path: "/tv/levelselector".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get(header::ALLOW),
            Some(&HeaderValue::from_static("GET, HEAD"))
        );
    }
}
