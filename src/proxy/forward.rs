//! Request forwarding for the `/api/**` rule.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::Method;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::uri::PathAndQuery;
use axum::response::Response;

use super::rule::{ProxyDestination, ProxyRule};
use crate::app_state::AppState;
use crate::config::ShellConfig;
use crate::error::ShellError;

/// Headers that describe a single hop and must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Applies a [`ProxyRule`] to live requests and relays them upstream.
#[derive(Debug, Clone)]
pub struct ApiProxy {
    rule: ProxyRule,
    client: reqwest::Client,
    origin: String,
    body_limit: usize,
}

impl ApiProxy {
    /// Builds the proxy for `config`'s environment.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &ShellConfig) -> Result<Self, ShellError> {
        let client = reqwest::Client::builder()
            .timeout(config.proxy_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ShellError::Config(format!("proxy client: {e}")))?;

        Ok(Self {
            rule: ProxyRule::for_environment(config.environment, config.backend_addr),
            client,
            origin: config
                .public_origin
                .clone()
                .unwrap_or_else(|| own_origin(config.listen_addr)),
            body_limit: config.proxy_body_limit,
        })
    }

    /// The rule this proxy applies.
    #[must_use]
    pub const fn rule(&self) -> &ProxyRule {
        &self.rule
    }

    /// Forwards `request` to the rewritten location and relays the answer.
    ///
    /// # Errors
    ///
    /// - [`ShellError::InvalidRequest`] if the body exceeds the limit.
    /// - [`ShellError::Upstream`] if the upstream is unreachable.
    /// - [`ShellError::Internal`] if the path is outside the rule's prefix.
    pub async fn forward(&self, request: Request) -> Result<Response, ShellError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), PathAndQuery::as_str);

        let destination = self.rule.rewrite(path_and_query).ok_or_else(|| {
            ShellError::Internal(format!("{path_and_query} is outside {}", self.rule))
        })?;
        let url = match &destination {
            ProxyDestination::Absolute(url) => url.clone(),
            ProxyDestination::Relative(_) => destination.with_origin(&self.origin),
        };

        let body: Bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| ShellError::InvalidRequest(format!("request body: {e}")))?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        tracing::debug!(method = %parts.method, from = %path_and_query, to = %url, "proxying request");
        let is_head = parts.method == Method::HEAD;

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .inspect_err(|e| tracing::warn!(to = %url, error = %e, "upstream request failed"))?;

        let status = upstream.status();
        let headers = relay_headers(upstream.headers(), is_head);
        let bytes = upstream.bytes().await?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Origin that same-origin targets resolve against.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// `http://` origin of the shell itself. Wildcard bind addresses are
/// reached over loopback.
fn own_origin(listen_addr: SocketAddr) -> String {
    let ip = match listen_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, listen_addr.port()))
}

/// Removes hop-by-hop headers, including any named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Upstream response headers to hand back to the client. The body is
/// re-framed, so `Content-Length` is dropped, except for `HEAD` where it
/// describes a body that is never sent.
fn relay_headers(upstream: &HeaderMap, is_head: bool) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_hop_by_hop(&mut headers);
    if !is_head {
        headers.remove(header::CONTENT_LENGTH);
    }
    headers
}

/// `ANY /api/**`: Forward the request through the API proxy.
///
/// # Errors
///
/// Returns [`ShellError`] when forwarding fails; see [`ApiProxy::forward`].
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ShellError> {
    state.proxy.forward(request).await
}
