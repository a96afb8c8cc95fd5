//! Shell configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Loaded once at startup.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ShellError;

/// Default development backend address the API proxy forwards to.
pub const DEFAULT_BACKEND_ADDR: &str = "127.0.0.1:8000";

/// Runtime environment the shell was started in.
///
/// Only the development/not-development distinction matters: it selects
/// the API proxy target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local development; `/api/**` goes to the backend on loopback.
    Development,
    /// Anything else; `/api/**` stays same-origin.
    Production,
}

impl Environment {
    /// Returns `true` for [`Environment::Development`].
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Lowercase name of the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// `"development"` / `"dev"` (any case) map to development, every other
    /// value to production.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            _ => Ok(Self::Production),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level shell configuration.
///
/// Loaded once at startup via [`ShellConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Runtime environment (`APP_ENV`).
    pub environment: Environment,

    /// Backend address used as the proxy target in development.
    pub backend_addr: SocketAddr,

    /// Origin that same-origin proxy targets resolve against
    /// (e.g. `https://arena.example`). Falls back to the shell's own
    /// listen address.
    pub public_origin: Option<String>,

    /// Socket endpoint the connection store opens at startup, if any.
    pub socket_url: Option<String>,

    /// Upper bound on a single proxied upstream call.
    pub proxy_timeout: Duration,

    /// Maximum request body size the proxy buffers, in bytes.
    pub proxy_body_limit: usize,

    /// Capacity of the connection event broadcast channel.
    pub event_bus_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            environment: Environment::Development,
            backend_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            public_origin: None,
            socket_url: None,
            proxy_timeout: Duration::from_secs(30),
            proxy_body_limit: 2 * 1024 * 1024,
            event_bus_capacity: 64,
        }
    }
}

impl ShellConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] if `LISTEN_ADDR` or `BACKEND_ADDR` is
    /// set but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, ShellError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Config`] if `LISTEN_ADDR` or `BACKEND_ADDR` is
    /// set but cannot be parsed as a [`SocketAddr`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShellError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let vars = Vars(lookup);

        let listen_addr = vars.addr("LISTEN_ADDR", defaults.listen_addr)?;
        let backend_addr = vars.addr("BACKEND_ADDR", defaults.backend_addr)?;

        let environment = vars.parsed("APP_ENV", defaults.environment);

        let public_origin = vars
            .non_empty("PUBLIC_ORIGIN")
            .map(|origin| origin.trim_end_matches('/').to_string());
        let socket_url = vars.non_empty("SOCKET_URL");

        let proxy_timeout = Duration::from_secs(
            vars.parsed("PROXY_TIMEOUT_SECS", defaults.proxy_timeout.as_secs()),
        );
        let proxy_body_limit = vars.parsed("PROXY_BODY_LIMIT", defaults.proxy_body_limit);
        let event_bus_capacity = vars.parsed("EVENT_BUS_CAPACITY", defaults.event_bus_capacity);

        Ok(Self {
            listen_addr,
            environment,
            backend_addr,
            public_origin,
            socket_url,
            proxy_timeout,
            proxy_body_limit,
            event_bus_capacity,
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn addr(&self, key: &str, default: SocketAddr) -> Result<SocketAddr, ShellError> {
        match (self.0)(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ShellError::Config(format!("{key}={raw:?}: {e}"))),
            None => Ok(default),
        }
    }

    /// Parses `key` as `T`, returning `default` on missing or invalid values.
    fn parsed<T: FromStr>(&self, key: &str, default: T) -> T {
        (self.0)(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }
}
