//! API proxy: the `/api/**` rewrite rule and the handler applying it.
//!
//! In development `/api/**` is forwarded to the backend on loopback
//! (`http://127.0.0.1:8000/**` by default); everywhere else it stays on
//! the same origin as `/**`.

pub mod forward;
pub mod rule;

pub use forward::{ApiProxy, proxy_handler};
pub use rule::{API_PREFIX, ProxyDestination, ProxyRule, ProxyTarget};
