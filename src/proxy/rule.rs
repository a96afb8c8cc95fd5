//! Declarative `/api/**` rewrite rule.
//!
//! A [`ProxyRule`] pairs a wildcard path pattern with a wildcard target.
//! The path remainder captured by the pattern's `/**` is appended to the
//! target base, and the query string is carried over untouched.

use std::fmt;
use std::net::SocketAddr;

use crate::config::Environment;

/// Path prefix routed through the proxy.
pub const API_PREFIX: &str = "/api";

const WILDCARD: &str = "/**";

/// Where a rewritten request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyTarget {
    /// An absolute base URL such as `http://127.0.0.1:8000`.
    Absolute(String),
    /// The same origin the request arrived on.
    SameOrigin,
}

/// A rewritten request location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDestination {
    /// Fully qualified URL.
    Absolute(String),
    /// Origin-relative path and query; needs an origin before dispatch.
    Relative(String),
}

impl ProxyDestination {
    /// Joins a relative destination onto `origin`. Absolute destinations
    /// are returned unchanged.
    #[must_use]
    pub fn with_origin(&self, origin: &str) -> String {
        match self {
            Self::Absolute(url) => url.clone(),
            Self::Relative(path) => format!("{}{path}", origin.trim_end_matches('/')),
        }
    }
}

impl fmt::Display for ProxyDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(url) | Self::Relative(url) => f.write_str(url),
        }
    }
}

/// Rewrite rule for one path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    prefix: String,
    target: ProxyTarget,
}

impl ProxyRule {
    /// Builds the `/api/**` rule for `environment`.
    ///
    /// Development forwards to `http://{backend}/**`; every other
    /// environment keeps the request on the same origin as `/**`.
    #[must_use]
    pub fn for_environment(environment: Environment, backend: SocketAddr) -> Self {
        let target = if environment.is_development() {
            ProxyTarget::Absolute(format!("http://{backend}"))
        } else {
            ProxyTarget::SameOrigin
        };
        Self {
            prefix: API_PREFIX.to_string(),
            target,
        }
    }

    /// Parses a rule from route-rule notation, e.g.
    /// `("/api/**", "http://127.0.0.1:8000/**")` or `("/api/**", "/**")`.
    ///
    /// Returns `None` unless both sides end in the `/**` wildcard.
    #[must_use]
    pub fn from_patterns(pattern: &str, target: &str) -> Option<Self> {
        let prefix = pattern.strip_suffix(WILDCARD)?;
        let base = target.strip_suffix(WILDCARD)?;
        let target = if base.is_empty() {
            ProxyTarget::SameOrigin
        } else {
            ProxyTarget::Absolute(base.to_string())
        };
        Some(Self {
            prefix: prefix.to_string(),
            target,
        })
    }

    /// The matched path prefix (without wildcard).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The rule's target.
    #[must_use]
    pub const fn target(&self) -> &ProxyTarget {
        &self.target
    }

    /// Returns `true` if `path` falls under this rule's prefix.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.captured(path).is_some()
    }

    /// Rewrites `path_and_query`, or returns `None` if the path is not
    /// under the prefix.
    #[must_use]
    pub fn rewrite(&self, path_and_query: &str) -> Option<ProxyDestination> {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        let rest = self.captured(path)?;
        let rest = if rest.is_empty() { "/" } else { rest };

        let mut location = match &self.target {
            ProxyTarget::Absolute(base) => format!("{base}{rest}"),
            ProxyTarget::SameOrigin => rest.to_string(),
        };
        if let Some(query) = query {
            location.push('?');
            location.push_str(query);
        }

        Some(match self.target {
            ProxyTarget::Absolute(_) => ProxyDestination::Absolute(location),
            ProxyTarget::SameOrigin => ProxyDestination::Relative(location),
        })
    }

    /// The part of `path` after the prefix, starting with `/` or empty.
    fn captured<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

impl fmt::Display for ProxyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            ProxyTarget::Absolute(base) => write!(f, "{}/** -> {base}/**", self.prefix),
            ProxyTarget::SameOrigin => write!(f, "{}/** -> /**", self.prefix),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn backend() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 8000))
    }

    #[test]
    fn development_targets_loopback_backend() {
        let rule = ProxyRule::for_environment(Environment::Development, backend());
        assert_eq!(
            rule.rewrite("/api/levels/3"),
            Some(ProxyDestination::Absolute(
                "http://127.0.0.1:8000/levels/3".to_string()
            ))
        );
    }

    #[test]
    fn production_stays_same_origin() {
        let rule = ProxyRule::for_environment(Environment::Production, backend());
        assert_eq!(
            rule.rewrite("/api/levels/3"),
            Some(ProxyDestination::Relative("/levels/3".to_string()))
        );
    }

    #[test]
    fn query_string_is_preserved() {
        let rule = ProxyRule::for_environment(Environment::Development, backend());
        let Some(dest) = rule.rewrite("/api/search?q=goal&page=2") else {
            panic!("expected a match");
        };
        assert_eq!(dest.to_string(), "http://127.0.0.1:8000/search?q=goal&page=2");
    }

    #[test]
    fn bare_prefix_maps_to_root() {
        let rule = ProxyRule::for_environment(Environment::Development, backend());
        assert_eq!(
            rule.rewrite("/api").map(|d| d.to_string()),
            Some("http://127.0.0.1:8000/".to_string())
        );
        assert_eq!(
            rule.rewrite("/api/").map(|d| d.to_string()),
            Some("http://127.0.0.1:8000/".to_string())
        );
    }

    #[test]
    fn lookalike_prefixes_do_not_match() {
        let rule = ProxyRule::for_environment(Environment::Development, backend());
        assert!(rule.rewrite("/apiary").is_none());
        assert!(rule.rewrite("/").is_none());
        assert!(rule.rewrite("/tv/levelselector").is_none());
        assert!(!rule.matches("/api-docs"));
        assert!(rule.matches("/api/x"));
    }

    #[test]
    fn rewrite_is_deterministic_per_environment() {
        for env in [Environment::Development, Environment::Production] {
            let rule = ProxyRule::for_environment(env, backend());
            assert_eq!(rule.rewrite("/api/a/b"), rule.rewrite("/api/a/b"));
        }
    }

    #[test]
    fn patterns_match_environment_rules() {
        let dev = ProxyRule::from_patterns("/api/**", "http://127.0.0.1:8000/**");
        assert_eq!(
            dev,
            Some(ProxyRule::for_environment(Environment::Development, backend()))
        );

        let prod = ProxyRule::from_patterns("/api/**", "/**");
        assert_eq!(
            prod,
            Some(ProxyRule::for_environment(Environment::Production, backend()))
        );

        assert!(ProxyRule::from_patterns("/api", "/**").is_none());
        assert!(ProxyRule::from_patterns("/api/**", "http://x").is_none());
    }

    #[test]
    fn relative_destination_joins_origin() {
        let dest = ProxyDestination::Relative("/levels?x=1".to_string());
        assert_eq!(
            dest.with_origin("https://arena.example/"),
            "https://arena.example/levels?x=1"
        );
        let abs = ProxyDestination::Absolute("http://a/b".to_string());
        assert_eq!(abs.with_origin("https://ignored"), "http://a/b");
    }

    #[test]
    fn display_uses_route_rule_notation() {
        let rule = ProxyRule::for_environment(Environment::Development, backend());
        assert_eq!(rule.to_string(), "/api/** -> http://127.0.0.1:8000/**");
        let rule = ProxyRule::for_environment(Environment::Production, backend());
        assert_eq!(rule.to_string(), "/api/** -> /**");
    }
}
