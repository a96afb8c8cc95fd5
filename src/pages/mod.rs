//! History-style page routing.
//!
//! [`PageRouter`] maps request paths onto the two registered [`Page`]s.
//! Matching is case-insensitive and tolerates one trailing slash; the
//! query string never takes part. Paths with no registered page resolve
//! to `None` and are served as `404 Not Found`.

pub mod handler;
pub mod page;

pub use page::Page;

/// Resolves request paths to pages.
#[derive(Debug, Clone)]
pub struct PageRouter {
    routes: Vec<(&'static str, Page)>,
}

impl Default for PageRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRouter {
    /// Creates a router with `/` and `/tv/levelselector` registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Page::ALL.iter().map(|page| (page.path(), *page)).collect(),
        }
    }

    /// Resolves `path` (optionally carrying a query string) to a page.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Page> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        let path = normalize(path);
        self.routes
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(path))
            .map(|(_, page)| *page)
    }

    /// Registered `(path, page)` pairs.
    #[must_use]
    pub fn routes(&self) -> &[(&'static str, Page)] {
        &self.routes
    }
}

/// Drops a single trailing slash, keeping the root as `/`.
fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ if path.is_empty() => "/",
        _ => path,
    }
}
