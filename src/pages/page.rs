//! The two pages the shell serves.

use std::fmt;

use serde::Serialize;

/// A registered page component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Landing page at `/`.
    Home,
    /// TV level selector at `/tv/levelselector`.
    LevelSelector,
}

impl Page {
    /// Every page, in registration order.
    pub const ALL: [Self; 2] = [Self::Home, Self::LevelSelector];

    /// Canonical path the page is registered under.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::LevelSelector => "/tv/levelselector",
        }
    }

    /// Document title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Arena",
            Self::LevelSelector => "Arena · Level Selector",
        }
    }

    /// Stable component name, exposed to the client as `data-page`.
    #[must_use]
    pub const fn component(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::LevelSelector => "level_selector",
        }
    }

    /// Renders the page's HTML document.
    #[must_use]
    pub fn render(self) -> String {
        format!(
            "<!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
             <body><div id=\"app\" data-page=\"{component}\" data-path=\"{path}\"></div></body>\n\
             </html>\n",
            title = self.title(),
            component = self.component(),
            path = self.path(),
        )
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.component())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_document_names_the_component() {
        let html = Page::LevelSelector.render();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("data-page=\"level_selector\""));
        assert!(html.contains("<title>Arena · Level Selector</title>"));
    }

    #[test]
    fn paths_are_distinct() {
        assert_ne!(Page::Home.path(), Page::LevelSelector.path());
    }
}
