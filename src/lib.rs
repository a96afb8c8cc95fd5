//! # arena-shell
//!
//! Application shell for the arena front-end.
//!
//! The shell serves the two front-end pages, forwards `/api/**` to the
//! backend process, and owns at most one live socket connection to that
//! backend. The backend itself is an external collaborator.
//!
//! ## Architecture
//!
//! ```text
//! Browser
//!     │
//!     ├── /health, /docs        (api/)
//!     ├── /api/**  ──▶ ApiProxy (proxy/) ──▶ backend (127.0.0.1:8000 in dev)
//!     └── /, /tv/levelselector  (pages/)
//!
//! ConnectionStore (store/) ──▶ SocketConnector ──▶ backend socket
//!     └── EventBus: Opened / Closed
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod error;
pub mod pages;
pub mod proxy;
pub mod store;
