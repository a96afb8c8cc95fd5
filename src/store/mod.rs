//! Connection store: one socket handle, owned explicitly.
//!
//! [`ConnectionStore`] keeps at most one non-closed [`ConnectionHandle`].
//! Lifecycle transitions are observable three ways: polling
//! [`ConnectionHandle::ready_state`], awaiting
//! [`ConnectionHandle::opened`] / [`ConnectionHandle::closed`], or
//! subscribing to the store's [`EventBus`].

pub mod connection_store;
pub mod connector;
pub mod event_bus;
pub mod handle;

pub use connection_store::ConnectionStore;
pub use connector::{SocketConnector, TungsteniteConnector};
pub use event_bus::{ConnectionEvent, ConnectionEventKind, EventBus};
pub use handle::{ConnectionHandle, ConnectionId, HandleDriver, ReadyState};
