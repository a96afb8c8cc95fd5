//! The connection store: owner of the single held socket handle.

use std::sync::Arc;

use axum::http::Uri;
use chrono::Utc;
use tokio::sync::{Mutex, broadcast};

use super::connector::{SocketConnector, TungsteniteConnector};
use super::event_bus::{ConnectionEvent, ConnectionEventKind, EventBus};
use super::handle::{ConnectionHandle, ReadyState};
use crate::error::ShellError;

/// Holds at most one live socket connection.
///
/// Passed around explicitly (typically inside `AppState`); there is no
/// process-wide instance.
///
/// `disconnect` requests closure but keeps the handle in the slot, so
/// [`current`](Self::current) keeps returning it with its final state
/// until the next `connect` replaces it.
#[derive(Debug)]
pub struct ConnectionStore {
    connector: Arc<dyn SocketConnector>,
    slot: Mutex<Option<ConnectionHandle>>,
    events: EventBus,
}

impl ConnectionStore {
    /// Creates an empty store that opens connections through `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn SocketConnector>, events: EventBus) -> Self {
        Self {
            connector,
            slot: Mutex::new(None),
            events,
        }
    }

    /// Creates an empty store using the WebSocket connector.
    #[must_use]
    pub fn with_websockets(event_capacity: usize) -> Self {
        Self::new(Arc::new(TungsteniteConnector), EventBus::new(event_capacity))
    }

    /// Connects to `url` unless the held connection is already open.
    ///
    /// A held handle in any state other than `Open` is replaced; if it has
    /// not finished closing it is asked to close first. Returns without
    /// waiting for the handshake: use [`ConnectionHandle::opened`] or
    /// [`subscribe`](Self::subscribe) to learn the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::InvalidSocketUrl`] unless `url` is an absolute
    /// `ws://` or `wss://` URL.
    pub async fn connect(&self, url: &str) -> Result<ConnectionHandle, ShellError> {
        validate_socket_url(url)?;

        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.as_ref()
            && existing.is_open()
        {
            tracing::debug!(connection_id = %existing.id(), url = %existing.url(), "socket already open");
            return Ok(existing.clone());
        }

        if let Some(stale) = slot.take()
            && stale.ready_state() != ReadyState::Closed
        {
            tracing::debug!(connection_id = %stale.id(), state = %stale.ready_state(), "replacing socket");
            stale.close();
        }

        let handle = self.connector.open(url);
        tracing::info!(connection_id = %handle.id(), %url, "socket connecting");
        observe(handle.clone(), self.events.clone());
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Requests closure of the held connection, if any.
    ///
    /// The handle stays in the slot afterwards.
    pub async fn disconnect(&self) {
        let slot = self.slot.lock().await;
        if let Some(handle) = slot.as_ref() {
            tracing::info!(connection_id = %handle.id(), state = %handle.ready_state(), "socket disconnect requested");
            handle.close();
        }
    }

    /// The held handle, if any.
    pub async fn current(&self) -> Option<ConnectionHandle> {
        self.slot.lock().await.clone()
    }

    /// Receives `Opened`/`Closed` events for connections made after the call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// The store's event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }
}

/// Accepts absolute `ws://` / `wss://` URLs with a host.
fn validate_socket_url(url: &str) -> Result<(), ShellError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| ShellError::InvalidSocketUrl(format!("{url}: {e}")))?;
    match (uri.scheme_str(), uri.host()) {
        (Some("ws" | "wss"), Some(host)) if !host.is_empty() => Ok(()),
        _ => Err(ShellError::InvalidSocketUrl(format!(
            "{url}: expected ws:// or wss://"
        ))),
    }
}

/// Logs and publishes the open and close transitions of `handle`.
fn observe(handle: ConnectionHandle, events: EventBus) {
    tokio::spawn(async move {
        let mut rx = handle.watch_state();
        let mut announced_open = false;
        loop {
            let state = *rx.borrow_and_update();
            if !announced_open && handle.has_opened() {
                announced_open = true;
                tracing::info!(connection_id = %handle.id(), url = %handle.url(), "socket connected");
                publish(&events, &handle, ConnectionEventKind::Opened);
            }
            if state == ReadyState::Closed {
                tracing::info!(connection_id = %handle.id(), url = %handle.url(), "socket closed");
                publish(&events, &handle, ConnectionEventKind::Closed);
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    });
}

fn publish(events: &EventBus, handle: &ConnectionHandle, kind: ConnectionEventKind) {
    events.publish(ConnectionEvent {
        connection_id: handle.id(),
        url: handle.url().to_string(),
        kind,
        timestamp: Utc::now(),
    });
}
