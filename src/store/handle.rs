//! Connection handles and their ready-state machine.
//!
//! A [`ConnectionHandle`] is the consumer-facing side of one socket; the
//! paired [`HandleDriver`] is given to whatever actually runs the socket
//! and is the only thing allowed to move it to `Open` or `Closed`.
//!
//! ```text
//! Connecting ──▶ Open ──▶ Closing ──▶ Closed
//!      │                    ▲            ▲
//!      └──── close() ───────┘            │
//!      └──── connect failed ─────────────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::ShellError;

/// Unique identifier for a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Socket ready state, mirroring the browser `WebSocket.readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// Handshake in progress.
    Connecting,
    /// Handshake done; frames can flow.
    Open,
    /// Closure requested, not yet finished.
    Closing,
    /// Terminal.
    Closed,
}

impl ReadyState {
    /// Lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Shared {
    id: ConnectionId,
    url: String,
    state: watch::Sender<ReadyState>,
    close_requested: watch::Sender<bool>,
    close_requests: AtomicUsize,
    reached_open: AtomicBool,
}

/// Cloneable reference to one socket connection.
///
/// Clones observe the same connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
}

impl ConnectionHandle {
    /// Creates a handle in the `Connecting` state together with the driver
    /// that resolves it.
    #[must_use]
    pub fn pair(url: impl Into<String>) -> (Self, HandleDriver) {
        let (state, _) = watch::channel(ReadyState::Connecting);
        let (close_requested, close_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            id: ConnectionId::new(),
            url: url.into(),
            state,
            close_requested,
            close_requests: AtomicUsize::new(0),
            reached_open: AtomicBool::new(false),
        });
        let driver = HandleDriver {
            shared: Arc::clone(&shared),
            close_rx,
        };
        (Self { shared }, driver)
    }

    /// The connection's identifier.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    /// The endpoint this connection targets.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// Current ready state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        *self.shared.state.borrow()
    }

    /// Returns `true` while the state is `Open`.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    /// Returns `true` if the connection ever reached `Open`.
    #[must_use]
    pub fn has_opened(&self) -> bool {
        self.shared.reached_open.load(Ordering::Acquire)
    }

    /// Requests closure. A `Connecting` or `Open` connection moves to
    /// `Closing`; the driver finishes the transition to `Closed`.
    pub fn close(&self) {
        self.shared.close_requests.fetch_add(1, Ordering::Relaxed);
        self.shared.close_requested.send_replace(true);
        self.shared.state.send_if_modified(|state| {
            if matches!(state, ReadyState::Connecting | ReadyState::Open) {
                *state = ReadyState::Closing;
                true
            } else {
                false
            }
        });
    }

    /// How many times [`close`](Self::close) has been called.
    #[must_use]
    pub fn close_requests(&self) -> usize {
        self.shared.close_requests.load(Ordering::Relaxed)
    }

    /// Receiver that observes every ready-state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ReadyState> {
        self.shared.state.subscribe()
    }

    /// Waits until the connection is open.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::ConnectionClosed`] if the connection ended
    /// before completing its handshake.
    pub async fn opened(&self) -> Result<(), ShellError> {
        let mut rx = self.watch_state();
        rx.wait_for(|state| *state != ReadyState::Connecting)
            .await
            .map_err(|e| ShellError::Internal(e.to_string()))?;
        if self.has_opened() {
            Ok(())
        } else {
            Err(ShellError::ConnectionClosed(self.url().to_string()))
        }
    }

    /// Waits until the connection reaches `Closed`.
    pub async fn closed(&self) {
        let mut rx = self.watch_state();
        // The sender lives in `self`, so the wait cannot fail.
        let _ = rx.wait_for(|state| *state == ReadyState::Closed).await;
    }
}

/// Driving side of a [`ConnectionHandle`].
///
/// Dropping the driver moves the handle to `Closed`.
#[derive(Debug)]
pub struct HandleDriver {
    shared: Arc<Shared>,
    close_rx: watch::Receiver<bool>,
}

impl HandleDriver {
    /// A handle observing this driver's connection.
    #[must_use]
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The endpoint to connect to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// Marks the handshake as complete.
    ///
    /// Returns `false`, leaving the state untouched, if closure was
    /// requested while connecting.
    pub fn mark_open(&self) -> bool {
        let shared = &self.shared;
        shared.state.send_if_modified(|state| {
            if *state == ReadyState::Connecting {
                shared.reached_open.store(true, Ordering::Release);
                *state = ReadyState::Open;
                true
            } else {
                false
            }
        })
    }

    /// Marks the connection as finished.
    pub fn mark_closed(&self) {
        self.shared.state.send_if_modified(|state| {
            if *state == ReadyState::Closed {
                false
            } else {
                *state = ReadyState::Closed;
                true
            }
        });
    }

    /// Returns `true` once any handle has requested closure.
    #[must_use]
    pub fn is_close_requested(&self) -> bool {
        *self.close_rx.borrow()
    }

    /// Resolves once any handle has requested closure.
    pub async fn close_requested(&mut self) {
        // The sender lives in `self.shared`, so the wait cannot fail.
        let _ = self.close_rx.wait_for(|requested| *requested).await;
    }
}

impl Drop for HandleDriver {
    fn drop(&mut self) {
        self.mark_closed();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, assert_ready_err, assert_ready_ok, task};

    #[test]
    fn new_handle_is_connecting() {
        let (handle, _driver) = ConnectionHandle::pair("ws://localhost:9999");
        assert_eq!(handle.ready_state(), ReadyState::Connecting);
        assert_eq!(handle.url(), "ws://localhost:9999");
        assert!(!handle.is_open());
        assert_eq!(handle.close_requests(), 0);
    }

    #[test]
    fn driver_opens_then_closes() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        assert!(driver.mark_open());
        assert!(handle.is_open());
        assert!(handle.has_opened());

        driver.mark_closed();
        assert_eq!(handle.ready_state(), ReadyState::Closed);
        assert!(handle.has_opened());
    }

    #[test]
    fn close_while_connecting_blocks_open() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        handle.close();
        assert_eq!(handle.ready_state(), ReadyState::Closing);
        assert!(driver.is_close_requested());
        assert!(!driver.mark_open());
        assert!(!handle.has_opened());
    }

    #[test]
    fn close_after_closed_keeps_closed() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        driver.mark_closed();
        handle.close();
        assert_eq!(handle.ready_state(), ReadyState::Closed);
        assert_eq!(handle.close_requests(), 1);
    }

    #[test]
    fn dropping_driver_closes_handle() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        drop(driver);
        assert_eq!(handle.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn clones_share_state() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        let other = handle.clone();
        assert_eq!(handle.id(), other.id());
        assert!(driver.mark_open());
        assert!(other.is_open());
        assert_eq!(driver.handle().id(), handle.id());
    }

    #[test]
    fn opened_stays_pending_until_driver_resolves() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        let mut opened = task::spawn(handle.opened());
        assert_pending!(opened.poll());

        assert!(driver.mark_open());
        assert!(opened.is_woken());
        assert_ready_ok!(opened.poll());
    }

    #[test]
    fn opened_errors_when_connect_fails() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        let mut opened = task::spawn(handle.opened());
        assert_pending!(opened.poll());

        drop(driver);
        assert_ready_err!(opened.poll());
    }

    #[test]
    fn closed_resolves_on_close() {
        let (handle, driver) = ConnectionHandle::pair("ws://a");
        let mut closed = task::spawn(handle.closed());
        assert_pending!(closed.poll());

        handle.close();
        assert_pending!(closed.poll());

        driver.mark_closed();
        assert_ready!(closed.poll());
    }

    #[tokio::test]
    async fn driver_sees_close_request() {
        let (handle, mut driver) = ConnectionHandle::pair("ws://a");
        handle.close();
        driver.close_requested().await;
        assert!(driver.is_close_requested());
    }
}
