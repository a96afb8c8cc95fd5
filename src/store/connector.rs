//! Socket connectors: the seam between the store and the network.

use std::fmt;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use super::handle::{ConnectionHandle, HandleDriver};

/// How long a requested close waits for the peer's close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Opens bidirectional socket connections.
///
/// `open` must not block: it returns a `Connecting` handle at once and
/// resolves it in the background.
pub trait SocketConnector: Send + Sync + fmt::Debug {
    /// Starts connecting to `url`.
    fn open(&self, url: &str) -> ConnectionHandle;
}

/// WebSocket connector backed by `tokio-tungstenite`.
///
/// Each connection runs on its own task. Incoming frames are read only to
/// keep the protocol moving (pings, close handshake); nothing is surfaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl SocketConnector for TungsteniteConnector {
    fn open(&self, url: &str) -> ConnectionHandle {
        let (handle, driver) = ConnectionHandle::pair(url);
        tokio::spawn(drive(driver));
        handle
    }
}

async fn drive(mut driver: HandleDriver) {
    let url = driver.url().to_string();
    let id = driver.handle().id();

    let stream = tokio::select! {
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!(connection_id = %id, %url, error = %e, "socket connect failed");
                return;
            }
        },
        () = driver.close_requested() => {
            tracing::debug!(connection_id = %id, %url, "connect abandoned");
            return;
        }
    };

    if !driver.mark_open() {
        let mut stream = stream;
        let _ = stream.close(None).await;
        return;
    }

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(connection_id = %id, ?frame, "peer closed socket");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %id, error = %e, "socket error");
                    break;
                }
                None => break,
            },
            () = driver.close_requested() => {
                if sink.send(Message::Close(None)).await.is_ok() {
                    let drain = async {
                        while let Some(Ok(frame)) = source.next().await {
                            if frame.is_close() {
                                break;
                            }
                        }
                    };
                    if tokio::time::timeout(CLOSE_GRACE, drain).await.is_err() {
                        tracing::debug!(connection_id = %id, "peer did not acknowledge close");
                    }
                }
                break;
            }
        }
    }
    // Dropping the driver marks the handle closed.
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Error;
    use tokio_tungstenite::tungstenite::error::UrlError;

    #[tokio::test]
    async fn secure_urls_attempt_a_tls_handshake() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            // Hang up before any handshake bytes.
            if let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let Err(err) = tokio_tungstenite::connect_async(format!("wss://{addr}/ws/mobile")).await
        else {
            panic!("a bare TCP peer cannot complete a TLS handshake");
        };
        assert!(
            !matches!(err, Error::Url(UrlError::TlsFeatureNotEnabled)),
            "wss is unsupported: {err}"
        );
    }
}
