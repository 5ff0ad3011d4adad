//! Streaming-transport seam and the websocket production adapter.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("transport connect failed: {reason}")]
    Connect {
        /// Underlying failure.
        reason: String,
    },
}

/// Events a live transport delivers to its owner.
#[derive(Debug)]
pub enum TransportEvent {
    /// One inbound text frame.
    Frame(String),
    /// The connection ended; no further events follow.
    Closed {
        /// Close cause, for logging.
        reason: String,
    },
}

/// Handle to a live transport connection.
///
/// Dropping `outbound` closes the connection; `events` yields frames until
/// a final [`TransportEvent::Closed`].
pub struct TransportHandle {
    /// Outbound text frames.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Inbound frames and the close signal.
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Dyn-safe seam over the streaming transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> Result<TransportHandle, TransportError>;
}

/// Production transport over a websocket.
#[derive(Debug, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<TransportHandle, TransportError> {
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect { reason: e.to_string() })?;
        tracing::debug!(%url, "websocket open");

        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(Message::Text(text)) => {
                        if event_tx.send(TransportEvent::Frame(text)).is_err() {
                            return;
                        }
                    },
                    Ok(Message::Close(_)) => {
                        let _ = event_tx.send(TransportEvent::Closed {
                            reason: "closed by remote".to_string(),
                        });
                        return;
                    },
                    // Control and binary frames carry no session payload.
                    Ok(_) => {},
                    Err(e) => {
                        let _ = event_tx.send(TransportEvent::Closed { reason: e.to_string() });
                        return;
                    },
                }
            }
            let _ = event_tx
                .send(TransportEvent::Closed { reason: "stream ended".to_string() });
        });

        Ok(TransportHandle { outbound: outbound_tx, events: event_rx })
    }
}
