//! WebSocket channel to a gateway, one JSON frame per text message.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use gwb_core::error::{GwbError, GwbResult};
use gwb_core::transport::GatewayTransport;

/// A single WebSocket connection to a gateway.
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl WebSocketTransport {
    /// Open a WebSocket to an already-normalized `ws://` or `wss://` URL.
    pub async fn connect(url: &str) -> GwbResult<Self> {
        if url.starts_with("wss://") {
            super::install_crypto_provider();
        }

        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| GwbError::Transport(format!("WebSocket connect error: {e}")))?;

        tracing::info!("WebSocket connected to {}", url);

        Ok(Self {
            stream,
            closed: false,
        })
    }
}

impl GatewayTransport for WebSocketTransport {
    async fn send_text(&mut self, text: String) -> GwbResult<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| GwbError::Transport(format!("WebSocket send error: {e}")))
    }

    async fn recv_text(&mut self) -> Option<GwbResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!("WebSocket close frame received: {:?}", frame);
                    return None;
                }
                // tungstenite queues the pong for pings itself.
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed)
                | Err(tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)) => {
                    return None
                }
                Err(e) => {
                    return Some(Err(GwbError::Transport(format!(
                        "WebSocket read error: {e}"
                    ))))
                }
            }
        }
    }

    async fn close(&mut self) -> GwbResult<()> {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.stream.close(None).await {
                tracing::debug!("WebSocket close error (ignored): {}", e);
            }
        }
        Ok(())
    }
}
