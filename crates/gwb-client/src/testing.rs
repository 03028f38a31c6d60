//! Test doubles: an in-process WebSocket gateway and an in-memory channel.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use gwb_core::codec::{frame_decode, frame_encode};
use gwb_core::error::GwbResult;
use gwb_core::messages::{GatewayFrame, ResponseFrame};
use gwb_core::transport::GatewayTransport;

/// What the mock gateway does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Err(Option<String>),
    /// Never answer.
    Silent,
    /// Drop the connection without answering.
    Close,
}

pub type Handler = Arc<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

/// A request the mock gateway received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub params: Value,
}

/// Minimal gateway speaking the JSON frame protocol over real WebSockets.
pub struct MockGateway {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockGateway {
    pub async fn start(handler: impl Fn(&str, &Value) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let seen_clone = seen.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let seen = seen_clone.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(msg)) = ws.next().await {
                        let Message::Text(text) = msg else { continue };
                        let Some(GatewayFrame::Request(req)) = frame_decode(&text) else {
                            continue;
                        };
                        let params = req.params.clone().unwrap_or(Value::Null);
                        seen.lock().unwrap().push(Seen {
                            method: req.method.clone(),
                            params: params.clone(),
                        });
                        let res = match handler(&req.method, &params) {
                            Reply::Ok(payload) => ResponseFrame::ok(req.id, payload),
                            Reply::Err(message) => {
                                let mut res = ResponseFrame::err(req.id, "INVALID_REQUEST", "");
                                if let Some(err) = res.error.as_mut() {
                                    err.message = message;
                                }
                                res
                            }
                            Reply::Silent => continue,
                            Reply::Close => {
                                let _ = ws.close(None).await;
                                return;
                            }
                        };
                        let text = frame_encode(&GatewayFrame::Response(res)).unwrap();
                        if ws.send(Message::Text(text)).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        Self { addr, seen }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.seen().into_iter().map(|s| s.method).collect()
    }
}

/// In-memory channel. The peer half is driven by the test.
pub struct MemoryTransport {
    rx: mpsc::UnboundedReceiver<String>,
    tx: mpsc::UnboundedSender<String>,
    pub closed: Arc<Mutex<bool>>,
}

pub struct MemoryPeer {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<String>,
}

impl MemoryPeer {
    /// Wait for the next request the client sends.
    pub async fn next_request(&mut self) -> Option<(String, String, Value)> {
        let text = self.rx.recv().await?;
        match frame_decode(&text)? {
            GatewayFrame::Request(req) => Some((req.id, req.method, req.params.unwrap_or(Value::Null))),
            _ => None,
        }
    }

    pub fn send_raw(&self, text: &str) {
        let _ = self.tx.send(text.to_string());
    }

    pub fn respond(&self, res: ResponseFrame) {
        self.send_raw(&frame_encode(&GatewayFrame::Response(res)).unwrap());
    }
}

pub fn memory_pair() -> (MemoryTransport, MemoryPeer) {
    let (client_tx, peer_rx) = mpsc::unbounded_channel();
    let (peer_tx, client_rx) = mpsc::unbounded_channel();
    (
        MemoryTransport {
            rx: client_rx,
            tx: client_tx,
            closed: Arc::new(Mutex::new(false)),
        },
        MemoryPeer {
            rx: peer_rx,
            tx: peer_tx,
        },
    )
}

impl GatewayTransport for MemoryTransport {
    async fn send_text(&mut self, text: String) -> GwbResult<()> {
        self.tx
            .send(text)
            .map_err(|_| gwb_core::GwbError::Transport("peer gone".into()))
    }

    async fn recv_text(&mut self) -> Option<GwbResult<String>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> GwbResult<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}
