//! The gateway RPC client.
//!
//! Every call is a short-lived exchange on its own channel:
//!
//! ```text
//! Connecting ──open──▶ Authenticating ──connect ok──▶ AwaitingResponse ──response──▶ Closed
//!      │                     │                               │
//!      └─────── error / close / timeout ─────────────────────┴──────────────────▶ Closed
//! ```
//!
//! The whole exchange runs inside one future bounded by a wall-clock
//! deadline armed before the channel opens. The future returns exactly once;
//! on timeout it is dropped and the channel is force-closed.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use gwb_core::codec::{encode_request, frame_decode};
use gwb_core::error::{GwbError, GwbResult};
use gwb_core::messages::{ClientInfo, ConnectParams, GatewayFrame, ResponseFrame, CONNECT_METHOD};
use gwb_core::transport::GatewayTransport;

use crate::pending::PendingRequests;
use crate::target::GatewayTarget;
use crate::transport::{normalize_gateway_url, WebSocketTransport};

/// Default overall bound for one call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Upper bound on the `connect` handshake wait, whatever the overall timeout.
pub const HANDSHAKE_TIMEOUT_CAP: Duration = Duration::from_millis(15_000);

/// Timing knobs for a call.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    /// Wall-clock bound for the whole exchange, including connect.
    pub timeout: Duration,
    /// Cap on the handshake wait.
    pub handshake_cap: Duration,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            handshake_cap: HANDSHAKE_TIMEOUT_CAP,
        }
    }
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Lifecycle of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Connecting,
    Authenticating,
    AwaitingResponse,
    Closed,
}

impl CallState {
    /// Whether `self → next` is a legal step. `Closed` is terminal.
    pub fn can_transition(self, next: CallState) -> bool {
        use CallState::*;
        match (self, next) {
            (Connecting, Authenticating) | (Authenticating, AwaitingResponse) => true,
            (from, Closed) => from != Closed,
            _ => false,
        }
    }
}

/// Issues one-shot RPC calls against gateways.
#[derive(Debug, Clone, Default)]
pub struct GatewayClient {
    identity: ClientInfo,
    options: CallOptions,
}

impl GatewayClient {
    pub fn new(options: CallOptions) -> Self {
        Self {
            identity: ClientInfo::default(),
            options,
        }
    }

    pub fn with_identity(mut self, identity: ClientInfo) -> Self {
        self.identity = identity;
        self
    }

    pub fn options(&self) -> CallOptions {
        self.options
    }

    /// Connect to `target`, authenticate, call `method`, and disconnect.
    pub async fn call(&self, target: &GatewayTarget, method: &str, params: Value) -> GwbResult<Value> {
        let deadline = Instant::now() + self.options.timeout;
        let url = normalize_gateway_url(&target.url)?;
        debug!(url = %url, method = %method, "gateway call");

        let transport = match time::timeout_at(deadline, WebSocketTransport::connect(&url)).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "gateway connect failed");
                return Err(e);
            }
            Err(_) => {
                warn!(url = %url, "gateway connect timed out");
                return Err(GwbError::ConnectionTimeout);
            }
        };

        self.exchange(transport, &target.token, method, params, deadline)
            .await
    }

    /// Run the handshake and one call over an already-open channel.
    ///
    /// The overall timeout starts now.
    pub async fn call_with_transport<T: GatewayTransport>(
        &self,
        transport: T,
        token: &str,
        method: &str,
        params: Value,
    ) -> GwbResult<Value> {
        let deadline = Instant::now() + self.options.timeout;
        self.exchange(transport, token, method, params, deadline)
            .await
    }

    async fn exchange<T: GatewayTransport>(
        &self,
        transport: T,
        token: &str,
        method: &str,
        params: Value,
        deadline: Instant,
    ) -> GwbResult<Value> {
        let mut call = CallSession::new(transport, deadline);
        let bounded = time::timeout_at(
            deadline,
            call.run(&self.identity, token, method, params, self.options),
        )
        .await;
        let outcome = match bounded {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(method = %method, state = ?call.state, "gateway call timed out");
                Err(GwbError::ConnectionTimeout)
            }
        };
        call.shutdown().await;

        match &outcome {
            Ok(_) => info!(method = %method, "gateway call succeeded"),
            Err(e) => debug!(method = %method, kind = e.kind(), error = %e, "gateway call failed"),
        }
        outcome
    }
}

/// Per-call channel, pending table and state.
struct CallSession<T> {
    transport: T,
    pending: PendingRequests,
    state: CallState,
    deadline: Instant,
}

impl<T: GatewayTransport> CallSession<T> {
    fn new(transport: T, deadline: Instant) -> Self {
        Self {
            transport,
            pending: PendingRequests::new(),
            state: CallState::Connecting,
            deadline,
        }
    }

    fn transition(&mut self, next: CallState) -> GwbResult<()> {
        if !self.state.can_transition(next) {
            return Err(GwbError::Other(format!(
                "illegal call transition {:?} -> {:?}",
                self.state, next
            )));
        }
        trace!("call state {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    async fn run(
        &mut self,
        identity: &ClientInfo,
        token: &str,
        method: &str,
        params: Value,
        options: CallOptions,
    ) -> GwbResult<Value> {
        self.transition(CallState::Authenticating)?;

        let connect = serde_json::to_value(ConnectParams::new(identity.clone(), token))?;
        let handshake_wait = options.timeout.min(options.handshake_cap);
        // An unanswered handshake reports as a connection timeout.
        let hello = self
            .request(CONNECT_METHOD, connect, handshake_wait)
            .await
            .map_err(|e| match e {
                GwbError::RequestTimeout { .. } => GwbError::ConnectionTimeout,
                other => other,
            })?;
        if !hello.ok {
            let message = hello
                .error_message()
                .unwrap_or("Authentication failed")
                .to_string();
            warn!(error = %message, "gateway rejected connect");
            return Err(GwbError::AuthFailed(message));
        }

        self.transition(CallState::AwaitingResponse)?;
        debug!(method = %method, "authenticated, sending request");

        let res = self.request(method, params, options.timeout).await?;
        if res.ok {
            return Ok(res.payload.unwrap_or(Value::Null));
        }
        Err(GwbError::Protocol {
            code: res.error.as_ref().and_then(|e| e.code.clone()),
            message: res.error_message().unwrap_or("Request failed").to_string(),
        })
    }

    /// Send one correlated request and wait for its response.
    ///
    /// `wait` only applies when it is tighter than what is left of the
    /// overall deadline, so the overall bound always wins a tie.
    async fn request(&mut self, method: &str, params: Value, wait: Duration) -> GwbResult<ResponseFrame> {
        let id = Uuid::new_v4().to_string();
        let mut rx = self.pending.register(&id);
        self.transport
            .send_text(encode_request(&id, method, Some(params))?)
            .await?;

        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if wait >= remaining {
            return self.await_response(&mut rx).await;
        }
        let bounded = time::timeout(wait, self.await_response(&mut rx)).await;
        match bounded {
            Ok(res) => res,
            Err(_) => {
                self.pending.cancel(&id);
                Err(GwbError::RequestTimeout {
                    method: method.to_string(),
                })
            }
        }
    }

    /// Pump incoming frames until `rx` completes or the channel ends.
    async fn await_response(&mut self, rx: &mut oneshot::Receiver<ResponseFrame>) -> GwbResult<ResponseFrame> {
        loop {
            if let Ok(res) = rx.try_recv() {
                return Ok(res);
            }
            match self.transport.recv_text().await {
                Some(Ok(text)) => self.dispatch(&text),
                Some(Err(e)) => return Err(e),
                None => {
                    debug!(state = ?self.state, "gateway channel closed");
                    return Err(GwbError::ClosedBeforeComplete);
                }
            }
        }
    }

    fn dispatch(&mut self, text: &str) {
        match frame_decode(text) {
            Some(GatewayFrame::Response(res)) => {
                let id = res.id.clone();
                if !self.pending.resolve(res) {
                    debug!(id = ?id, "dropping response with no pending request");
                }
            }
            Some(GatewayFrame::Event(ev)) => trace!(event = %ev.event, "ignoring gateway event"),
            Some(GatewayFrame::Request(req)) => {
                debug!(method = %req.method, "ignoring gateway-initiated request")
            }
            None => debug!("ignoring malformed frame"),
        }
    }

    async fn shutdown(&mut self) {
        if self.transition(CallState::Closed).is_err() {
            return;
        }
        self.pending.clear();
        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "gateway close failed");
        }
    }
}
