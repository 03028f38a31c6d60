//! gwb-client: async RPC client for agent gateways.
//!
//! Opens one WebSocket per call, performs the `connect` handshake with the
//! gateway token, sends the request and resolves with its payload or a
//! typed error. Chat history and the WhatsApp access guard are built on top.
//!
//! # Quick Start
//!
//! ```no_run
//! use gwb_client::{GatewayClient, GatewayTarget};
//! use serde_json::json;
//!
//! # async fn example() -> gwb_core::GwbResult<()> {
//! let client = GatewayClient::default();
//! let target = GatewayTarget {
//!     url: "http://127.0.0.1:18789".into(),
//!     token: "secret".into(),
//! };
//! let status = client.call(&target, "channels.status", json!({"probe": true})).await?;
//! println!("{status}");
//! # Ok(())
//! # }
//! ```

pub mod caller;
pub mod client;
pub mod history;
pub mod pending;
pub mod reply;
pub mod target;
pub mod transport;
pub mod whatsapp;

#[cfg(test)]
mod testing;

// Re-export primary public types.
pub use caller::{BoundClient, RpcCaller};
pub use client::{CallOptions, CallState, GatewayClient};
pub use history::{fetch_chat_history, fetch_sanitized_history, MAX_HISTORY_LIMIT};
pub use reply::RpcReply;
pub use target::{resolve_target, GatewayOverride, GatewayTarget, InstanceRecord};
pub use transport::{install_crypto_provider, normalize_gateway_url, WebSocketTransport};
pub use whatsapp::{ensure_owner_only, whatsapp_status_debug, GuardReport, GuardStage, StatusDebug};

// Re-export gwb-core error types for convenience.
pub use gwb_core::{build_session_key, GwbError, GwbResult};
