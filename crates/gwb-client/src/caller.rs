//! The seam between RPC-composing helpers and the client.

use serde_json::Value;

use gwb_core::error::GwbResult;

use crate::client::GatewayClient;
use crate::target::GatewayTarget;

/// Something that can perform one gateway RPC call.
///
/// Helpers such as chat history and the WhatsApp guard are written against
/// this trait so they can run against a recording fake in tests.
#[allow(async_fn_in_trait)]
pub trait RpcCaller {
    async fn rpc(&self, method: &str, params: Value) -> GwbResult<Value>;
}

/// A client paired with the target it calls.
#[derive(Debug, Clone)]
pub struct BoundClient {
    pub client: GatewayClient,
    pub target: GatewayTarget,
}

impl BoundClient {
    pub fn new(client: GatewayClient, target: GatewayTarget) -> Self {
        Self { client, target }
    }
}

impl RpcCaller for BoundClient {
    async fn rpc(&self, method: &str, params: Value) -> GwbResult<Value> {
        self.client.call(&self.target, method, params).await
    }
}
