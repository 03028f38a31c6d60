//! `gwb call <method> [--params JSON]`: one raw gateway RPC call.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use gwb_client::{BoundClient, RpcCaller, RpcReply};

use super::print_json;

/// Call `method` and print the reply. A failed call exits non-zero after
/// printing the `{ok: false, ...}` reply.
pub async fn run(gateway: &BoundClient, method: &str, params: &str) -> Result<()> {
    let params: Value = serde_json::from_str(params)
        .with_context(|| format!("--params is not valid JSON: {params}"))?;
    info!(method = %method, "calling gateway");

    let reply = RpcReply::from(gateway.rpc(method, params).await);
    print_json(&reply)?;

    match reply.error {
        Some(error) if !reply.ok => anyhow::bail!("{method} failed: {error}"),
        _ => Ok(()),
    }
}
