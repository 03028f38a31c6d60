//! `gwb history <user>`: print a user's chat session history.

use anyhow::{Context, Result};
use serde_json::json;

use gwb_client::{build_session_key, fetch_chat_history, fetch_sanitized_history, BoundClient};

use super::print_json;

pub async fn run(
    gateway: &BoundClient,
    user: &str,
    agent: Option<&str>,
    limit: Option<u32>,
    raw: bool,
) -> Result<()> {
    let session_key = build_session_key(user, agent);
    let messages = if raw {
        fetch_chat_history(gateway, &session_key, limit).await
    } else {
        fetch_sanitized_history(gateway, &session_key, limit).await
    }
    .with_context(|| format!("failed to fetch history for {session_key}"))?;

    print_json(&json!({
        "sessionKey": session_key,
        "count": messages.len(),
        "messages": messages,
    }))
}
