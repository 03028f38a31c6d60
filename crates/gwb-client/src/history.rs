//! Chat history retrieval.

use std::borrow::Cow;

use serde_json::{json, Value};

use gwb_core::error::GwbResult;
use gwb_core::sanitize::sanitize_messages;

use crate::caller::RpcCaller;

/// Largest page the gateway serves for `chat.history`.
pub const MAX_HISTORY_LIMIT: u32 = 1000;

/// Fetch the raw messages stored under `session_key`.
///
/// `limit` defaults to, and is clamped at, [`MAX_HISTORY_LIMIT`]. A payload
/// without a `messages` array yields an empty list.
pub async fn fetch_chat_history<C: RpcCaller>(
    caller: &C,
    session_key: &str,
    limit: Option<u32>,
) -> GwbResult<Vec<Value>> {
    let limit = limit.unwrap_or(MAX_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let payload = caller
        .rpc(
            "chat.history",
            json!({ "sessionKey": session_key, "limit": limit }),
        )
        .await?;

    let messages = match payload {
        Value::Object(mut map) => match map.remove("messages") {
            Some(Value::Array(messages)) => messages,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    tracing::debug!(session_key = %session_key, count = messages.len(), "fetched chat history");
    Ok(messages)
}

/// Fetch history with envelope wrappers stripped from user messages.
pub async fn fetch_sanitized_history<C: RpcCaller>(
    caller: &C,
    session_key: &str,
    limit: Option<u32>,
) -> GwbResult<Vec<Value>> {
    let messages = fetch_chat_history(caller, session_key, limit).await?;
    if let Cow::Owned(cleaned) = sanitize_messages(&messages) {
        return Ok(cleaned);
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::fake::RecordingCaller;
    use gwb_core::messages::build_session_key;

    #[tokio::test]
    async fn unwraps_messages_and_clamps_limit() {
        let caller = RecordingCaller::default().ok(
            "chat.history",
            json!({"sessionKey": "k", "messages": [{"role": "user", "content": "hi"}]}),
        );
        let key = build_session_key("u1", None);

        let messages = fetch_chat_history(&caller, &key, Some(5_000)).await.unwrap();
        assert_eq!(messages.len(), 1);

        let calls = caller.calls();
        assert_eq!(calls[0].0, "chat.history");
        assert_eq!(calls[0].1["sessionKey"], "agent:main:openai-user:u1");
        assert_eq!(calls[0].1["limit"], 1000);
    }

    #[tokio::test]
    async fn default_limit_and_missing_messages() {
        let caller = RecordingCaller::default().ok("chat.history", json!({"sessionKey": "k"}));
        let messages = fetch_chat_history(&caller, "k", None).await.unwrap();
        assert!(messages.is_empty());
        assert_eq!(caller.calls()[0].1["limit"], 1000);

        let caller = RecordingCaller::default().ok("chat.history", json!(null));
        assert!(fetch_chat_history(&caller, "k", Some(0)).await.unwrap().is_empty());
        assert_eq!(caller.calls()[0].1["limit"], 1);
    }

    #[tokio::test]
    async fn errors_propagate() {
        let caller = RecordingCaller::default().fail("chat.history", "session not found");
        let err = fetch_chat_history(&caller, "k", None).await.unwrap_err();
        assert_eq!(err.to_string(), "session not found");
    }

    #[tokio::test]
    async fn sanitized_history_strips_user_wrappers() {
        let caller = RecordingCaller::default().ok(
            "chat.history",
            json!({"messages": [
                {"role": "user", "content": "System: [cron] tick\n\nwhat time is it?"},
                {"role": "assistant", "content": "System: [x] stays"}
            ]}),
        );
        let messages = fetch_sanitized_history(&caller, "k", None).await.unwrap();
        assert_eq!(messages[0]["content"], "what time is it?");
        assert_eq!(messages[1]["content"], "System: [x] stays");
    }
}
