//! Serializable rendering of a call outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gwb_core::error::{GwbError, GwbResult};

/// `{ok, payload?, error?, details?}` as handed back to bridge callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RpcReply {
    pub fn success(payload: Value) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            error: None,
            code: None,
            details: None,
        }
    }

    pub fn failure(err: &GwbError) -> Self {
        let (code, details) = match err {
            GwbError::Protocol { code, .. } => (code.clone(), None),
            GwbError::Transport(_) | GwbError::Codec(_) | GwbError::Other(_) => {
                (None, Some(format!("{err:?}")))
            }
            _ => (None, None),
        };
        Self {
            ok: false,
            payload: None,
            error: Some(err.to_string()),
            code,
            details,
        }
    }
}

impl From<GwbResult<Value>> for RpcReply {
    fn from(result: GwbResult<Value>) -> Self {
        match result {
            Ok(payload) => RpcReply::success(payload),
            Err(err) => RpcReply::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_payload_only() {
        let reply = RpcReply::from(Ok(json!({"n": 1})));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"ok": true, "payload": {"n": 1}})
        );
    }

    #[test]
    fn timeout_keeps_contract_string() {
        let reply = RpcReply::from(Err(GwbError::ConnectionTimeout));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"ok": false, "error": "Connection timeout"})
        );
    }

    #[test]
    fn transport_failures_carry_details() {
        let reply = RpcReply::from(Err(GwbError::Transport("refused".into())));
        assert_eq!(reply.error.as_deref(), Some("refused"));
        assert!(reply.details.as_deref().unwrap().contains("Transport"));
    }

    #[test]
    fn method_errors_keep_code() {
        let reply = RpcReply::from(Err(GwbError::Protocol {
            code: Some("INVALID_REQUEST".into()),
            message: "bad params".into(),
        }));
        assert_eq!(reply.error.as_deref(), Some("bad params"));
        assert_eq!(reply.code.as_deref(), Some("INVALID_REQUEST"));
        assert!(reply.details.is_none());
    }
}
