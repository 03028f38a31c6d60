//! Gateway wire frames.
//!
//! Every frame is a JSON text message discriminated by `type`:
//! `req` (client → gateway call), `res` (gateway → client result) and
//! `event` (unsolicited server push, never correlated).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version offered as both `minProtocol` and `maxProtocol`.
pub const PROTOCOL_VERSION: u32 = 3;

/// Handshake method name.
pub const CONNECT_METHOD: &str = "connect";

/// Static identity this bridge presents during `connect`.
pub const CLIENT_ID: &str = "gwb-bridge";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLIENT_PLATFORM: &str = "server";
pub const CLIENT_MODE: &str = "backend";

/// Error body carried by a failed response. Both fields are optional on the
/// wire; gateways in the field omit either one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Missing ids are tolerated at decode time and dropped at dispatch.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl ResponseFrame {
    pub fn ok(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Some(id.into()),
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn err(id: impl Into<String>, code: &str, message: &str) -> Self {
        Self {
            id: Some(id.into()),
            ok: false,
            payload: None,
            error: Some(ErrorShape {
                code: Some(code.to_string()),
                message: Some(message.to_string()),
            }),
        }
    }

    /// The error message, if the gateway sent one.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// Discriminated union of all frame types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayFrame {
    #[serde(rename = "req")]
    Request(RequestFrame),
    #[serde(rename = "res")]
    Response(ResponseFrame),
    #[serde(rename = "event")]
    Event(EventFrame),
}

// ── Connect handshake ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: String,
    pub version: String,
    pub platform: String,
    pub mode: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            id: CLIENT_ID.to_string(),
            version: CLIENT_VERSION.to_string(),
            platform: CLIENT_PLATFORM.to_string(),
            mode: CLIENT_MODE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectAuth {
    pub token: String,
}

/// Parameters of the `connect` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "minProtocol")]
    pub min_protocol: u32,
    #[serde(rename = "maxProtocol")]
    pub max_protocol: u32,
    pub client: ClientInfo,
    pub auth: ConnectAuth,
}

impl ConnectParams {
    pub fn new(client: ClientInfo, token: &str) -> Self {
        Self {
            min_protocol: PROTOCOL_VERSION,
            max_protocol: PROTOCOL_VERSION,
            client,
            auth: ConnectAuth {
                token: token.to_string(),
            },
        }
    }
}

// ── Session keys ─────────────────────────────────────────────────────

/// Agent used when the caller does not name one.
pub const DEFAULT_AGENT_ID: &str = "main";

/// Compose the gateway session key for an OpenAI-compatible user.
///
/// The gateway's chat-history store indexes conversations by this exact
/// string, so the layout must not drift.
pub fn build_session_key(user_id: &str, agent_id: Option<&str>) -> String {
    let agent = agent_id.unwrap_or(DEFAULT_AGENT_ID);
    format!("agent:{agent}:openai-user:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connect_params_wire_shape() {
        let params = ConnectParams::new(ClientInfo::default(), "secret");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["minProtocol"], json!(PROTOCOL_VERSION));
        assert_eq!(value["maxProtocol"], json!(PROTOCOL_VERSION));
        assert_eq!(value["client"]["id"], json!("gwb-bridge"));
        assert_eq!(value["client"]["platform"], json!("server"));
        assert_eq!(value["client"]["mode"], json!("backend"));
        assert_eq!(value["auth"]["token"], json!("secret"));
    }

    #[test]
    fn response_without_id_still_decodes() {
        let frame: GatewayFrame = serde_json::from_str(r#"{"type":"res","ok":true}"#).unwrap();
        match frame {
            GatewayFrame::Response(res) => assert!(res.id.is_none()),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn error_message_ignores_empty() {
        let mut res = ResponseFrame::err("1", "X", "");
        assert_eq!(res.error_message(), None);
        res.error = Some(ErrorShape {
            code: None,
            message: Some("bad token".into()),
        });
        assert_eq!(res.error_message(), Some("bad token"));
    }

    #[test]
    fn session_key_format() {
        assert_eq!(build_session_key("u-42", None), "agent:main:openai-user:u-42");
        assert_eq!(
            build_session_key("u-42", Some("support")),
            "agent:support:openai-user:u-42"
        );
    }
}
