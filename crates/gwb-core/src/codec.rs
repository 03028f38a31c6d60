//! JSON text framing for the gateway channel.
//!
//! Wire format: one JSON object per WebSocket text message.

use serde_json::Value;

use crate::error::GwbResult;
use crate::messages::{GatewayFrame, RequestFrame};

/// Encode a frame as a JSON text message.
pub fn frame_encode(frame: &GatewayFrame) -> GwbResult<String> {
    Ok(serde_json::to_string(frame)?)
}

/// Build and encode a `req` frame.
pub fn encode_request(id: &str, method: &str, params: Option<Value>) -> GwbResult<String> {
    frame_encode(&GatewayFrame::Request(RequestFrame {
        id: id.to_string(),
        method: method.to_string(),
        params,
    }))
}

/// Decode a text message into a frame.
///
/// Anything that is not a well-formed frame yields `None`; the channel
/// ignores such input rather than failing the call.
pub fn frame_decode(text: &str) -> Option<GatewayFrame> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_is_tagged_req() {
        let text = encode_request("abc", "chat.history", Some(json!({"limit": 5}))).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "req");
        assert_eq!(value["id"], "abc");
        assert_eq!(value["method"], "chat.history");
        assert_eq!(value["params"]["limit"], 5);
    }

    #[test]
    fn decode_response_and_event() {
        let res = frame_decode(r#"{"type":"res","id":"1","ok":false,"error":{"message":"nope"}}"#);
        assert!(matches!(res, Some(GatewayFrame::Response(ref r)) if !r.ok));

        let ev = frame_decode(r#"{"type":"event","event":"tick","seq":4}"#);
        assert!(matches!(ev, Some(GatewayFrame::Event(ref e)) if e.event == "tick"));
    }

    #[test]
    fn malformed_input_is_ignored() {
        assert!(frame_decode("not json").is_none());
        assert!(frame_decode(r#"{"type":"bogus"}"#).is_none());
        assert!(frame_decode(r#"[1,2,3]"#).is_none());
    }
}
