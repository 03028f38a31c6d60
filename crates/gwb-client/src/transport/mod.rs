//! Gateway channel selection.
//!
//! Gateways advertise plain HTTP(S) addresses; the RPC channel is the
//! WebSocket on the same origin:
//! - `http://` → `ws://`
//! - `https://` → `wss://`
//! - `ws://` / `wss://` are used as-is

pub mod websocket;

pub use websocket::WebSocketTransport;

use gwb_core::error::{GwbError, GwbResult};

/// Rewrite a gateway address into the WebSocket URL the channel connects to.
///
/// The scheme is matched case-insensitively and a trailing slash is removed.
pub fn normalize_gateway_url(url: &str) -> GwbResult<String> {
    let trimmed = url.trim();
    let (scheme, rest) = trimmed
        .split_once("://")
        .ok_or_else(|| GwbError::InvalidTarget(format!("missing URL scheme: {trimmed}")))?;

    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(GwbError::InvalidTarget(format!(
                "unsupported URL scheme: {other} (expected http, https, ws or wss)"
            )))
        }
    };

    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Err(GwbError::InvalidTarget(format!("missing host: {trimmed}")));
    }
    Ok(format!("{ws_scheme}://{rest}"))
}

/// Install the process-wide rustls crypto provider used for `wss://`.
///
/// Safe to call repeatedly; only the first call has an effect.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_becomes_ws() {
        assert_eq!(
            normalize_gateway_url("http://10.0.0.5:18789/").unwrap(),
            "ws://10.0.0.5:18789"
        );
        assert_eq!(
            normalize_gateway_url("HTTPS://gw.example.com").unwrap(),
            "wss://gw.example.com"
        );
    }

    #[test]
    fn ws_schemes_pass_through() {
        assert_eq!(normalize_gateway_url("ws://localhost:1").unwrap(), "ws://localhost:1");
        assert_eq!(
            normalize_gateway_url("wss://gw.example.com/rpc//").unwrap(),
            "wss://gw.example.com/rpc"
        );
    }

    #[test]
    fn rejects_unknown_or_missing_scheme() {
        assert!(normalize_gateway_url("ftp://example.com").is_err());
        assert!(normalize_gateway_url("example.com").is_err());
        assert!(normalize_gateway_url("http:///").is_err());
    }
}
