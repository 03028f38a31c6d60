use thiserror::Error;

/// Errors produced by the gateway bridge.
///
/// The `Display` strings of the connection-level variants are part of the
/// bridge's contract: callers surface them verbatim and match on them to
/// tell a dead gateway apart from a rejected credential.
#[derive(Debug, Error)]
pub enum GwbError {
    #[error("{0}")]
    Transport(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Request timeout: {method}")]
    RequestTimeout { method: String },

    #[error("Connection closed before completing")]
    ClosedBeforeComplete,

    #[error("{0}")]
    AuthFailed(String),

    #[error("{message}")]
    Protocol {
        code: Option<String>,
        message: String,
    },

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid gateway target: {0}")]
    InvalidTarget(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("{0}")]
    Other(String),
}

impl GwbError {
    /// Whether a caller could reasonably retry the same call later.
    ///
    /// Timeouts and transport failures are transient; a rejected credential or
    /// a gateway-side method error will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GwbError::Transport(_)
                | GwbError::ConnectionTimeout
                | GwbError::RequestTimeout { .. }
                | GwbError::ClosedBeforeComplete
        )
    }

    /// Short machine-friendly tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GwbError::Transport(_) => "transport",
            GwbError::ConnectionTimeout | GwbError::RequestTimeout { .. } => "timeout",
            GwbError::ClosedBeforeComplete => "closed",
            GwbError::AuthFailed(_) => "auth",
            GwbError::Protocol { .. } => "protocol",
            GwbError::InvalidDuration(_) | GwbError::InvalidTarget(_) => "validation",
            GwbError::Codec(_) => "codec",
            GwbError::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for GwbError {
    fn from(e: serde_json::Error) -> Self {
        GwbError::Codec(e.to_string())
    }
}

pub type GwbResult<T> = Result<T, GwbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_render_contract_strings() {
        assert_eq!(GwbError::ConnectionTimeout.to_string(), "Connection timeout");
        assert_eq!(
            GwbError::ClosedBeforeComplete.to_string(),
            "Connection closed before completing"
        );
        let err = GwbError::Protocol {
            code: Some("INVALID_REQUEST".into()),
            message: "unknown method".into(),
        };
        assert_eq!(err.to_string(), "unknown method");
    }

    #[test]
    fn kind_tags() {
        assert_eq!(GwbError::ConnectionTimeout.kind(), "timeout");
        assert_eq!(GwbError::RequestTimeout { method: "m".into() }.kind(), "timeout");
        assert_eq!(GwbError::ClosedBeforeComplete.kind(), "closed");
        assert_eq!(GwbError::AuthFailed("no".into()).kind(), "auth");
        assert_eq!(GwbError::InvalidTarget("x".into()).kind(), "validation");
        let codec: GwbError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert_eq!(codec.kind(), "codec");
    }

    #[test]
    fn retryable_split() {
        assert!(GwbError::ConnectionTimeout.is_retryable());
        assert!(GwbError::Transport("refused".into()).is_retryable());
        assert!(!GwbError::AuthFailed("Authentication failed".into()).is_retryable());
        assert!(!GwbError::Protocol { code: None, message: "nope".into() }.is_retryable());
    }
}
