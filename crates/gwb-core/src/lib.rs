//! gwb-core: shared logic for the gateway bridge.
//!
//! Provides the JSON wire frames and codec, the channel trait, envelope
//! sanitizing for chat text, `/config` and `/debug` command parsing, and
//! human duration parsing. Nothing in this crate performs I/O.

pub mod codec;
pub mod command;
pub mod duration;
pub mod error;
pub mod messages;
pub mod sanitize;
pub mod transport;

// Re-export commonly used items at crate root.
pub use codec::{encode_request, frame_decode, frame_encode};
pub use command::{parse_command, parse_config_command, parse_debug_command, CommandSpec, ParsedCommand};
pub use duration::{format_duration_ms, parse_duration_ms, DurationOptions, DurationUnit};
pub use error::{GwbError, GwbResult};
pub use messages::{build_session_key, GatewayFrame, ResponseFrame, PROTOCOL_VERSION};
pub use sanitize::{sanitize_message, sanitize_messages, sanitize_text};
pub use transport::GatewayTransport;
