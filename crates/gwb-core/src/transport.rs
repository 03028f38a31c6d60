//! Abstract gateway channel.
//!
//! The RPC client speaks to the gateway through this trait so that the
//! WebSocket implementation and in-memory test channels are interchangeable.

use crate::error::GwbResult;

/// A bidirectional, message-framed text channel to a gateway.
#[allow(async_fn_in_trait)]
pub trait GatewayTransport: Send {
    /// Send one text message.
    async fn send_text(&mut self, text: String) -> GwbResult<()>;

    /// Receive the next text message.
    ///
    /// `None` means the channel closed. Control frames (ping/pong, binary)
    /// are handled by the implementation and never surface here.
    async fn recv_text(&mut self) -> Option<GwbResult<String>>;

    /// Close the channel. Closing twice is a no-op.
    async fn close(&mut self) -> GwbResult<()>;
}
