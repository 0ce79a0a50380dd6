//! Client-layer error taxonomy.
//!
//! Nothing here is fatal to the hosting process: every failure degrades to a
//! non-functional but non-crashing UI state. No automatic retries; retry
//! policy belongs to callers.

use sfl_protocol::{ProtocolError, RpcError};
use thiserror::Error;

/// Errors surfaced by adapters and the facade.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The bridge/channel peer is missing at call time.
    #[error("transport absent: {0}")]
    TransportAbsent(String),

    /// The `initialize` round-trip failed. The connection is left in a
    /// disconnected-equivalent state; callers may retry by reconnecting.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The channel closed (or was disconnected) while a call was in flight.
    #[error("channel closed")]
    ChannelClosed,

    /// The adapter was asked to operate before `connect()`.
    #[error("not connected")]
    NotConnected,

    /// The host answered a request with an error.
    #[error("tool call failed: {0}")]
    ToolCall(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<RpcError> for ClientError {
    fn from(err: RpcError) -> Self {
        Self::ToolCall(err.to_string())
    }
}
