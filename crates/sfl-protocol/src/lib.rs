//! sfl-protocol
//!
//! Wire format for talking to channel-family hosts.
//! Current transport: discrete JSON values over a bidirectional channel.
//!
//! The protocol is intentionally simple:
//! - the surface opens with an `initialize` request
//! - the host answers with protocol version, capabilities, and context
//! - either side sends fire-and-forget notifications
//! - requests are matched to responses by `id`, never by arrival order

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod methods;
pub mod params;
pub mod version;

pub use methods::Method;
pub use params::{
    CallToolParams, ClientInfo, FollowUpParams, InitializeParams, InitializeResult,
    RequestDisplayModeParams, RequestDisplayModeResult, RequestModalParams, TitleChangedParams,
    UpdateModelContextParams, WidgetStateChangedParams,
};

/// A request the peer is expected to answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// A fire-and-forget notification. Distinguished from a request by the
/// absence of an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcNotification {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Error payload of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Build an error payload without attached data.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Standard "method not found" error.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("method not found: {method}"))
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.message)
    }
}

/// Success or failure body of a response. Exactly one of `result`/`error`
/// appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcOutcome {
    Ok { result: Value },
    Err { error: RpcError },
}

impl RpcOutcome {
    /// Convert into a `Result`, consuming the outcome.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            Self::Ok { result } => Ok(result),
            Self::Err { error } => Err(error),
        }
    }
}

/// A response matched to a request by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: String,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

/// Any message that can cross the channel.
///
/// Deserialization classifies by shape: `id` + `method` is a request,
/// `id` without `method` is a response, `method` alone is a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcMessage {
    Request(RpcRequest),
    Response(RpcResponse),
    Notification(RpcNotification),
}

impl RpcMessage {
    /// Build a request envelope.
    #[must_use]
    pub fn request(id: impl Into<String>, method: Method, params: Value) -> Self {
        Self::Request(RpcRequest {
            id: id.into(),
            method: method.as_str().to_string(),
            params,
        })
    }

    /// Build a notification envelope.
    #[must_use]
    pub fn notification(method: Method, params: Value) -> Self {
        Self::Notification(RpcNotification {
            method: method.as_str().to_string(),
            params,
        })
    }

    /// Build a success response for `id`.
    #[must_use]
    pub fn response_ok(id: impl Into<String>, result: Value) -> Self {
        Self::Response(RpcResponse {
            id: id.into(),
            outcome: RpcOutcome::Ok { result },
        })
    }

    /// Build a failure response for `id`.
    #[must_use]
    pub fn response_err(id: impl Into<String>, error: RpcError) -> Self {
        Self::Response(RpcResponse {
            id: id.into(),
            outcome: RpcOutcome::Err { error },
        })
    }

    /// The method name, when this is a request or notification.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }

    /// The request/response id, when one is present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.id),
            Self::Response(r) => Some(&r.id),
            Self::Notification(_) => None,
        }
    }
}

/// Errors arising from JSON encoding/decoding or protocol-level violations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol violation: {0}")]
    Violation(String),
}

/// Stateless codec for encoding/decoding [`RpcMessage`] values.
pub struct JsonCodec;

impl JsonCodec {
    /// Serialize an [`RpcMessage`] to a JSON string.
    pub fn encode(msg: &RpcMessage) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(msg)?)
    }

    /// Deserialize a JSON string into an [`RpcMessage`].
    pub fn decode(raw: &str) -> Result<RpcMessage, ProtocolError> {
        Ok(serde_json::from_str::<RpcMessage>(raw)?)
    }

    /// Classify an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<RpcMessage, ProtocolError> {
        Ok(serde_json::from_value::<RpcMessage>(value)?)
    }
}
