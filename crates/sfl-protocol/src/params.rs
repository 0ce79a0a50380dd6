//! Typed parameter and result payloads for the channel protocol.
//!
//! The `tool-input` and `tool-result` notifications carry
//! [`sfl_core::ToolInput`] and [`sfl_core::ToolResult`] directly and need no
//! wrapper types here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sfl_core::{DisplayMode, HostCapabilities, HostContext, WidgetState};

/// Identity of the surface, declared during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub client_info: ClientInfo,

    /// Contract version this surface speaks.
    pub protocol_version: String,
}

/// Response body of the `initialize` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Contract version the host speaks.
    #[serde(default)]
    pub protocol_version: String,

    #[serde(default)]
    pub capabilities: HostCapabilities,

    #[serde(default)]
    pub host_context: HostContext,
}

/// Parameters of the `call-tool` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolParams {
    pub name: String,

    #[serde(default)]
    pub arguments: Value,
}

/// Parameters of the `request-display-mode` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDisplayModeParams {
    pub mode: DisplayMode,
}

/// Response body of the `request-display-mode` request: the mode the host
/// actually granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDisplayModeResult {
    pub mode: DisplayMode,
}

/// Parameters of the `update-model-context` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelContextParams {
    /// Model-visible content. Kept small and descriptive by convention.
    pub content: Value,
}

/// Parameters of the `request-modal` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestModalParams {
    /// Host-defined modal options, passed through opaquely.
    #[serde(default)]
    pub payload: Value,
}

/// Parameters of the `widget-state-changed` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetStateChangedParams {
    pub state: WidgetState,
}

/// Parameters of the `title-changed` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleChangedParams {
    pub title: String,
}

/// Parameters of the `follow-up` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpParams {
    pub prompt: String,
}
