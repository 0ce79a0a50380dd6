//! sfl-core
//!
//! The stable contract between an embedded UI surface and its host.
//!
//! If you only take one dependency, take this one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod capability;
pub mod event;

pub use capability::{AdapterCapabilities, HostCapabilities};
pub use event::{ToolInput, UiEvent, UiEventKind};

/// Current contract version embedded in the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "sfl/v0.1";

/// Kind of host the surface is running under.
///
/// Resolved exactly once at the boundary (see `sfl-client`'s detector);
/// everything downstream receives this enum and never re-detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEnvironment {
    /// A synchronously readable global bridge object.
    Bridge,

    /// A parent context reached through an asynchronous messaging handshake.
    Channel,

    /// A channel-family host refined to a known richer vendor after the
    /// handshake. Never produced by detection; only by facade refinement.
    VendorChannel,

    /// No host at all. Tool calls fail closed.
    Standalone,
}

/// How the host is currently presenting the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Inline card inside the conversation transcript.
    Inline,

    /// Side panel next to the conversation.
    Panel,

    /// Fullscreen takeover.
    Fullscreen,
}

/// Why the surface was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOrigin {
    /// Opened by an autonomous agent tool call.
    Tool,

    /// Opened by a direct user action.
    User,

    /// Re-opened while restoring a prior session.
    Restore,
}

/// Host-reported color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

/// A font the host asks the surface to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFace {
    pub family: String,

    /// Where the font can be loaded from.
    pub source: String,

    /// CSS-style weight, when the host cares (`"400"`, `"bold"`, …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// Provenance metadata for how the surface came to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenContext {
    /// Absent means the host did not say; treated like [`TriggerOrigin::Tool`]
    /// by the ready-state gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<TriggerOrigin>,
}

/// Read-once-per-connection snapshot returned by the channel handshake.
///
/// Owned by the adapter that received it; exposed read-only to the facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    /// Style variable name → value pairs (deterministic ordering).
    #[serde(default)]
    pub style_variables: BTreeMap<String, String>,

    #[serde(default)]
    pub fonts: Vec<FontFace>,

    /// Identifies the concrete host product. Channel-family vendors are
    /// recognized from this string during facade refinement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Widget state persisted by a previous incarnation of this surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_state: Option<WidgetState>,

    #[serde(default)]
    pub open_context: OpenContext,
}

impl HostContext {
    /// Trigger provenance, defaulting to `None` when the host omitted it.
    #[must_use]
    pub fn triggered_by(&self) -> Option<TriggerOrigin> {
        self.open_context.triggered_by
    }
}

/// The opaque, two-part persisted blob restored across session reloads.
///
/// `model_content` is visible to the orchestrating agent and must stay small
/// and descriptive; `private_content` is UI-only and never surfaced to the
/// agent. Writing a new value always replaces both parts atomically; partial
/// merges are the caller's responsibility before calling the setter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetState {
    pub model_content: serde_json::Value,

    pub private_content: serde_json::Value,
}

impl WidgetState {
    /// Build a state blob from both parts.
    #[must_use]
    pub fn new(model_content: serde_json::Value, private_content: serde_json::Value) -> Self {
        Self {
            model_content,
            private_content,
        }
    }
}

/// Client-observable connection state.
///
/// Mutated only by the active adapter through its single state setter, which
/// also notifies state-change listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostClientState {
    pub is_ready: bool,

    pub environment: HostEnvironment,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_state: Option<WidgetState>,
}

impl HostClientState {
    /// Initial state for a freshly constructed adapter.
    #[must_use]
    pub fn initial(environment: HostEnvironment) -> Self {
        Self {
            is_ready: false,
            environment,
            widget_state: None,
        }
    }
}

/// Who produced a [`ToolResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Pushed by the host because the agent invoked the tool autonomously.
    #[default]
    Agent,

    /// Produced by a `call_tool` issued from this surface.
    Ui,
}

/// A block of agent-facing content inside a [`ToolResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    /// Convenience constructor for a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Outcome of a tool invocation, whether triggered by the UI or the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// Agent-facing text blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,

    /// UI-facing structured payload. When it carries an `instanceId` the
    /// adapter captures it for later routing/display-mode calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,

    #[serde(default)]
    pub source: ResultSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ToolResult {
    /// Build an error-flagged result with a single text block.
    #[must_use]
    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: Some(vec![ContentBlock::text(text)]),
            is_error: Some(true),
            ..Self::default()
        }
    }

    /// Returns `true` when the host flagged the invocation as failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// The `instanceId` routing key inside `structured_content`, if present.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.structured_content
            .as_ref()
            .and_then(|v| v.get("instanceId"))
            .and_then(|v| v.as_str())
    }

    /// Deserialize `structured_content` into a concrete type.
    pub fn structured_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let value = self
            .structured_content
            .clone()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value)
    }
}
