//! Events the adapter layer delivers to application code.

use crate::{HostContext, ToolResult};
use serde::{Deserialize, Serialize};

/// The agent's input to a tool call, pushed by the host before (or instead
/// of) a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Discriminant for [`UiEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiEventKind {
    ToolInput,
    ToolResult,
    HostContextChanged,
    Teardown,
}

impl UiEventKind {
    /// Whether an event of this kind is retained (latest instance only) when
    /// it arrives with zero subscribers.
    #[must_use]
    pub fn is_buffered(self) -> bool {
        matches!(self, Self::ToolInput | Self::ToolResult)
    }
}

/// An event delivered through the client's subscription interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UiEvent {
    ToolInput { input: ToolInput },
    ToolResult { result: ToolResult },
    HostContextChanged { context: HostContext },
    Teardown,
}

impl UiEvent {
    /// The subscription key this event is delivered under.
    #[must_use]
    pub fn kind(&self) -> UiEventKind {
        match self {
            Self::ToolInput { .. } => UiEventKind::ToolInput,
            Self::ToolResult { .. } => UiEventKind::ToolResult,
            Self::HostContextChanged { .. } => UiEventKind::HostContextChanged,
            Self::Teardown => UiEventKind::Teardown,
        }
    }
}
