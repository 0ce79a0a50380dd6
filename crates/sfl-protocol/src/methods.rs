// SPDX-License-Identifier: MIT OR Apache-2.0
//! Method-name registry for the channel protocol.

use std::fmt;

/// Every method name either side may put on the wire.
///
/// Requests expect a matched response; notifications do not. Direction and
/// kind are documented per variant; the envelope itself does not encode
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Request, surface → host. Opens the connection.
    Initialize,
    /// Request, surface → host. Invoke a named tool.
    CallTool,
    /// Request, surface → host. Ask for a different presentation mode.
    RequestDisplayMode,
    /// Request, surface → host. Push model-visible context.
    UpdateModelContext,
    /// Request, surface → host. Ask the host to open a modal.
    RequestModal,
    /// Notification, surface → host. Widget state blob replaced.
    WidgetStateChanged,
    /// Notification, surface → host. Surface retitled itself.
    TitleChanged,
    /// Notification, surface → host. Ask the agent a follow-up prompt.
    FollowUp,
    /// Notification, surface → host. Generic passthrough payload.
    Notify,
    /// Notification, host → surface. Agent-side tool call input.
    ToolInput,
    /// Notification, host → surface. Tool result, agent- or UI-triggered.
    ToolResult,
    /// Notification, host → surface. Theme/style/context update.
    HostContextChanged,
    /// Notification, host → surface. The host is about to tear the surface down.
    Teardown,
}

impl Method {
    /// The wire name of this method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::CallTool => "call-tool",
            Self::RequestDisplayMode => "request-display-mode",
            Self::UpdateModelContext => "update-model-context",
            Self::RequestModal => "request-modal",
            Self::WidgetStateChanged => "widget-state-changed",
            Self::TitleChanged => "title-changed",
            Self::FollowUp => "follow-up",
            Self::Notify => "notify",
            Self::ToolInput => "tool-input",
            Self::ToolResult => "tool-result",
            Self::HostContextChanged => "host-context-changed",
            Self::Teardown => "teardown",
        }
    }

    /// Parse a wire name. Unknown names return `None`; the dispatch layer
    /// ignores them rather than erroring.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "initialize" => Self::Initialize,
            "call-tool" => Self::CallTool,
            "request-display-mode" => Self::RequestDisplayMode,
            "update-model-context" => Self::UpdateModelContext,
            "request-modal" => Self::RequestModal,
            "widget-state-changed" => Self::WidgetStateChanged,
            "title-changed" => Self::TitleChanged,
            "follow-up" => Self::FollowUp,
            "notify" => Self::Notify,
            "tool-input" => Self::ToolInput,
            "tool-result" => Self::ToolResult,
            "host-context-changed" => Self::HostContextChanged,
            "teardown" => Self::Teardown,
            _ => return None,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
