//! The three host adapters behind one trait.
//!
//! An adapter is the only code permitted to touch its transport or bridge
//! object. Capability differences are declared once, at construction, in an
//! [`AdapterCapabilities`] table, never probed ad hoc at call sites.

use crate::bus::EventBus;
use crate::error::ClientError;
use async_trait::async_trait;
use serde_json::Value;
use sfl_core::{
    AdapterCapabilities, DisplayMode, HostClientState, HostContext, HostEnvironment, ToolResult,
    WidgetState,
};

mod bridge;
mod channel;
mod null;
mod profile;

pub use bridge::{BridgeAdapter, BridgeHandle, BridgeSnapshot};
pub use channel::ChannelAdapter;
pub use null::NullAdapter;
pub use profile::{refine_from_user_agent, ChannelProfile};

/// One consistent contract over bridge-family, channel-family, and absent
/// hosts.
///
/// The capability-gated methods (`instance_id`, `set_title`,
/// `push_model_context`, `send_follow_up`, `request_modal`) default to safe
/// inert no-ops; adapters opt in by overriding. Callers never need to
/// branch on adapter type to stay safe.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    /// The environment this adapter serves. Fixed at construction.
    fn environment(&self) -> HostEnvironment;

    /// What this adapter actually implements. Fixed at construction.
    fn capabilities(&self) -> AdapterCapabilities;

    /// The bus carrying `tool-input` / `tool-result` / context events.
    fn events(&self) -> &EventBus;

    /// Snapshot of the current client state.
    fn state(&self) -> HostClientState;

    /// The handshake context, for adapters that receive one.
    fn host_context(&self) -> Option<HostContext>;

    /// Establish the connection. Adapter-specific: a handshake round-trip,
    /// a synchronous snapshot read, or nothing at all.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Tear the connection down. Must be safe when never connected, and a
    /// later `connect()` must return the adapter to an equivalent initial
    /// state.
    async fn disconnect(&self);

    /// Invoke a named host-mediated tool and await its matched result.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ClientError>;

    /// Replace the widget-state blob (whole-blob, last-write-wins) and
    /// mirror it into the adapter's persistence call.
    fn set_widget_state(&self, state: WidgetState);

    /// Ask the host for a different presentation mode. Non-fatal degrade:
    /// on failure or missing host support the requested mode comes back
    /// unchanged.
    async fn request_display_mode(&self, mode: DisplayMode) -> DisplayMode;

    /// Fire-and-forget passthrough notification to the host. Dropped on
    /// adapters without a notification channel.
    fn notify_host(&self, _payload: Value) {}

    /// Routing key of the most recent tool result, on adapters that track
    /// instances.
    fn instance_id(&self) -> Option<String> {
        None
    }

    /// Ask the host to retitle this surface.
    async fn set_title(&self, _title: &str) {}

    /// Push model-visible context to the host.
    async fn push_model_context(&self, _content: Value) {}

    /// Ask the host to send a follow-up prompt to the agent.
    async fn send_follow_up(&self, _prompt: &str) {}

    /// Ask the host to open a modal.
    async fn request_modal(&self, _payload: Value) {}
}
