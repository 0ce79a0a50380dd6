//! Null adapter: no remote peer, immediately ready, tool calls fail closed.
//!
//! Exists so application code can run and be tested outside any host.

use crate::adapter::HostAdapter;
use crate::bus::EventBus;
use crate::error::ClientError;
use crate::state::StateCell;
use async_trait::async_trait;
use serde_json::Value;
use sfl_core::{
    AdapterCapabilities, DisplayMode, HostClientState, HostContext, HostEnvironment, ResultSource,
    ToolResult, WidgetState,
};

/// Adapter for standalone execution.
pub struct NullAdapter {
    bus: EventBus,
    state: StateCell,
}

impl NullAdapter {
    #[must_use]
    pub fn new() -> Self {
        let bus = EventBus::new();
        let state = StateCell::new(HostEnvironment::Standalone, bus.clone());
        Self { bus, state }
    }
}

impl Default for NullAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostAdapter for NullAdapter {
    fn environment(&self) -> HostEnvironment {
        HostEnvironment::Standalone
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::none()
    }

    fn events(&self) -> &EventBus {
        &self.bus
    }

    fn state(&self) -> HostClientState {
        self.state.get()
    }

    fn host_context(&self) -> Option<HostContext> {
        None
    }

    /// Always succeeds, synchronously.
    async fn connect(&self) -> Result<(), ClientError> {
        self.state.update(|s| s.is_ready = true);
        Ok(())
    }

    async fn disconnect(&self) {
        self.state.update(|s| {
            s.is_ready = false;
            s.widget_state = None;
        });
    }

    /// Fails closed: an error-flagged result, never an `Err`.
    async fn call_tool(&self, name: &str, _arguments: Value) -> Result<ToolResult, ClientError> {
        let mut result =
            ToolResult::error_text(format!("no host attached: cannot call tool '{name}'"));
        result.source = ResultSource::Ui;
        result.tool_name = Some(name.to_string());
        Ok(result)
    }

    fn set_widget_state(&self, state: WidgetState) {
        // Local only; there is nowhere to mirror to.
        self.state.replace_widget_state(state);
    }

    async fn request_display_mode(&self, mode: DisplayMode) -> DisplayMode {
        mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfl_core::ContentBlock;

    #[tokio::test]
    async fn connect_is_immediately_ready() {
        let adapter = NullAdapter::new();
        assert!(!adapter.state().is_ready);
        adapter.connect().await.unwrap();
        assert!(adapter.state().is_ready);
        assert_eq!(adapter.environment(), HostEnvironment::Standalone);
    }

    #[tokio::test]
    async fn call_tool_fails_closed_without_throwing() {
        let adapter = NullAdapter::new();
        adapter.connect().await.unwrap();

        let result = adapter.call_tool("x", json!({})).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        match result.content.as_deref() {
            Some([ContentBlock::Text { text }]) => assert!(!text.is_empty()),
            other => panic!("expected one text block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn widget_state_stays_local() {
        let adapter = NullAdapter::new();
        adapter.connect().await.unwrap();
        adapter.set_widget_state(WidgetState::new(json!({"a": 1}), json!({"b": 2})));
        let state = adapter.state().widget_state.unwrap();
        assert_eq!(state.model_content, json!({"a": 1}));
        assert_eq!(state.private_content, json!({"b": 2}));
    }

    #[tokio::test]
    async fn gated_methods_are_inert_defaults() {
        let adapter = NullAdapter::new();
        adapter.connect().await.unwrap();
        assert_eq!(adapter.instance_id(), None);
        adapter.set_title("ignored").await;
        adapter.push_model_context(json!({"x": 1})).await;
        adapter.send_follow_up("ignored").await;
        adapter.request_modal(json!({})).await;
        // Still functional afterwards.
        assert!(adapter.state().is_ready);
    }
}
