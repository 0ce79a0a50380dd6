// SPDX-License-Identifier: MIT OR Apache-2.0
//! The unified client facade.
//!
//! Application code holds exactly one [`SurfaceClient`] and never branches
//! on the adapter behind it. Capability-gated methods degrade to inert
//! no-ops on adapters that lack the capability.

use crate::adapter::{
    refine_from_user_agent, BridgeAdapter, ChannelAdapter, HostAdapter, NullAdapter,
};
use crate::bus::Subscription;
use crate::config::ClientConfig;
use crate::detect::{detect_environment, HostDiscovery};
use crate::error::ClientError;
use serde_json::Value;
use sfl_core::{
    AdapterCapabilities, DisplayMode, HostClientState, HostContext, HostEnvironment, ToolResult,
    UiEvent, UiEventKind, WidgetState,
};
use std::sync::Arc;
use tracing::debug;

/// The single object application code holds.
pub struct SurfaceClient {
    adapter: Arc<dyn HostAdapter>,
    config: ClientConfig,
}

impl SurfaceClient {
    /// Detect the environment, construct the matching adapter, connect,
    /// and, for channel hosts whose handshake user agent identifies a
    /// richer vendor, transparently reconnect with the vendor profile.
    ///
    /// Blocks until that refinement settles: the returned client is fully
    /// resolved and connected.
    pub async fn create(
        discovery: HostDiscovery,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let environment = detect_environment(&discovery);
        debug!(target: "sfl_client", ?environment, "creating surface client");

        let adapter: Arc<dyn HostAdapter> = match environment {
            HostEnvironment::Bridge => {
                let handle = discovery.bridge.clone().ok_or_else(|| {
                    ClientError::TransportAbsent("bridge object vanished after detection".into())
                })?;
                Arc::new(BridgeAdapter::new(handle))
            }
            HostEnvironment::Channel | HostEnvironment::VendorChannel => {
                let transport = discovery.parent_channel.clone().ok_or_else(|| {
                    ClientError::TransportAbsent("parent channel vanished after detection".into())
                })?;
                Arc::new(ChannelAdapter::generic(transport, config.clone()))
            }
            HostEnvironment::Standalone => Arc::new(NullAdapter::new()),
        };
        adapter.connect().await?;

        let adapter = if environment == HostEnvironment::Channel {
            refine_vendor(&discovery, adapter, &config).await?
        } else {
            adapter
        };

        Ok(Self { adapter, config })
    }

    /// The settings this client was created with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the current client state.
    #[must_use]
    pub fn state(&self) -> HostClientState {
        self.adapter.state()
    }

    /// The resolved environment, including vendor refinement.
    #[must_use]
    pub fn environment(&self) -> HostEnvironment {
        self.adapter.environment()
    }

    /// The active adapter's capability table.
    #[must_use]
    pub fn capabilities(&self) -> AdapterCapabilities {
        self.adapter.capabilities()
    }

    /// The handshake context, on adapters that receive one.
    #[must_use]
    pub fn host_context(&self) -> Option<HostContext> {
        self.adapter.host_context()
    }

    /// Reconnect after a [`disconnect`](Self::disconnect).
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.adapter.connect().await
    }

    /// Tear the connection down. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        self.adapter.disconnect().await;
    }

    /// Invoke a named host-mediated tool.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ClientError> {
        self.adapter.call_tool(name, arguments).await
    }

    /// Subscribe to events of `kind`. A buffered instance, if pending, is
    /// delivered to this handler immediately.
    pub fn on(
        &self,
        kind: UiEventKind,
        handler: impl Fn(&UiEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.adapter.events().on(kind, handler)
    }

    /// Subscribe to `(next, previous)` state pairs.
    pub fn subscribe_state(
        &self,
        listener: impl Fn(&HostClientState, &HostClientState) + Send + Sync + 'static,
    ) -> Subscription {
        self.adapter.events().subscribe_state(listener)
    }

    /// Replace the widget-state blob. Whole-blob, last-write-wins.
    pub fn set_widget_state(&self, state: WidgetState) {
        self.adapter.set_widget_state(state);
    }

    /// Convenience accessor for the current widget state.
    #[must_use]
    pub fn widget_state(&self) -> Option<WidgetState> {
        self.adapter.state().widget_state
    }

    /// Ask for a different presentation mode; degrades to the requested
    /// mode when the host declines or cannot.
    pub async fn request_display_mode(&self, mode: DisplayMode) -> DisplayMode {
        self.adapter.request_display_mode(mode).await
    }

    /// Fire-and-forget passthrough notification; dropped where no
    /// notification channel exists.
    pub fn notify_host(&self, payload: Value) {
        self.adapter.notify_host(payload);
    }

    // ── Capability-gated surface ─────────────────────────────────────────

    /// Routing key of the most recent tool result, where tracked.
    #[must_use]
    pub fn instance_id(&self) -> Option<String> {
        self.adapter.instance_id()
    }

    /// Whether the active adapter tracks surface instances.
    #[must_use]
    pub fn supports_multi_instance(&self) -> bool {
        self.adapter.capabilities().multi_instance
    }

    /// Retitle this surface, where supported.
    pub async fn set_title(&self, title: &str) {
        self.adapter.set_title(title).await;
    }

    /// Push model-visible context, where supported.
    pub async fn push_model_context(&self, content: Value) {
        self.adapter.push_model_context(content).await;
    }

    /// Ask the agent a follow-up prompt, where supported.
    pub async fn send_follow_up(&self, prompt: &str) {
        self.adapter.send_follow_up(prompt).await;
    }

    /// Ask the host to open a modal, where supported.
    pub async fn request_modal(&self, payload: Value) {
        self.adapter.request_modal(payload).await;
    }
}

/// Swap a freshly-connected generic channel adapter for a vendor-refined
/// one when the handshake user agent names a known richer vendor.
///
/// Buffered-but-unreplayed events are carried across the swap: they are
/// seeded into the new adapter's buffer *before* its handshake so a fresh
/// push during reconnection supersedes the carried value, never the other
/// way round.
async fn refine_vendor(
    discovery: &HostDiscovery,
    adapter: Arc<dyn HostAdapter>,
    config: &ClientConfig,
) -> Result<Arc<dyn HostAdapter>, ClientError> {
    let Some(ctx) = adapter.host_context() else {
        return Ok(adapter);
    };
    let Some(user_agent) = ctx.user_agent.as_deref() else {
        return Ok(adapter);
    };
    let Some(profile) = refine_from_user_agent(user_agent) else {
        return Ok(adapter);
    };
    debug!(
        target: "sfl_client",
        vendor = profile.name,
        "user agent names a richer vendor, reconnecting"
    );

    let carried = adapter.events().drain_buffered();
    adapter.disconnect().await;

    let transport = discovery.parent_channel.clone().ok_or_else(|| {
        ClientError::TransportAbsent("parent channel vanished during refinement".into())
    })?;
    let vendor = ChannelAdapter::new(transport, profile, config.clone());
    for event in carried {
        vendor.events().emit(event);
    }
    vendor.connect().await?;
    Ok(Arc::new(vendor))
}
