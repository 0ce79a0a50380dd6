// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bridge-family adapter: single-shot snapshot, no handshake round-trip.
//!
//! The embedding page owns a mutable global object; this adapter is the
//! only code permitted to touch it. `connect()` reads whatever the object
//! already holds, marks ready immediately, and emits initial events
//! synchronously. Because the page can mutate the object again later, the
//! adapter also listens for redelivery and re-emits only the fields whose
//! serialized form actually changed.

use crate::adapter::HostAdapter;
use crate::bus::EventBus;
use crate::error::ClientError;
use crate::state::StateCell;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sfl_core::{
    AdapterCapabilities, DisplayMode, HostClientState, HostContext, HostEnvironment, ResultSource,
    ToolInput, ToolResult, UiEvent, WidgetState,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The readable surface of the global bridge object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSnapshot {
    /// The agent-supplied tool output, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,

    /// The agent's tool call input, when the page exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<ToolInput>,

    /// Widget state persisted by a previous incarnation of this surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_state: Option<WidgetState>,
}

/// The global bridge object, behind a trait so business logic never reads
/// it directly.
///
/// Whether the embedding page provided a `callTool` function is resolved
/// once, at construction, via [`has_call_tool`](Self::has_call_tool),
/// never probed ad hoc at call sites.
#[async_trait]
pub trait BridgeHandle: Send + Sync {
    /// Read the object's current readable surface.
    fn snapshot(&self) -> BridgeSnapshot;

    /// Whether the page provided a `callTool` function.
    fn has_call_tool(&self) -> bool;

    /// Forward a tool call to the page-provided function.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, String>;

    /// Mirror a widget-state replacement into the object.
    fn set_widget_state(&self, state: &WidgetState);

    /// Forward a display-mode request. `None` when the page provided no
    /// such function.
    fn request_display_mode(&self, mode: DisplayMode) -> Option<DisplayMode>;

    /// Subscribe to redelivery: the page signals an updated snapshot.
    fn updates(&self) -> broadcast::Receiver<BridgeSnapshot>;
}

/// Serialized forms of the last-seen snapshot fields, for redelivery
/// diffing.
#[derive(Default)]
struct LastSeen {
    tool_output: Option<String>,
    tool_input: Option<String>,
    widget_state: Option<String>,
}

struct BridgeInner {
    handle: Arc<dyn BridgeHandle>,
    can_call_tool: bool,
    bus: EventBus,
    state: StateCell,
    connected: AtomicBool,
    last_seen: Mutex<LastSeen>,
    listener: Mutex<Option<JoinHandle<()>>>,
    epoch: AtomicU64,
}

/// Adapter for hosts that expose a synchronously readable global object.
pub struct BridgeAdapter {
    inner: Arc<BridgeInner>,
}

impl Drop for BridgeAdapter {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.listener.lock().expect("listener lock poisoned").take() {
            handle.abort();
        }
    }
}

impl BridgeAdapter {
    #[must_use]
    pub fn new(handle: Arc<dyn BridgeHandle>) -> Self {
        let bus = EventBus::new();
        let state = StateCell::new(HostEnvironment::Bridge, bus.clone());
        let can_call_tool = handle.has_call_tool();
        Self {
            inner: Arc::new(BridgeInner {
                handle,
                can_call_tool,
                bus,
                state,
                connected: AtomicBool::new(false),
                last_seen: Mutex::new(LastSeen::default()),
                listener: Mutex::new(None),
                epoch: AtomicU64::new(0),
            }),
        }
    }
}

#[async_trait]
impl HostAdapter for BridgeAdapter {
    fn environment(&self) -> HostEnvironment {
        HostEnvironment::Bridge
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::none()
    }

    fn events(&self) -> &EventBus {
        &self.inner.bus
    }

    fn state(&self) -> HostClientState {
        self.inner.state.get()
    }

    /// Bridge-family hosts perform no handshake; there is never a context.
    fn host_context(&self) -> Option<HostContext> {
        None
    }

    async fn connect(&self) -> Result<(), ClientError> {
        let inner = &self.inner;
        if inner.connected.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let epoch = inner.epoch.load(Ordering::SeqCst);

        // Initial emission happens synchronously, before connect returns;
        // subscribers that register later are served by the replay buffer.
        let snapshot = inner.handle.snapshot();
        apply_snapshot(inner, &snapshot);
        inner.state.update(|s| s.is_ready = true);

        let mut rx = inner.handle.updates();
        let listener_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(snapshot) => {
                        if listener_inner.epoch.load(Ordering::SeqCst) != epoch {
                            return;
                        }
                        apply_snapshot(&listener_inner, &snapshot);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(target: "sfl_client", "bridge redelivery lagged, skipped {n}");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
        *inner.listener.lock().expect("listener lock poisoned") = Some(handle);
        Ok(())
    }

    async fn disconnect(&self) {
        let inner = &self.inner;
        inner.connected.store(false, Ordering::SeqCst);
        inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = inner.listener.lock().expect("listener lock poisoned").take() {
            handle.abort();
        }
        *inner.last_seen.lock().expect("last seen lock poisoned") = LastSeen::default();
        inner.bus.clear_buffered();
        inner.state.update(|s| {
            s.is_ready = false;
            s.widget_state = None;
        });
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ClientError> {
        let inner = &self.inner;
        if !inner.connected.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }
        if !inner.can_call_tool {
            return Err(ClientError::TransportAbsent(
                "bridge object exposes no callTool function".into(),
            ));
        }
        let value = inner
            .handle
            .call_tool(name, arguments)
            .await
            .map_err(ClientError::ToolCall)?;
        let mut result: ToolResult =
            serde_json::from_value(value).map_err(|e| ClientError::Protocol(e.into()))?;
        result.source = ResultSource::Ui;
        if result.tool_name.is_none() {
            result.tool_name = Some(name.to_string());
        }
        inner.bus.emit(UiEvent::ToolResult {
            result: result.clone(),
        });
        Ok(result)
    }

    fn set_widget_state(&self, state: WidgetState) {
        self.inner.state.replace_widget_state(state.clone());
        self.inner.handle.set_widget_state(&state);
        // Keep the diff baseline current so a redelivery of our own write
        // does not re-emit.
        if let Ok(serialized) = serde_json::to_string(&state) {
            self.inner
                .last_seen
                .lock()
                .expect("last seen lock poisoned")
                .widget_state = Some(serialized);
        }
    }

    async fn request_display_mode(&self, mode: DisplayMode) -> DisplayMode {
        self.inner.handle.request_display_mode(mode).unwrap_or(mode)
    }
}

/// Diff `snapshot` against the last-seen serialized forms and emit/update
/// only the fields that changed.
fn apply_snapshot(inner: &Arc<BridgeInner>, snapshot: &BridgeSnapshot) {
    if let Some(input) = &snapshot.tool_input {
        if field_changed(inner, |l| &mut l.tool_input, input) {
            inner.bus.emit(UiEvent::ToolInput {
                input: input.clone(),
            });
        }
    }
    if let Some(output) = &snapshot.tool_output {
        if field_changed(inner, |l| &mut l.tool_output, output) {
            inner.bus.emit(UiEvent::ToolResult {
                result: ToolResult {
                    structured_content: Some(output.clone()),
                    source: ResultSource::Agent,
                    ..ToolResult::default()
                },
            });
        }
    }
    if let Some(widget) = &snapshot.widget_state {
        if field_changed(inner, |l| &mut l.widget_state, widget) {
            inner.state.replace_widget_state(widget.clone());
        }
    }
}

/// Update the stored serialized form for one field; returns `true` when it
/// differs from the previous one.
fn field_changed<T: Serialize>(
    inner: &Arc<BridgeInner>,
    select: impl FnOnce(&mut LastSeen) -> &mut Option<String>,
    value: &T,
) -> bool {
    let serialized = match serde_json::to_string(value) {
        Ok(s) => s,
        Err(err) => {
            debug!(target: "sfl_client", "unserializable bridge field: {err}");
            return false;
        }
    };
    let mut last_seen = inner.last_seen.lock().expect("last seen lock poisoned");
    let slot = select(&mut last_seen);
    if slot.as_deref() == Some(serialized.as_str()) {
        return false;
    }
    *slot = Some(serialized);
    true
}
