//! Mock host implementations used for local testing.
//!
//! [`MockHost`] speaks the channel protocol over an in-memory transport:
//! it answers `initialize` with a scriptable [`HostContext`], serves
//! `call-tool` from per-tool scripts (optionally delayed, to exercise
//! out-of-order completion), and records every notification the client
//! sends. [`MockBridge`] is a mutable bridge object with an explicit
//! redelivery trigger.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use sfl_client::{memory_channel, BridgeHandle, BridgeSnapshot, MemoryHostEnd, MemoryTransport};
use sfl_core::{
    DisplayMode, HostCapabilities, HostContext, OpenContext, ToolInput, ToolResult, TriggerOrigin,
    WidgetState,
};
use sfl_protocol::{
    CallToolParams, InitializeResult, Method, RequestDisplayModeParams, RpcError, RpcMessage,
    RpcNotification, RpcRequest,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

// ---------------------------------------------------------------------------
// MockHost
// ---------------------------------------------------------------------------

/// How the mock answers a single tool.
#[derive(Debug, Clone)]
struct ToolScript {
    /// Raw `call-tool` result payload, serialized [`ToolResult`] shape.
    result: Value,
    /// Respond only after this long; lets tests force out-of-order
    /// completion of concurrent calls.
    delay: Option<Duration>,
}

/// How the mock answers `request-display-mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayModeBehavior {
    /// Grant whatever the surface asked for.
    Grant,
    /// Answer with an error.
    Deny,
    /// Always answer with this mode, whatever was asked.
    Pin(DisplayMode),
}

struct HostShared {
    context: Mutex<HostContext>,
    capabilities: Mutex<HostCapabilities>,
    protocol_version: Mutex<String>,
    tools: Mutex<HashMap<String, ToolScript>>,
    display_mode: Mutex<DisplayModeBehavior>,
    received: Mutex<Vec<RpcNotification>>,
    /// Consumed by the first `initialize`: pushed to the client *before*
    /// the handshake response, so the push lands deterministically ahead of
    /// the response in the client's dispatch order.
    early_push: Mutex<Option<RpcMessage>>,
}

/// Builder for a [`MockHost`].
pub struct MockHostBuilder {
    context: HostContext,
    capabilities: HostCapabilities,
    protocol_version: String,
    tools: HashMap<String, ToolScript>,
    display_mode: DisplayModeBehavior,
    early_push: Option<RpcMessage>,
}

impl Default for MockHostBuilder {
    fn default() -> Self {
        Self {
            context: HostContext::default(),
            capabilities: HostCapabilities::default(),
            protocol_version: sfl_core::PROTOCOL_VERSION.to_string(),
            tools: HashMap::new(),
            display_mode: DisplayModeBehavior::Grant,
            early_push: None,
        }
    }
}

impl MockHostBuilder {
    /// Set the trigger provenance reported in the handshake.
    #[must_use]
    pub fn triggered_by(mut self, origin: TriggerOrigin) -> Self {
        self.context.open_context = OpenContext {
            triggered_by: Some(origin),
        };
        self
    }

    /// Set the user-agent string reported in the handshake.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.context.user_agent = Some(ua.into());
        self
    }

    /// Set the widget state restored by the handshake.
    #[must_use]
    pub fn widget_state(mut self, state: WidgetState) -> Self {
        self.context.widget_state = Some(state);
        self
    }

    /// Replace the whole handshake context.
    #[must_use]
    pub fn context(mut self, context: HostContext) -> Self {
        self.context = context;
        self
    }

    /// Set the capability flags reported in the handshake.
    #[must_use]
    pub fn capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the protocol version reported in the handshake.
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Script a tool response (raw `call-tool` result payload).
    #[must_use]
    pub fn tool(mut self, name: impl Into<String>, result: Value) -> Self {
        self.tools.insert(
            name.into(),
            ToolScript {
                result,
                delay: None,
            },
        );
        self
    }

    /// Script a tool response that arrives only after `delay`.
    #[must_use]
    pub fn slow_tool(mut self, name: impl Into<String>, result: Value, delay: Duration) -> Self {
        self.tools.insert(
            name.into(),
            ToolScript {
                result,
                delay: Some(delay),
            },
        );
        self
    }

    /// Set the `request-display-mode` behavior.
    #[must_use]
    pub fn display_mode(mut self, behavior: DisplayModeBehavior) -> Self {
        self.display_mode = behavior;
        self
    }

    /// Push a `tool-result` to the client ahead of the first `initialize`
    /// response. Exercises the delivery-before-subscription race and the
    /// buffer carry across vendor refinement deterministically.
    #[must_use]
    pub fn result_before_first_initialize(mut self, result: &ToolResult) -> Self {
        let params = serde_json::to_value(result).expect("tool result serializes");
        self.early_push = Some(RpcMessage::notification(Method::ToolResult, params));
        self
    }

    /// Spawn the responder task and hand back the running host.
    #[must_use]
    pub fn spawn(self) -> MockHost {
        let (transport, end) = memory_channel();
        let shared = Arc::new(HostShared {
            context: Mutex::new(self.context),
            capabilities: Mutex::new(self.capabilities),
            protocol_version: Mutex::new(self.protocol_version),
            tools: Mutex::new(self.tools),
            display_mode: Mutex::new(self.display_mode),
            received: Mutex::new(Vec::new()),
            early_push: Mutex::new(self.early_push),
        });
        // Subscribe before returning: a client may send `initialize` before
        // the responder task gets its first poll.
        let rx = end.subscribe();
        let task = tokio::spawn(respond_loop(end.clone(), rx, Arc::clone(&shared)));
        MockHost {
            transport: Arc::new(transport),
            end,
            shared,
            task,
        }
    }
}

/// A running mock channel host.
pub struct MockHost {
    transport: Arc<MemoryTransport>,
    end: MemoryHostEnd,
    shared: Arc<HostShared>,
    task: JoinHandle<()>,
}

impl MockHost {
    /// Start building a mock host.
    #[must_use]
    pub fn builder() -> MockHostBuilder {
        MockHostBuilder::default()
    }

    /// The client side of the transport, for handing to an adapter.
    #[must_use]
    pub fn transport(&self) -> Arc<MemoryTransport> {
        Arc::clone(&self.transport)
    }

    /// Push a `tool-result` notification to the surface.
    pub fn push_tool_result(&self, result: &ToolResult) -> Result<()> {
        let params = serde_json::to_value(result)?;
        self.end
            .send(RpcMessage::notification(Method::ToolResult, params));
        Ok(())
    }

    /// Push a `tool-input` notification to the surface.
    pub fn push_tool_input(&self, input: &ToolInput) -> Result<()> {
        let params = serde_json::to_value(input)?;
        self.end
            .send(RpcMessage::notification(Method::ToolInput, params));
        Ok(())
    }

    /// Push a `host-context-changed` notification to the surface.
    pub fn push_host_context(&self, context: &HostContext) -> Result<()> {
        let params = serde_json::to_value(context)?;
        self.end
            .send(RpcMessage::notification(Method::HostContextChanged, params));
        Ok(())
    }

    /// Push a `teardown` notification to the surface.
    pub fn push_teardown(&self) {
        self.end
            .send(RpcMessage::notification(Method::Teardown, Value::Null));
    }

    /// Push a raw notification; for unknown-method tolerance tests.
    pub fn push_raw(&self, method: &str, params: Value) {
        self.end.send(RpcMessage::Notification(RpcNotification {
            method: method.to_string(),
            params,
        }));
    }

    /// Mutate the context served to the *next* `initialize`.
    pub fn update_context(&self, mutate: impl FnOnce(&mut HostContext)) {
        mutate(&mut self.shared.context.lock().expect("context lock poisoned"));
    }

    /// Every notification received from the client so far.
    #[must_use]
    pub fn received_notifications(&self) -> Vec<RpcNotification> {
        self.shared
            .received
            .lock()
            .expect("received lock poisoned")
            .clone()
    }

    /// Poll until a notification with `method` arrives (or ~2s elapse).
    pub async fn expect_notification(&self, method: Method) -> Result<RpcNotification> {
        for _ in 0..200 {
            let found = self
                .received_notifications()
                .into_iter()
                .find(|n| n.method == method.as_str());
            if let Some(note) = found {
                return Ok(note);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::bail!("no '{method}' notification within the polling window");
    }

    /// Stop answering. The transport stays alive so error paths can be
    /// exercised against a silent host.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for MockHost {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond_loop(
    end: MemoryHostEnd,
    mut rx: broadcast::Receiver<RpcMessage>,
    shared: Arc<HostShared>,
) {
    loop {
        match rx.recv().await {
            Ok(RpcMessage::Request(req)) => handle_request(&end, &shared, req),
            Ok(RpcMessage::Notification(note)) => {
                debug!(target: "sfl_host_mock", method = %note.method, "recording notification");
                shared
                    .received
                    .lock()
                    .expect("received lock poisoned")
                    .push(note);
            }
            Ok(RpcMessage::Response(_)) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn handle_request(end: &MemoryHostEnd, shared: &Arc<HostShared>, req: RpcRequest) {
    let RpcRequest { id, method, params } = req;
    match Method::parse(&method) {
        Some(Method::Initialize) => {
            if let Some(push) = shared.early_push.lock().expect("push lock poisoned").take() {
                end.send(push);
            }
            let result = InitializeResult {
                protocol_version: shared
                    .protocol_version
                    .lock()
                    .expect("version lock poisoned")
                    .clone(),
                capabilities: *shared.capabilities.lock().expect("caps lock poisoned"),
                host_context: shared.context.lock().expect("context lock poisoned").clone(),
            };
            match serde_json::to_value(result) {
                Ok(value) => end.send(RpcMessage::response_ok(id, value)),
                Err(err) => end.send(RpcMessage::response_err(
                    id,
                    RpcError::new(-32603, err.to_string()),
                )),
            }
        }
        Some(Method::CallTool) => {
            let Ok(params) = serde_json::from_value::<CallToolParams>(params) else {
                end.send(RpcMessage::response_err(
                    id,
                    RpcError::new(-32602, "malformed call-tool params"),
                ));
                return;
            };
            let script = shared
                .tools
                .lock()
                .expect("tools lock poisoned")
                .get(&params.name)
                .cloned();
            match script {
                Some(script) => {
                    let end = end.clone();
                    tokio::spawn(async move {
                        if let Some(delay) = script.delay {
                            tokio::time::sleep(delay).await;
                        }
                        end.send(RpcMessage::response_ok(id, script.result));
                    });
                }
                None => end.send(RpcMessage::response_err(
                    id,
                    RpcError::new(-32602, format!("unknown tool: {}", params.name)),
                )),
            }
        }
        Some(Method::RequestDisplayMode) => {
            let behavior = *shared.display_mode.lock().expect("display lock poisoned");
            match behavior {
                DisplayModeBehavior::Grant => {
                    let mode = serde_json::from_value::<RequestDisplayModeParams>(params)
                        .map(|p| p.mode)
                        .unwrap_or(DisplayMode::Inline);
                    end.send(RpcMessage::response_ok(id, json!({ "mode": mode })));
                }
                DisplayModeBehavior::Deny => end.send(RpcMessage::response_err(
                    id,
                    RpcError::new(-32000, "display mode locked"),
                )),
                DisplayModeBehavior::Pin(mode) => {
                    end.send(RpcMessage::response_ok(id, json!({ "mode": mode })));
                }
            }
        }
        Some(Method::UpdateModelContext) | Some(Method::RequestModal) => {
            shared
                .received
                .lock()
                .expect("received lock poisoned")
                .push(RpcNotification { method, params });
            end.send(RpcMessage::response_ok(id, Value::Null));
        }
        _ => end.send(RpcMessage::response_err(id, RpcError::method_not_found(&method))),
    }
}

// ---------------------------------------------------------------------------
// MockBridge
// ---------------------------------------------------------------------------

/// A mutable bridge object with an explicit redelivery trigger.
pub struct MockBridge {
    snapshot: Mutex<BridgeSnapshot>,
    updates: broadcast::Sender<BridgeSnapshot>,
    call_tool_enabled: bool,
    tools: Mutex<HashMap<String, Value>>,
    mirrored: Mutex<Vec<WidgetState>>,
    grant_display_mode: bool,
}

impl MockBridge {
    /// A bridge whose object starts with the given snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: BridgeSnapshot) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            snapshot: Mutex::new(snapshot),
            updates,
            call_tool_enabled: true,
            tools: Mutex::new(HashMap::new()),
            mirrored: Mutex::new(Vec::new()),
            grant_display_mode: true,
        }
    }

    /// An empty bridge object.
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshot(BridgeSnapshot::default())
    }

    /// A bridge whose embedding page provided no `callTool` function.
    #[must_use]
    pub fn without_call_tool(snapshot: BridgeSnapshot) -> Self {
        Self {
            call_tool_enabled: false,
            ..Self::with_snapshot(snapshot)
        }
    }

    /// Script a tool response (raw result payload, [`ToolResult`] shape).
    pub fn tool(&self, name: impl Into<String>, result: Value) {
        self.tools
            .lock()
            .expect("tools lock poisoned")
            .insert(name.into(), result);
    }

    /// Mutate the object and signal redelivery, as the embedding page does.
    pub fn update_snapshot(&self, mutate: impl FnOnce(&mut BridgeSnapshot)) {
        let next = {
            let mut snapshot = self.snapshot.lock().expect("snapshot lock poisoned");
            mutate(&mut snapshot);
            snapshot.clone()
        };
        let _ = self.updates.send(next);
    }

    /// Signal redelivery without changing anything; the adapter's diff
    /// must suppress re-emission.
    pub fn redeliver(&self) {
        let snapshot = self.snapshot.lock().expect("snapshot lock poisoned").clone();
        let _ = self.updates.send(snapshot);
    }

    /// Every widget state the adapter mirrored into the object.
    #[must_use]
    pub fn mirrored_states(&self) -> Vec<WidgetState> {
        self.mirrored.lock().expect("mirrored lock poisoned").clone()
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BridgeHandle for MockBridge {
    fn snapshot(&self) -> BridgeSnapshot {
        self.snapshot.lock().expect("snapshot lock poisoned").clone()
    }

    fn has_call_tool(&self) -> bool {
        self.call_tool_enabled
    }

    async fn call_tool(&self, name: &str, _arguments: Value) -> Result<Value, String> {
        let script = self
            .tools
            .lock()
            .expect("tools lock poisoned")
            .get(name)
            .cloned();
        script.ok_or_else(|| format!("unknown tool: {name}"))
    }

    fn set_widget_state(&self, state: &WidgetState) {
        self.snapshot
            .lock()
            .expect("snapshot lock poisoned")
            .widget_state = Some(state.clone());
        self.mirrored
            .lock()
            .expect("mirrored lock poisoned")
            .push(state.clone());
    }

    fn request_display_mode(&self, mode: DisplayMode) -> Option<DisplayMode> {
        self.grant_display_mode.then_some(mode)
    }

    fn updates(&self) -> broadcast::Receiver<BridgeSnapshot> {
        self.updates.subscribe()
    }
}
