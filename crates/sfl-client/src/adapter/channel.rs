// SPDX-License-Identifier: MIT OR Apache-2.0
//! Channel-family adapter: asynchronous handshake + notification protocol.
//!
//! State machine: `Idle → Connecting → (ReadyPending | Ready) → Disconnected`.
//!
//! Requests are matched to responses by id; multiple calls may be in
//! flight and responses may arrive out of send order. Pushed `tool-input`
//! and `tool-result` notifications feed both the event bus (with replay
//! buffering) and the ready-state gate.

use crate::adapter::{ChannelProfile, HostAdapter};
use crate::bus::EventBus;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gate::{waits_for_first_event, ReadyGate};
use crate::state::StateCell;
use crate::transport::ChannelTransport;
use async_trait::async_trait;
use serde_json::Value;
use sfl_core::{
    AdapterCapabilities, DisplayMode, HostCapabilities, HostClientState, HostContext,
    HostEnvironment, ResultSource, ToolInput, ToolResult, TriggerOrigin, UiEvent, WidgetState,
};
use sfl_protocol::version::check_host_version;
use sfl_protocol::{
    CallToolParams, ClientInfo, FollowUpParams, InitializeParams, InitializeResult, Method,
    ProtocolError, RequestDisplayModeParams, RequestDisplayModeResult, RequestModalParams,
    RpcError, RpcMessage, RpcNotification, TitleChangedParams, UpdateModelContextParams,
    WidgetStateChangedParams,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connecting,
    ReadyPending,
    Ready,
    Disconnected,
}

type PendingSender = oneshot::Sender<Result<Value, RpcError>>;

struct ChannelInner {
    transport: Arc<dyn ChannelTransport>,
    profile: ChannelProfile,
    config: ClientConfig,
    bus: EventBus,
    state: StateCell,
    phase: Mutex<Phase>,
    pending: Mutex<HashMap<String, PendingSender>>,
    host_context: Mutex<Option<HostContext>>,
    host_caps: Mutex<HostCapabilities>,
    instance_id: Mutex<Option<String>>,
    provenance: Mutex<Option<TriggerOrigin>>,
    gate: Mutex<Option<ReadyGate>>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
    /// Set when a pushed tool event arrived during the current connection.
    saw_pushed: AtomicBool,
    /// Bumped on every disconnect; stale tasks compare before mutating.
    epoch: AtomicU64,
}

/// Adapter for hosts reached through a cross-context messaging channel.
pub struct ChannelAdapter {
    inner: Arc<ChannelInner>,
}

impl ChannelAdapter {
    /// Build an adapter with an explicit profile.
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        profile: ChannelProfile,
        config: ClientConfig,
    ) -> Self {
        let bus = EventBus::new();
        let state = StateCell::new(profile.environment, bus.clone());
        Self {
            inner: Arc::new(ChannelInner {
                transport,
                profile,
                config,
                bus,
                state,
                phase: Mutex::new(Phase::Idle),
                pending: Mutex::new(HashMap::new()),
                host_context: Mutex::new(None),
                host_caps: Mutex::new(HostCapabilities::default()),
                instance_id: Mutex::new(None),
                provenance: Mutex::new(None),
                gate: Mutex::new(None),
                dispatch: Mutex::new(None),
                saw_pushed: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Build an adapter with the generic channel profile.
    #[must_use]
    pub fn generic(transport: Arc<dyn ChannelTransport>, config: ClientConfig) -> Self {
        Self::new(transport, ChannelProfile::generic(), config)
    }

    /// The profile this adapter was built with.
    #[must_use]
    pub fn profile(&self) -> &ChannelProfile {
        &self.inner.profile
    }

    /// Trigger provenance resolved by the last handshake.
    #[must_use]
    pub fn provenance(&self) -> Option<TriggerOrigin> {
        *self.inner.provenance.lock().expect("provenance lock poisoned")
    }

    async fn handshake(&self, epoch: u64) -> Result<(), ClientError> {
        let inner = &self.inner;
        let params = InitializeParams {
            client_info: ClientInfo {
                name: inner.config.client_name.clone(),
                version: inner.config.client_version.clone(),
            },
            protocol_version: sfl_core::PROTOCOL_VERSION.to_string(),
        };
        let params = serde_json::to_value(&params).map_err(ProtocolError::Json)?;
        let value = self
            .request(Method::Initialize, params, Some(inner.config.handshake_timeout()))
            .await
            .map_err(|err| match err {
                ClientError::TransportAbsent(_) | ClientError::HandshakeFailed(_) => err,
                other => ClientError::HandshakeFailed(other.to_string()),
            })?;
        let init: InitializeResult = serde_json::from_value(value)
            .map_err(|e| ClientError::HandshakeFailed(format!("malformed initialize result: {e}")))?;
        check_host_version(&init.protocol_version)
            .map_err(|e| ClientError::HandshakeFailed(e.to_string()))?;

        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return Err(ClientError::ChannelClosed);
        }

        *inner.host_caps.lock().expect("caps lock poisoned") = init.capabilities;
        apply_host_context(inner, &init.host_context);

        let triggered = init.host_context.triggered_by();
        *inner.provenance.lock().expect("provenance lock poisoned") = triggered;
        debug!(
            target: "sfl_client",
            profile = inner.profile.name,
            triggered = ?triggered,
            "handshake complete"
        );

        if waits_for_first_event(triggered) && !inner.saw_pushed.load(Ordering::SeqCst) {
            {
                let mut phase = inner.phase.lock().expect("phase lock poisoned");
                if *phase != Phase::Connecting {
                    return Err(ClientError::ChannelClosed);
                }
                *phase = Phase::ReadyPending;
            }
            let gate = ReadyGate::new();
            let timer_inner = Arc::clone(inner);
            gate.arm(inner.config.ready_buffer_timeout(), move || {
                promote_ready(&timer_inner, epoch);
            });
            *inner.gate.lock().expect("gate lock poisoned") = Some(gate);
        } else {
            promote_ready(inner, epoch);
        }
        Ok(())
    }

    /// Send a request and await its matched response.
    ///
    /// `timeout` is only passed for the handshake, hence the error mapping.
    async fn request(
        &self,
        method: Method,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, ClientError> {
        let inner = &self.inner;
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        inner
            .pending
            .lock()
            .expect("pending lock poisoned")
            .insert(id.clone(), tx);

        if let Err(err) = inner.transport.send(RpcMessage::request(id.clone(), method, params)) {
            inner.pending.lock().expect("pending lock poisoned").remove(&id);
            return Err(err);
        }

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(done) => done,
                Err(_) => {
                    inner.pending.lock().expect("pending lock poisoned").remove(&id);
                    return Err(ClientError::HandshakeFailed(format!(
                        "no response to {method} within {}ms",
                        limit.as_millis()
                    )));
                }
            },
            None => rx.await,
        };
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(rpc)) => Err(rpc.into()),
            Err(_) => Err(ClientError::ChannelClosed),
        }
    }

    fn ensure_connected(&self) -> Result<(), ClientError> {
        let phase = *self.inner.phase.lock().expect("phase lock poisoned");
        match phase {
            Phase::Connecting | Phase::ReadyPending | Phase::Ready => Ok(()),
            Phase::Idle | Phase::Disconnected => Err(ClientError::NotConnected),
        }
    }

    fn abandon_connection(&self) {
        let inner = &self.inner;
        *inner.phase.lock().expect("phase lock poisoned") = Phase::Disconnected;
        inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = inner.dispatch.lock().expect("dispatch lock poisoned").take() {
            handle.abort();
        }
        inner.pending.lock().expect("pending lock poisoned").clear();
    }

    fn notify(&self, method: Method, params: Value) {
        if let Err(err) = self.inner.transport.send(RpcMessage::notification(method, params)) {
            debug!(target: "sfl_client", %method, "notification dropped: {err}");
        }
    }
}

impl Drop for ChannelAdapter {
    fn drop(&mut self) {
        // An adapter dropped without disconnect() must not leave its
        // dispatch task or gate timer running.
        if let Some(handle) = self.inner.dispatch.lock().expect("dispatch lock poisoned").take() {
            handle.abort();
        }
        if let Some(gate) = self.inner.gate.lock().expect("gate lock poisoned").take() {
            gate.settle();
        }
    }
}

#[async_trait]
impl HostAdapter for ChannelAdapter {
    fn environment(&self) -> HostEnvironment {
        self.inner.profile.environment
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.inner.profile.capabilities
    }

    fn events(&self) -> &EventBus {
        &self.inner.bus
    }

    fn state(&self) -> HostClientState {
        self.inner.state.get()
    }

    fn host_context(&self) -> Option<HostContext> {
        self.inner
            .host_context
            .lock()
            .expect("context lock poisoned")
            .clone()
    }

    async fn connect(&self) -> Result<(), ClientError> {
        let inner = &self.inner;
        {
            let mut phase = inner.phase.lock().expect("phase lock poisoned");
            match *phase {
                Phase::Connecting | Phase::ReadyPending | Phase::Ready => return Ok(()),
                Phase::Idle | Phase::Disconnected => *phase = Phase::Connecting,
            }
        }
        let epoch = inner.epoch.load(Ordering::SeqCst);
        inner.saw_pushed.store(false, Ordering::SeqCst);

        // The dispatch task must be live before `initialize` goes out, or
        // the response (and any immediately-pushed events) would be lost.
        let rx = inner.transport.subscribe();
        let handle = tokio::spawn(dispatch_loop(Arc::clone(inner), rx, epoch));
        *inner.dispatch.lock().expect("dispatch lock poisoned") = Some(handle);

        match self.handshake(epoch).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(target: "sfl_client", profile = inner.profile.name, "handshake failed: {err}");
                self.abandon_connection();
                Err(err)
            }
        }
    }

    async fn disconnect(&self) {
        let inner = &self.inner;
        *inner.phase.lock().expect("phase lock poisoned") = Phase::Disconnected;
        inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = inner.gate.lock().expect("gate lock poisoned").take() {
            gate.settle();
        }
        if let Some(handle) = inner.dispatch.lock().expect("dispatch lock poisoned").take() {
            handle.abort();
        }
        // Dropping the senders resolves in-flight calls with ChannelClosed.
        inner.pending.lock().expect("pending lock poisoned").clear();
        *inner.host_context.lock().expect("context lock poisoned") = None;
        *inner.host_caps.lock().expect("caps lock poisoned") = HostCapabilities::default();
        *inner.instance_id.lock().expect("instance lock poisoned") = None;
        *inner.provenance.lock().expect("provenance lock poisoned") = None;
        inner.saw_pushed.store(false, Ordering::SeqCst);
        inner.bus.clear_buffered();
        inner.state.update(|s| {
            s.is_ready = false;
            s.widget_state = None;
        });
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ClientError> {
        self.ensure_connected()?;
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let params = serde_json::to_value(&params).map_err(ProtocolError::Json)?;
        let value = self.request(Method::CallTool, params, None).await?;
        let mut result: ToolResult =
            serde_json::from_value(value).map_err(|e| ClientError::Protocol(e.into()))?;
        result.source = ResultSource::Ui;
        if result.tool_name.is_none() {
            result.tool_name = Some(name.to_string());
        }
        if let Some(id) = result.instance_id() {
            *self.inner.instance_id.lock().expect("instance lock poisoned") = Some(id.to_string());
        }
        self.inner.bus.emit(UiEvent::ToolResult {
            result: result.clone(),
        });
        Ok(result)
    }

    fn set_widget_state(&self, state: WidgetState) {
        self.inner.state.replace_widget_state(state.clone());
        match serde_json::to_value(WidgetStateChangedParams { state }) {
            Ok(params) => self.notify(Method::WidgetStateChanged, params),
            Err(err) => debug!(target: "sfl_client", "widget state not serializable: {err}"),
        }
    }

    async fn request_display_mode(&self, mode: DisplayMode) -> DisplayMode {
        let supported = self
            .inner
            .host_caps
            .lock()
            .expect("caps lock poisoned")
            .display_mode_requests;
        if !supported || self.ensure_connected().is_err() {
            return mode;
        }
        let Ok(params) = serde_json::to_value(RequestDisplayModeParams { mode }) else {
            return mode;
        };
        match self.request(Method::RequestDisplayMode, params, None).await {
            Ok(value) => serde_json::from_value::<RequestDisplayModeResult>(value)
                .map(|r| r.mode)
                .unwrap_or(mode),
            Err(err) => {
                debug!(target: "sfl_client", "display mode request failed: {err}");
                mode
            }
        }
    }

    fn notify_host(&self, payload: Value) {
        self.notify(Method::Notify, payload);
    }

    fn instance_id(&self) -> Option<String> {
        if !self.inner.profile.capabilities.multi_instance {
            return None;
        }
        self.inner
            .instance_id
            .lock()
            .expect("instance lock poisoned")
            .clone()
    }

    async fn set_title(&self, title: &str) {
        if !self.inner.profile.capabilities.title_mutation {
            return;
        }
        match serde_json::to_value(TitleChangedParams {
            title: title.to_string(),
        }) {
            Ok(params) => self.notify(Method::TitleChanged, params),
            Err(err) => debug!(target: "sfl_client", "title not serializable: {err}"),
        }
    }

    async fn push_model_context(&self, content: Value) {
        if !self.inner.profile.capabilities.model_context_push {
            return;
        }
        let accepted = self
            .inner
            .host_caps
            .lock()
            .expect("caps lock poisoned")
            .model_context;
        if !accepted {
            return;
        }
        let Ok(params) = serde_json::to_value(UpdateModelContextParams { content }) else {
            return;
        };
        if let Err(err) = self.request(Method::UpdateModelContext, params, None).await {
            debug!(target: "sfl_client", "model context push failed: {err}");
        }
    }

    async fn send_follow_up(&self, prompt: &str) {
        if !self.inner.profile.capabilities.follow_up_prompts {
            return;
        }
        match serde_json::to_value(FollowUpParams {
            prompt: prompt.to_string(),
        }) {
            Ok(params) => self.notify(Method::FollowUp, params),
            Err(err) => debug!(target: "sfl_client", "follow-up not serializable: {err}"),
        }
    }

    async fn request_modal(&self, payload: Value) {
        if !self.inner.profile.capabilities.modal_requests {
            return;
        }
        let Ok(params) = serde_json::to_value(RequestModalParams { payload }) else {
            return;
        };
        if let Err(err) = self.request(Method::RequestModal, params, None).await {
            debug!(target: "sfl_client", "modal request failed: {err}");
        }
    }
}

/// Record the handshake context. Overwrite-style, so repeated delivery
/// (initialize response, then `host-context-changed`) is idempotent.
fn apply_host_context(inner: &Arc<ChannelInner>, ctx: &HostContext) {
    *inner.host_context.lock().expect("context lock poisoned") = Some(ctx.clone());
    if let Some(widget) = &ctx.widget_state {
        inner.state.replace_widget_state(widget.clone());
    }
}

/// Flip to `Ready` from `Connecting` or `ReadyPending`. Stale epochs (a
/// disconnect happened since the caller was scheduled) are inert.
fn promote_ready(inner: &Arc<ChannelInner>, epoch: u64) {
    if inner.epoch.load(Ordering::SeqCst) != epoch {
        return;
    }
    {
        let mut phase = inner.phase.lock().expect("phase lock poisoned");
        if !matches!(*phase, Phase::Connecting | Phase::ReadyPending) {
            return;
        }
        *phase = Phase::Ready;
    }
    inner.state.update(|s| s.is_ready = true);
}

/// A pushed tool event arrived: settle the gate, and promote if the
/// handshake already left us pending.
fn note_pushed_event(inner: &Arc<ChannelInner>, epoch: u64) {
    inner.saw_pushed.store(true, Ordering::SeqCst);
    if let Some(gate) = inner.gate.lock().expect("gate lock poisoned").as_ref() {
        gate.settle();
    }
    let pending = *inner.phase.lock().expect("phase lock poisoned") == Phase::ReadyPending;
    if pending {
        promote_ready(inner, epoch);
    }
}

async fn dispatch_loop(
    inner: Arc<ChannelInner>,
    mut rx: broadcast::Receiver<RpcMessage>,
    epoch: u64,
) {
    loop {
        match rx.recv().await {
            Ok(msg) => {
                if inner.epoch.load(Ordering::SeqCst) != epoch {
                    return;
                }
                dispatch_message(&inner, msg, epoch);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(target: "sfl_client.dispatch", "inbound lagged, skipped {n} messages");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn dispatch_message(inner: &Arc<ChannelInner>, msg: RpcMessage, epoch: u64) {
    match msg {
        RpcMessage::Response(resp) => {
            let sender = inner
                .pending
                .lock()
                .expect("pending lock poisoned")
                .remove(&resp.id);
            match sender {
                Some(tx) => {
                    let _ = tx.send(resp.outcome.into_result());
                }
                None => {
                    warn!(target: "sfl_client.dispatch", "dropping response for unknown id={}", resp.id);
                }
            }
        }
        RpcMessage::Notification(note) => dispatch_notification(inner, note, epoch),
        RpcMessage::Request(req) => {
            // Hosts have no requests to make of a surface.
            debug!(target: "sfl_client.dispatch", method = %req.method, "rejecting host request");
            let _ = inner
                .transport
                .send(RpcMessage::response_err(req.id, RpcError::method_not_found(&req.method)));
        }
    }
}

fn dispatch_notification(inner: &Arc<ChannelInner>, note: RpcNotification, epoch: u64) {
    match Method::parse(&note.method) {
        Some(Method::ToolInput) => match serde_json::from_value::<ToolInput>(note.params) {
            Ok(input) => {
                note_pushed_event(inner, epoch);
                inner.bus.emit(UiEvent::ToolInput { input });
            }
            Err(err) => warn!(target: "sfl_client.dispatch", "malformed tool-input: {err}"),
        },
        Some(Method::ToolResult) => match serde_json::from_value::<ToolResult>(note.params) {
            Ok(result) => {
                if let Some(id) = result.instance_id() {
                    *inner.instance_id.lock().expect("instance lock poisoned") =
                        Some(id.to_string());
                }
                note_pushed_event(inner, epoch);
                inner.bus.emit(UiEvent::ToolResult { result });
            }
            Err(err) => warn!(target: "sfl_client.dispatch", "malformed tool-result: {err}"),
        },
        Some(Method::HostContextChanged) => {
            match serde_json::from_value::<HostContext>(note.params) {
                Ok(ctx) => {
                    apply_host_context(inner, &ctx);
                    inner.bus.emit(UiEvent::HostContextChanged { context: ctx });
                }
                Err(err) => warn!(target: "sfl_client.dispatch", "malformed host context: {err}"),
            }
        }
        Some(Method::Teardown) => {
            debug!(target: "sfl_client.dispatch", "host announced teardown");
            inner.bus.emit(UiEvent::Teardown);
        }
        _ => {
            debug!(target: "sfl_client.dispatch", method = %note.method, "ignoring unknown notification");
        }
    }
}
