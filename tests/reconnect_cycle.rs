// SPDX-License-Identifier: MIT OR Apache-2.0
//! Disconnect followed by connect returns every adapter to an equivalent
//! initial state.

use serde_json::json;
use sfl_client::{
    BridgeAdapter, BridgeSnapshot, ChannelAdapter, ClientConfig, HostAdapter, NullAdapter,
};
use sfl_core::{TriggerOrigin, UiEventKind, WidgetState};
use sfl_host_mock::{MockBridge, MockHost};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn channel_adapter_reconnects_to_equivalent_state() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .widget_state(WidgetState::new(json!({"v": 1}), json!(null)))
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());

    adapter.connect().await.unwrap();
    assert!(adapter.state().is_ready);
    assert!(adapter.state().widget_state.is_some());
    assert!(adapter.host_context().is_some());
    assert_eq!(adapter.provenance(), Some(TriggerOrigin::User));

    adapter.disconnect().await;
    assert!(!adapter.state().is_ready);
    assert!(adapter.state().widget_state.is_none());
    assert!(adapter.host_context().is_none());
    assert_eq!(adapter.provenance(), None);

    adapter.connect().await.unwrap();
    assert!(adapter.state().is_ready);
    assert!(adapter.state().widget_state.is_some(), "restored again");
    assert_eq!(adapter.provenance(), Some(TriggerOrigin::User));
}

#[tokio::test(start_paused = true)]
async fn disconnect_clears_pending_buffer() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();

    host.push_tool_result(&sfl_core::ToolResult::default()).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    adapter.disconnect().await;
    adapter.connect().await.unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let _sub = adapter.events().on(UiEventKind::ToolResult, move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(
        fired.load(Ordering::SeqCst),
        0,
        "a pre-disconnect buffer must not leak into the next connection"
    );
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_gating_cancels_the_timer() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::Tool)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();
    assert!(!adapter.state().is_ready);

    adapter.disconnect().await;
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(
        !adapter.state().is_ready,
        "a stale gate timer must have no late effect"
    );
}

#[tokio::test]
async fn bridge_adapter_reconnects_and_reemits_snapshot() {
    let bridge = Arc::new(MockBridge::with_snapshot(BridgeSnapshot {
        tool_output: Some(json!({"items": [1, 2]})),
        ..BridgeSnapshot::default()
    }));
    let adapter = BridgeAdapter::new(bridge.clone());

    adapter.connect().await.unwrap();
    assert!(adapter.state().is_ready);

    adapter.disconnect().await;
    assert!(!adapter.state().is_ready);
    assert!(adapter.state().widget_state.is_none());

    adapter.connect().await.unwrap();
    assert!(adapter.state().is_ready);

    // The fresh connection re-reads the snapshot; a new subscriber gets the
    // re-emitted tool result from the replay buffer.
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let _sub = adapter.events().on(UiEventKind::ToolResult, move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn null_adapter_reconnects_cleanly() {
    let adapter = NullAdapter::new();
    adapter.connect().await.unwrap();
    adapter.set_widget_state(WidgetState::new(json!(1), json!(2)));

    adapter.disconnect().await;
    assert!(!adapter.state().is_ready);
    assert!(adapter.state().widget_state.is_none());

    adapter.connect().await.unwrap();
    assert!(adapter.state().is_ready);
    assert!(adapter.state().widget_state.is_none());
}
