// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single-slot buffering of events that beat the application's subscribe.

use serde_json::{json, Value};
use sfl_client::{ChannelAdapter, ClientConfig, HostAdapter};
use sfl_core::{ToolResult, TriggerOrigin, UiEvent, UiEventKind};
use sfl_host_mock::MockHost;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn pushed_result(tag: i64) -> ToolResult {
    ToolResult {
        structured_content: Some(json!({ "tag": tag })),
        ..ToolResult::default()
    }
}

fn collector(
    adapter: &ChannelAdapter,
    kind: UiEventKind,
) -> (Arc<Mutex<Vec<Value>>>, sfl_client::Subscription) {
    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = adapter.events().on(kind, move |ev| {
        let tag = match ev {
            UiEvent::ToolResult { result } => {
                result.structured_content.clone().unwrap_or(Value::Null)
            }
            UiEvent::ToolInput { input } => input.arguments.clone(),
            _ => Value::Null,
        };
        sink.lock().unwrap().push(tag);
    });
    (seen, sub)
}

#[tokio::test(start_paused = true)]
async fn zero_subscriber_event_is_replayed_exactly_once() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();

    host.push_tool_result(&pushed_result(1)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (first, _sub_a) = collector(&adapter, UiEventKind::ToolResult);
    assert_eq!(
        first.lock().unwrap().as_slice(),
        &[json!({"tag": 1})],
        "first subscriber gets the buffered instance"
    );

    let (second, _sub_b) = collector(&adapter, UiEventKind::ToolResult);
    assert!(
        second.lock().unwrap().is_empty(),
        "second subscriber sees nothing from the same occurrence"
    );
}

#[tokio::test(start_paused = true)]
async fn newer_buffered_value_supersedes_older_one() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();

    host.push_tool_result(&pushed_result(1)).unwrap();
    host.push_tool_result(&pushed_result(2)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (seen, _sub) = collector(&adapter, UiEventKind::ToolResult);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[json!({"tag": 2})],
        "only the latest instance is kept; overwritten, never queued"
    );
}

#[tokio::test(start_paused = true)]
async fn live_subscribers_receive_without_buffering() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();

    let (a, _sub_a) = collector(&adapter, UiEventKind::ToolResult);
    let (b, _sub_b) = collector(&adapter, UiEventKind::ToolResult);

    host.push_tool_result(&pushed_result(7)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(a.lock().unwrap().len(), 1);
    assert_eq!(b.lock().unwrap().len(), 1, "all live subscribers delivered");
}

#[tokio::test(start_paused = true)]
async fn input_and_result_slots_are_independent() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();

    host.push_tool_input(&sfl_core::ToolInput {
        tool_name: Some("refresh".into()),
        arguments: json!({"page": 1}),
    })
    .unwrap();
    host.push_tool_result(&pushed_result(3)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (inputs, _si) = collector(&adapter, UiEventKind::ToolInput);
    let (results, _sr) = collector(&adapter, UiEventKind::ToolResult);
    assert_eq!(inputs.lock().unwrap().as_slice(), &[json!({"page": 1})]);
    assert_eq!(results.lock().unwrap().as_slice(), &[json!({"tag": 3})]);
}

#[tokio::test(start_paused = true)]
async fn teardown_is_not_buffered() {
    let host = MockHost::builder()
        .triggered_by(TriggerOrigin::User)
        .spawn();
    let adapter = ChannelAdapter::generic(host.transport(), ClientConfig::default());
    adapter.connect().await.unwrap();

    host.push_teardown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fired = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let _sub = adapter.events().on(UiEventKind::Teardown, move |_| {
        f.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });
    assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 0);
}
