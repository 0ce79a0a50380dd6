// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for the `RpcMessage` wire type in `sfl-protocol`.

use proptest::prelude::*;
use sfl_protocol::{JsonCodec, RpcError, RpcMessage, RpcNotification, RpcOutcome, RpcRequest, RpcResponse};

// ── Leaf strategies ─────────────────────────────────────────────────────

fn arb_id() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}-[a-f0-9]{4}"
}

fn arb_method() -> impl Strategy<Value = String> {
    "[a-z]{1,10}(-[a-z]{1,10}){0,2}"
}

fn arb_json_value_simple() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        "[a-zA-Z0-9_ .-]{0,20}".prop_map(serde_json::Value::String),
        (-1000i64..1000).prop_map(|n| serde_json::Value::Number(n.into())),
    ]
}

fn arb_params() -> impl Strategy<Value = serde_json::Value> {
    prop::collection::btree_map("[a-z]{1,8}", arb_json_value_simple(), 0..4).prop_map(|m| {
        serde_json::Value::Object(m.into_iter().collect())
    })
}

fn arb_rpc_error() -> impl Strategy<Value = RpcError> {
    (
        -32700i64..-32000,
        "[a-z ]{1,30}",
        prop::option::of(arb_json_value_simple()),
    )
        .prop_map(|(code, message, data)| RpcError {
            code,
            message,
            data,
        })
}

// ── Envelope strategies ─────────────────────────────────────────────────

fn arb_message() -> impl Strategy<Value = RpcMessage> {
    prop_oneof![
        (arb_id(), arb_method(), arb_params()).prop_map(|(id, method, params)| {
            RpcMessage::Request(RpcRequest { id, method, params })
        }),
        (arb_id(), arb_params()).prop_map(|(id, result)| {
            RpcMessage::Response(RpcResponse {
                id,
                outcome: RpcOutcome::Ok { result },
            })
        }),
        (arb_id(), arb_rpc_error()).prop_map(|(id, error)| {
            RpcMessage::Response(RpcResponse {
                id,
                outcome: RpcOutcome::Err { error },
            })
        }),
        (arb_method(), arb_params()).prop_map(|(method, params)| {
            RpcMessage::Notification(RpcNotification { method, params })
        }),
    ]
}

proptest! {
    #[test]
    fn encode_decode_roundtrip(msg in arb_message()) {
        let raw = JsonCodec::encode(&msg).unwrap();
        let back = JsonCodec::decode(&raw).unwrap();
        prop_assert_eq!(back, msg);
    }

    #[test]
    fn classification_is_shape_stable(msg in arb_message()) {
        // Re-encoding the decoded value classifies into the same variant.
        let raw = JsonCodec::encode(&msg).unwrap();
        let back = JsonCodec::decode(&raw).unwrap();
        let same_variant = matches!(
            (&msg, &back),
            (RpcMessage::Request(_), RpcMessage::Request(_))
                | (RpcMessage::Response(_), RpcMessage::Response(_))
                | (RpcMessage::Notification(_), RpcMessage::Notification(_))
        );
        prop_assert!(same_variant);
    }

    #[test]
    fn requests_always_carry_id_and_method(msg in arb_message()) {
        if let RpcMessage::Request(_) = &msg {
            prop_assert!(msg.id().is_some());
            prop_assert!(msg.method().is_some());
        }
    }
}
