// SPDX-License-Identifier: MIT OR Apache-2.0
//! Channel transport abstraction and the in-memory reference transport.
//!
//! A [`ChannelTransport`] is the raw bidirectional pipe to a channel-family
//! host. It carries already-parsed [`RpcMessage`] values; framing and
//! delivery are the embedder's problem. The in-memory implementation backs
//! tests and the mock host.

use crate::error::ClientError;
use sfl_protocol::RpcMessage;
use tokio::sync::broadcast;

/// Channel capacity for in-memory transports.
const TRANSPORT_CAPACITY: usize = 256;

/// Bidirectional message pipe to a channel-family host.
pub trait ChannelTransport: Send + Sync {
    /// Fire-and-forget send toward the host.
    ///
    /// Fails with [`ClientError::TransportAbsent`] when no peer is listening.
    fn send(&self, msg: RpcMessage) -> Result<(), ClientError>;

    /// Subscribe to inbound messages.
    ///
    /// May be called again after a disconnect/reconnect cycle; each receiver
    /// observes messages delivered after its creation.
    fn subscribe(&self) -> broadcast::Receiver<RpcMessage>;
}

/// Client end of an in-memory transport pair.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    to_host: broadcast::Sender<RpcMessage>,
    to_client: broadcast::Sender<RpcMessage>,
}

impl ChannelTransport for MemoryTransport {
    fn send(&self, msg: RpcMessage) -> Result<(), ClientError> {
        self.to_host
            .send(msg)
            .map(|_| ())
            .map_err(|_| ClientError::TransportAbsent("no channel host listening".into()))
    }

    fn subscribe(&self) -> broadcast::Receiver<RpcMessage> {
        self.to_client.subscribe()
    }
}

/// Host end of an in-memory transport pair, held by tests and the mock host.
#[derive(Debug, Clone)]
pub struct MemoryHostEnd {
    to_host: broadcast::Sender<RpcMessage>,
    to_client: broadcast::Sender<RpcMessage>,
}

impl MemoryHostEnd {
    /// Push a message toward the client. Silently dropped when the client
    /// has no live subscription; hosts are fire-and-forget by contract.
    pub fn send(&self, msg: RpcMessage) {
        let _ = self.to_client.send(msg);
    }

    /// Subscribe to messages sent by the client.
    pub fn subscribe(&self) -> broadcast::Receiver<RpcMessage> {
        self.to_host.subscribe()
    }
}

/// Create a connected in-memory transport pair.
pub fn memory_channel() -> (MemoryTransport, MemoryHostEnd) {
    let (to_host, _) = broadcast::channel(TRANSPORT_CAPACITY);
    let (to_client, _) = broadcast::channel(TRANSPORT_CAPACITY);
    (
        MemoryTransport {
            to_host: to_host.clone(),
            to_client: to_client.clone(),
        },
        MemoryHostEnd { to_host, to_client },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfl_protocol::Method;

    #[tokio::test]
    async fn messages_flow_both_ways() {
        let (client, host) = memory_channel();
        let mut at_host = host.subscribe();
        let mut at_client = client.subscribe();

        client
            .send(RpcMessage::notification(Method::Notify, serde_json::json!(1)))
            .unwrap();
        host.send(RpcMessage::notification(Method::Teardown, serde_json::Value::Null));

        assert!(matches!(
            at_host.recv().await.unwrap(),
            RpcMessage::Notification(_)
        ));
        assert!(matches!(
            at_client.recv().await.unwrap(),
            RpcMessage::Notification(_)
        ));
    }

    #[tokio::test]
    async fn send_without_host_subscriber_is_transport_absent() {
        let (client, host) = memory_channel();
        drop(host);
        let err = client
            .send(RpcMessage::notification(Method::Notify, serde_json::Value::Null))
            .unwrap_err();
        assert!(matches!(err, ClientError::TransportAbsent(_)));
    }

    #[tokio::test]
    async fn resubscribe_sees_only_later_messages() {
        let (client, host) = memory_channel();
        host.send(RpcMessage::notification(Method::Notify, serde_json::json!("early")));

        let mut rx = client.subscribe();
        host.send(RpcMessage::notification(Method::Notify, serde_json::json!("late")));

        let RpcMessage::Notification(n) = rx.recv().await.unwrap() else {
            panic!("expected notification");
        };
        assert_eq!(n.params, serde_json::json!("late"));
    }
}
