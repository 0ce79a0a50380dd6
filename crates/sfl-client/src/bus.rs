// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-process publish/subscribe with single-slot replay.
//!
//! Every adapter owns one [`EventBus`]. Delivery is synchronous and in
//! registration order. Events of a buffer-eligible kind that arrive with
//! zero subscribers are retained (latest instance only) and replayed
//! exactly once to the first subscriber that registers afterward; this
//! resolves the race between transport delivery, which can begin the
//! instant the channel opens, and application-level subscription, which
//! happens after at least one render pass.

use crate::buffer::ReplayBuffer;
use sfl_core::{HostClientState, UiEvent, UiEventKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type EventHandler = Arc<dyn Fn(&UiEvent) + Send + Sync>;
type StateListener = Arc<dyn Fn(&HostClientState, &HostClientState) + Send + Sync>;

struct HandlerEntry {
    token: u64,
    handler: EventHandler,
}

struct StateEntry {
    token: u64,
    listener: StateListener,
}

#[derive(Default)]
struct BusInner {
    next_token: AtomicU64,
    handlers: Mutex<HashMap<UiEventKind, Vec<HandlerEntry>>>,
    state_listeners: Mutex<Vec<StateEntry>>,
    replay: Mutex<ReplayBuffer>,
}

/// Cheaply cloneable event bus; all clones share the same listener lists.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    ///
    /// If an instance of `kind` is pending in the replay buffer it is
    /// delivered to this handler immediately, and to no later subscriber.
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn on(
        &self,
        kind: UiEventKind,
        handler: impl Fn(&UiEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let handler: EventHandler = Arc::new(handler);
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .expect("handler lock poisoned")
            .entry(kind)
            .or_default()
            .push(HandlerEntry {
                token,
                handler: Arc::clone(&handler),
            });

        let pending = self
            .inner
            .replay
            .lock()
            .expect("replay lock poisoned")
            .take(kind);
        if let Some(event) = pending {
            // Invoked outside every lock so the handler may re-enter the bus.
            handler(&event);
        }

        Subscription {
            inner: Arc::downgrade(&self.inner),
            target: Target::Event(kind, token),
        }
    }

    /// Deliver `event` to current subscribers of its kind, synchronously and
    /// in registration order. With zero subscribers, buffer-eligible kinds
    /// are retained for replay; everything else is dropped.
    pub fn emit(&self, event: UiEvent) {
        let kind = event.kind();
        let snapshot: Vec<EventHandler> = self
            .inner
            .handlers
            .lock()
            .expect("handler lock poisoned")
            .get(&kind)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default();

        if snapshot.is_empty() {
            if kind.is_buffered() {
                self.inner
                    .replay
                    .lock()
                    .expect("replay lock poisoned")
                    .store(event);
            } else {
                tracing::trace!(target: "sfl_client", ?kind, "dropping event with no subscribers");
            }
            return;
        }

        // A handler that unsubscribes mid-emission may still see this event
        // (the snapshot is already taken) but never breaks delivery to the
        // rest of the snapshot.
        for handler in snapshot {
            handler(&event);
        }
    }

    /// Register a listener for `(next, previous)` state pairs.
    ///
    /// Fires on every run of the owning adapter's state setter, even when
    /// no field changed; diffing is the listener's responsibility.
    pub fn subscribe_state(
        &self,
        listener: impl Fn(&HostClientState, &HostClientState) + Send + Sync + 'static,
    ) -> Subscription {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.inner
            .state_listeners
            .lock()
            .expect("state lock poisoned")
            .push(StateEntry {
                token,
                listener: Arc::new(listener),
            });
        Subscription {
            inner: Arc::downgrade(&self.inner),
            target: Target::State(token),
        }
    }

    pub(crate) fn notify_state(&self, next: &HostClientState, previous: &HostClientState) {
        let snapshot: Vec<StateListener> = self
            .inner
            .state_listeners
            .lock()
            .expect("state lock poisoned")
            .iter()
            .map(|e| Arc::clone(&e.listener))
            .collect();
        for listener in snapshot {
            listener(next, previous);
        }
    }

    /// Consume every buffered-but-unreplayed event. Used by the facade to
    /// carry pending events across the vendor-refinement adapter swap.
    pub(crate) fn drain_buffered(&self) -> Vec<UiEvent> {
        self.inner
            .replay
            .lock()
            .expect("replay lock poisoned")
            .drain()
    }

    pub(crate) fn clear_buffered(&self) {
        self.inner
            .replay
            .lock()
            .expect("replay lock poisoned")
            .clear();
    }

    #[cfg(test)]
    fn subscriber_count(&self, kind: UiEventKind) -> usize {
        self.inner
            .handlers
            .lock()
            .expect("handler lock poisoned")
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

enum Target {
    Event(UiEventKind, u64),
    State(u64),
}

/// Guard for a registered handler; dropping it unsubscribes.
pub struct Subscription {
    inner: Weak<BusInner>,
    target: Target,
}

impl Subscription {
    /// Explicitly unsubscribe. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        match self.target {
            Target::Event(kind, token) => {
                let mut handlers = inner.handlers.lock().expect("handler lock poisoned");
                if let Some(entries) = handlers.get_mut(&kind) {
                    entries.retain(|e| e.token != token);
                }
            }
            Target::State(token) => {
                inner
                    .state_listeners
                    .lock()
                    .expect("state lock poisoned")
                    .retain(|e| e.token != token);
            }
        }
    }
}
