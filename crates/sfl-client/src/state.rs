//! Shared client-state cell and the widget-state write path.
//!
//! Every adapter owns exactly one [`StateCell`]; its `update` method is the
//! single state setter the contract requires. Listeners always observe the
//! `(next, previous)` pair, even when the mutation was a no-op.

use crate::bus::EventBus;
use sfl_core::{HostClientState, HostEnvironment, WidgetState};
use std::sync::Mutex;

pub(crate) struct StateCell {
    state: Mutex<HostClientState>,
    bus: EventBus,
}

impl StateCell {
    pub(crate) fn new(environment: HostEnvironment, bus: EventBus) -> Self {
        Self {
            state: Mutex::new(HostClientState::initial(environment)),
            bus,
        }
    }

    pub(crate) fn get(&self) -> HostClientState {
        self.state.lock().expect("state lock poisoned").clone()
    }

    /// Apply `mutate` and notify state listeners with the resulting pair.
    ///
    /// The lock is released before notification so listeners may re-enter
    /// the adapter.
    pub(crate) fn update(&self, mutate: impl FnOnce(&mut HostClientState)) {
        let (next, previous) = {
            let mut guard = self.state.lock().expect("state lock poisoned");
            let previous = guard.clone();
            mutate(&mut guard);
            (guard.clone(), previous)
        };
        self.bus.notify_state(&next, &previous);
    }

    /// Replace the widget-state blob atomically. Concurrent writers are
    /// last-write-wins; both parts are always replaced together.
    pub(crate) fn replace_widget_state(&self, state: WidgetState) {
        self.update(|s| s.widget_state = Some(state));
    }
}
