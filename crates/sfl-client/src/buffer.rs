//! Single-slot replay buffering for events that arrive before application
//! code subscribes.
//!
//! Each buffer-eligible kind is an explicit two-state machine: empty, or
//! holding exactly the latest instance. Earlier values are overwritten,
//! never queued; a newer value always supersedes a stale in-flight one.

use sfl_core::{UiEvent, UiEventKind};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct ReplayBuffer {
    slots: HashMap<UiEventKind, UiEvent>,
}

impl ReplayBuffer {
    /// Retain `event` for later replay. Returns `false` (and drops the
    /// event) when its kind is not buffer-eligible.
    pub(crate) fn store(&mut self, event: UiEvent) -> bool {
        let kind = event.kind();
        if !kind.is_buffered() {
            return false;
        }
        self.slots.insert(kind, event);
        true
    }

    /// Consume the pending slot for `kind`, if any.
    pub(crate) fn take(&mut self, kind: UiEventKind) -> Option<UiEvent> {
        self.slots.remove(&kind)
    }

    /// Consume every pending slot. Used to carry unreplayed events across
    /// the vendor-refinement adapter swap.
    pub(crate) fn drain(&mut self) -> Vec<UiEvent> {
        self.slots.drain().map(|(_, ev)| ev).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfl_core::{ToolInput, ToolResult};

    fn result_event(tag: i64) -> UiEvent {
        UiEvent::ToolResult {
            result: ToolResult {
                structured_content: Some(serde_json::json!({ "tag": tag })),
                ..ToolResult::default()
            },
        }
    }

    #[test]
    fn stores_and_takes_latest_only() {
        let mut buf = ReplayBuffer::default();
        assert!(buf.store(result_event(1)));
        assert!(buf.store(result_event(2)));

        let taken = buf.take(UiEventKind::ToolResult).unwrap();
        assert_eq!(taken, result_event(2), "older slot must be overwritten");
        assert!(buf.take(UiEventKind::ToolResult).is_none(), "consumed once");
    }

    #[test]
    fn kinds_are_independent_slots() {
        let mut buf = ReplayBuffer::default();
        buf.store(result_event(1));
        buf.store(UiEvent::ToolInput {
            input: ToolInput::default(),
        });

        assert!(buf.take(UiEventKind::ToolInput).is_some());
        assert!(buf.take(UiEventKind::ToolResult).is_some());
    }

    #[test]
    fn non_eligible_kinds_are_dropped() {
        let mut buf = ReplayBuffer::default();
        assert!(!buf.store(UiEvent::Teardown));
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_empties_all_slots() {
        let mut buf = ReplayBuffer::default();
        buf.store(result_event(1));
        buf.store(UiEvent::ToolInput {
            input: ToolInput::default(),
        });
        let drained = buf.drain();
        assert_eq!(drained.len(), 2);
        assert!(buf.is_empty());
    }
}
