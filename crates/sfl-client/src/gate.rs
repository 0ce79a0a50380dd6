// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ready-state gate for surfaces opened by an autonomous agent action.
//!
//! A surface opened by a tool call renders nothing useful until the
//! associated result arrives; flipping ready early produces a visible flash
//! from "default empty view" to "agent-supplied view". A surface opened by a
//! human must never be left in a spinner state waiting for data that will
//! never come. The gate encodes exactly that rule: wait for the first pushed
//! event or a bounded timeout, but only when provenance says the agent
//! opened us.

use sfl_core::TriggerOrigin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Whether `triggered_by` requires waiting for the first pushed event.
///
/// Unspecified provenance is treated like a tool trigger, the conservative
/// side of the race.
pub(crate) fn waits_for_first_event(triggered_by: Option<TriggerOrigin>) -> bool {
    matches!(triggered_by, None | Some(TriggerOrigin::Tool))
}

/// One connection's ready-state timer. Armed at most once; settling (first
/// pushed event, or disconnect) makes the timer permanently inert.
pub(crate) struct ReadyGate {
    settled: Arc<AtomicBool>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ReadyGate {
    pub(crate) fn new() -> Self {
        Self {
            settled: Arc::new(AtomicBool::new(false)),
            timer: Mutex::new(None),
        }
    }

    /// Arm the bounded buffer timer. `on_elapsed` runs once after `timeout`
    /// unless [`settle`](Self::settle) ran first.
    pub(crate) fn arm(&self, timeout: Duration, on_elapsed: impl FnOnce() + Send + 'static) {
        let settled = Arc::clone(&self.settled);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if !settled.swap(true, Ordering::SeqCst) {
                on_elapsed();
            }
        });
        *self.timer.lock().expect("gate lock poisoned") = Some(handle);
    }

    /// Make the timer inert. Idempotent; safe when never armed.
    pub(crate) fn settle(&self) {
        self.settled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.timer.lock().expect("gate lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for ReadyGate {
    fn drop(&mut self) {
        self.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn tool_and_unspecified_provenance_wait() {
        assert!(waits_for_first_event(Some(TriggerOrigin::Tool)));
        assert!(waits_for_first_event(None));
        assert!(!waits_for_first_event(Some(TriggerOrigin::User)));
        assert!(!waits_for_first_event(Some(TriggerOrigin::Restore)));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_timeout() {
        let gate = ReadyGate::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        gate.arm(Duration::from_millis(500), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "must not fire early");
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_before_timeout_suppresses_callback() {
        let gate = ReadyGate::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        gate.arm(Duration::from_millis(500), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        gate.settle();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_is_idempotent_and_safe_unarmed() {
        let gate = ReadyGate::new();
        gate.settle();
        gate.settle();

        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        // Arming after settle: the settled flag already won.
        gate.arm(Duration::from_millis(10), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let gate = ReadyGate::new();
            let f = Arc::clone(&fired);
            gate.arm(Duration::from_millis(10), move || {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
