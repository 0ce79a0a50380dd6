// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capability tables for adapters and hosts.
//!
//! Behavior differences between adapters are declared here once, at
//! construction time, instead of being probed ad hoc at each call site.

use serde::{Deserialize, Serialize};

/// What the active adapter actually implements.
///
/// A `false` flag never causes an error: the corresponding facade method is a
/// silent no-op returning an inert default, and callers must tolerate that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdapterCapabilities {
    /// Tracks `instanceId` routing keys across tool results.
    pub multi_instance: bool,

    /// Can ask the host to retitle the surface's window/card.
    pub title_mutation: bool,

    /// Can push additional model-visible context to the host.
    pub model_context_push: bool,

    /// Can ask the host to send a follow-up prompt to the agent.
    pub follow_up_prompts: bool,

    /// Can ask the host to open a modal.
    pub modal_requests: bool,

    /// Receives a [`crate::HostContext`] snapshot from a handshake.
    pub host_context: bool,
}

impl AdapterCapabilities {
    /// Nothing supported. The bridge and null adapters start here.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            multi_instance: false,
            title_mutation: false,
            model_context_push: false,
            follow_up_prompts: false,
            modal_requests: false,
            host_context: false,
        }
    }

    /// The generic channel-family feature set: handshake context only.
    #[must_use]
    pub const fn channel_generic() -> Self {
        Self {
            multi_instance: false,
            title_mutation: false,
            model_context_push: false,
            follow_up_prompts: false,
            modal_requests: false,
            host_context: true,
        }
    }

    /// The full vendor-refined channel feature set.
    #[must_use]
    pub const fn channel_vendor() -> Self {
        Self {
            multi_instance: true,
            title_mutation: true,
            model_context_push: true,
            follow_up_prompts: true,
            modal_requests: true,
            host_context: true,
        }
    }
}

/// Capability flags the host reports in its `initialize` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCapabilities {
    /// Host honors `request-display-mode`.
    #[serde(default = "default_true")]
    pub display_mode_requests: bool,

    /// Host accepts `update-model-context`.
    #[serde(default)]
    pub model_context: bool,

    /// Host routes results per surface instance.
    #[serde(default)]
    pub multi_instance: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            display_mode_requests: true,
            model_context: false,
            multi_instance: false,
        }
    }
}

fn default_true() -> bool {
    true
}
