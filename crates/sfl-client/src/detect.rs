//! Environment detection.
//!
//! Classification happens exactly once, at the boundary: everything
//! downstream receives an already-resolved [`HostEnvironment`] and never
//! re-detects.

use crate::adapter::BridgeHandle;
use crate::transport::ChannelTransport;
use sfl_core::HostEnvironment;
use std::fmt;
use std::sync::Arc;

/// What the embedding context actually provides, probed by the embedder and
/// handed to [`crate::SurfaceClient::create`].
#[derive(Clone, Default)]
pub struct HostDiscovery {
    /// A synchronously-available global bridge object, when one exists.
    pub bridge: Option<Arc<dyn BridgeHandle>>,

    /// A messaging channel to a distinct parent context, when one exists.
    pub parent_channel: Option<Arc<dyn ChannelTransport>>,
}

impl HostDiscovery {
    /// No host at all.
    #[must_use]
    pub fn standalone() -> Self {
        Self::default()
    }

    /// A bridge-family embedding.
    #[must_use]
    pub fn with_bridge(bridge: Arc<dyn BridgeHandle>) -> Self {
        Self {
            bridge: Some(bridge),
            ..Self::default()
        }
    }

    /// A channel-family embedding.
    #[must_use]
    pub fn with_channel(transport: Arc<dyn ChannelTransport>) -> Self {
        Self {
            parent_channel: Some(transport),
            ..Self::default()
        }
    }
}

impl fmt::Debug for HostDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostDiscovery")
            .field("bridge", &self.bridge.is_some())
            .field("parent_channel", &self.parent_channel.is_some())
            .finish()
    }
}

/// Classify the execution context. Pure, synchronous, idempotent.
///
/// Priority order: a bridge object wins over a parent channel; a parent
/// channel wins over standalone. Never returns
/// [`HostEnvironment::VendorChannel`]; vendor refinement is a facade
/// concern, resolved only after the handshake reveals the user agent.
#[must_use]
pub fn detect_environment(discovery: &HostDiscovery) -> HostEnvironment {
    if discovery.bridge.is_some() {
        HostEnvironment::Bridge
    } else if discovery.parent_channel.is_some() {
        HostEnvironment::Channel
    } else {
        HostEnvironment::Standalone
    }
}
