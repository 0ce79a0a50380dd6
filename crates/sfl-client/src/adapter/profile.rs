//! Channel-family profiles: the generic feature set and known richer
//! vendors.
//!
//! Some channel hosts expose extra capabilities (multi-instance tracking,
//! window titling, model-context push) that are only discoverable after the
//! handshake, via the user-agent string in the host context. The facade
//! reconnects with a vendor profile when one matches.

use sfl_core::{AdapterCapabilities, HostEnvironment};

/// Identity and capability set of one channel-family host flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelProfile {
    /// Short identifier, used in logs.
    pub name: &'static str,

    pub environment: HostEnvironment,

    pub capabilities: AdapterCapabilities,
}

impl ChannelProfile {
    /// The profile every channel connection starts with.
    #[must_use]
    pub const fn generic() -> Self {
        Self {
            name: "channel",
            environment: HostEnvironment::Channel,
            capabilities: AdapterCapabilities::channel_generic(),
        }
    }

    /// The hyperchat vendor: full capability set.
    #[must_use]
    pub const fn hyperchat() -> Self {
        Self {
            name: "hyperchat",
            environment: HostEnvironment::VendorChannel,
            capabilities: AdapterCapabilities::channel_vendor(),
        }
    }
}

/// Match a handshake-reported user-agent string against known richer
/// vendors. `None` means: stay on the generic profile.
#[must_use]
pub fn refine_from_user_agent(user_agent: &str) -> Option<ChannelProfile> {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("hyperchat") {
        Some(ChannelProfile::hyperchat())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_profile_has_context_only() {
        let p = ChannelProfile::generic();
        assert_eq!(p.environment, HostEnvironment::Channel);
        assert!(p.capabilities.host_context);
        assert!(!p.capabilities.multi_instance);
    }

    #[test]
    fn hyperchat_user_agent_refines() {
        let p = refine_from_user_agent("Hyperchat/3.2 (embedded; darwin)").unwrap();
        assert_eq!(p.name, "hyperchat");
        assert_eq!(p.environment, HostEnvironment::VendorChannel);
        assert!(p.capabilities.title_mutation);
    }

    #[test]
    fn unknown_user_agents_stay_generic() {
        assert!(refine_from_user_agent("").is_none());
        assert!(refine_from_user_agent("SomeBrowser/1.0").is_none());
    }
}
