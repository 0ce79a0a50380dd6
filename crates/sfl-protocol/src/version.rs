// SPDX-License-Identifier: MIT OR Apache-2.0
//! Protocol version parsing and compatibility checks.
//!
//! Versions look like `sfl/v0.1`. Two versions are compatible when the
//! prefix and major number match; the minor number may differ (newer minors
//! only add methods, and unknown methods are ignored by both sides).

use crate::ProtocolError;

/// A parsed `sfl/vMAJOR.MINOR` version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    /// Parse a version string of the form `sfl/v0.1`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let rest = raw
            .strip_prefix("sfl/v")
            .ok_or_else(|| ProtocolError::Violation(format!("bad version prefix: {raw}")))?;
        let (major, minor) = rest
            .split_once('.')
            .ok_or_else(|| ProtocolError::Violation(format!("bad version format: {raw}")))?;
        let major = major
            .parse()
            .map_err(|_| ProtocolError::Violation(format!("bad major version: {raw}")))?;
        let minor = minor
            .parse()
            .map_err(|_| ProtocolError::Violation(format!("bad minor version: {raw}")))?;
        Ok(Self { major, minor })
    }

    /// Whether a peer speaking `other` can interoperate with this version.
    #[must_use]
    pub fn compatible_with(self, other: Self) -> bool {
        self.major == other.major
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sfl/v{}.{}", self.major, self.minor)
    }
}

/// Check a host-reported version string against [`sfl_core::PROTOCOL_VERSION`].
///
/// An empty string passes: hosts predating version reporting are assumed
/// current. A malformed or major-mismatched string fails.
pub fn check_host_version(reported: &str) -> Result<(), ProtocolError> {
    if reported.is_empty() {
        return Ok(());
    }
    let ours = ProtocolVersion::parse(sfl_core::PROTOCOL_VERSION)?;
    let theirs = ProtocolVersion::parse(reported)?;
    if ours.compatible_with(theirs) {
        Ok(())
    } else {
        Err(ProtocolError::Violation(format!(
            "incompatible protocol version: host={theirs} client={ours}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_version() {
        let v = ProtocolVersion::parse(sfl_core::PROTOCOL_VERSION).unwrap();
        assert_eq!(v, ProtocolVersion { major: 0, minor: 1 });
        assert_eq!(v.to_string(), sfl_core::PROTOCOL_VERSION);
    }

    #[test]
    fn rejects_malformed_versions() {
        for raw in ["", "v0.1", "sfl/0.1", "sfl/vx.y", "sfl/v1"] {
            assert!(ProtocolVersion::parse(raw).is_err(), "{raw:?} parsed");
        }
    }

    #[test]
    fn minor_skew_is_compatible_major_skew_is_not() {
        let a = ProtocolVersion { major: 0, minor: 1 };
        let b = ProtocolVersion { major: 0, minor: 9 };
        let c = ProtocolVersion { major: 1, minor: 0 };
        assert!(a.compatible_with(b));
        assert!(!a.compatible_with(c));
    }

    #[test]
    fn empty_host_version_passes() {
        assert!(check_host_version("").is_ok());
        assert!(check_host_version(sfl_core::PROTOCOL_VERSION).is_ok());
        assert!(check_host_version("sfl/v9.0").is_err());
    }
}
