//! Core domain types for the ipam subnet sweep.
//!
//! A sweep produces one [`HostProbeResult`] per host address. Each result is
//! reduced to a [`Classification`] before it is written to the subnet log.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Hostname recorded when SNMP resolution was skipped or failed.
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

// ── OS Signals ────────────────────────────────────────────────────

/// The operating-system family an open port hints at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsSignal {
    Linux,
    Windows,
}

// ── Probe Results ─────────────────────────────────────────────────

/// Raw signals gathered for a single host address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProbeResult {
    pub address: IpAddr,
    pub linux_port_open: bool,
    pub windows_port_open: bool,
    pub ping_ok: bool,
    pub hostname: String,
}

impl HostProbeResult {
    /// A result with every reachability signal absent.
    pub fn unreachable(address: IpAddr) -> Self {
        Self {
            address,
            linux_port_open: false,
            windows_port_open: false,
            ping_ok: false,
            hostname: UNKNOWN_HOSTNAME.to_string(),
        }
    }

    /// True if the host answered ping or has any signalling port open.
    pub fn is_reachable(&self) -> bool {
        self.ping_ok || self.linux_port_open || self.windows_port_open
    }

    pub fn any_port_open(&self) -> bool {
        self.linux_port_open || self.windows_port_open
    }
}

// ── Classification ────────────────────────────────────────────────

/// Per-host category written to the subnet log.
///
/// The textual forms (`BOTH`, `Linux`, `Windows`, `ping`, `NOTuse`) are part
/// of the log file contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "BOTH")]
    Both,
    Linux,
    Windows,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "NOTuse")]
    NotUse,
}

impl Classification {
    /// All categories in descending priority.
    pub const ALL: [Classification; 5] = [
        Classification::Both,
        Classification::Linux,
        Classification::Windows,
        Classification::Ping,
        Classification::NotUse,
    ];

    /// Resolve the three reachability signals into one category.
    ///
    /// Priority is BOTH > Linux > Windows > ping > NOTuse.
    pub fn from_signals(linux: bool, windows: bool, ping: bool) -> Self {
        match (linux, windows, ping) {
            (true, true, _) => Self::Both,
            (true, false, _) => Self::Linux,
            (false, true, _) => Self::Windows,
            (false, false, true) => Self::Ping,
            (false, false, false) => Self::NotUse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "BOTH",
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Ping => "ping",
            Self::NotUse => "NOTuse",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownClassification(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_text_roundtrip() {
        for class in Classification::ALL {
            let parsed: Classification = class.to_string().parse().unwrap();
            assert_eq!(parsed, class);
        }
    }

    #[test]
    fn classification_parse_is_case_sensitive() {
        assert_eq!(
            "notuse".parse::<Classification>(),
            Err(CoreError::UnknownClassification("notuse".to_string()))
        );
        assert!("Ping".parse::<Classification>().is_err());
    }

    #[test]
    fn classification_serializes_log_spelling() {
        let json = serde_json::to_string(&Classification::NotUse).unwrap();
        assert_eq!(json, "\"NOTuse\"");

        let json = serde_json::to_string(&Classification::Both).unwrap();
        assert_eq!(json, "\"BOTH\"");
    }

    #[test]
    fn unreachable_result_has_no_signals() {
        let result = HostProbeResult::unreachable("10.0.0.7".parse().unwrap());
        assert!(!result.is_reachable());
        assert!(!result.any_port_open());
        assert_eq!(result.hostname, UNKNOWN_HOSTNAME);
    }
}
