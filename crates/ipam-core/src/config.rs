//! Probe configuration.
//!
//! A [`ProbeConfig`] is built once per run and handed to every probe. Nothing
//! in it changes while a sweep is in progress.

use std::time::Duration;

use crate::types::OsSignal;

/// Per-signal network timeout. No probe step retries.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// SNMP v2c community used for sysName lookups.
pub const DEFAULT_SNMP_COMMUNITY: &str = "dvcadmin";

pub const DEFAULT_SNMP_PORT: u16 = 161;

/// Ordered table of TCP ports and the OS family each one signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOsMapping {
    entries: Vec<(u16, OsSignal)>,
}

impl PortOsMapping {
    pub fn new(entries: Vec<(u16, OsSignal)>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, OsSignal)> + '_ {
        self.entries.iter().copied()
    }

    pub fn signal_for(&self, port: u16) -> Option<OsSignal> {
        self.iter().find(|(p, _)| *p == port).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PortOsMapping {
    /// SSH marks Linux; RDP and the kubelet port mark Windows.
    fn default() -> Self {
        Self::new(vec![
            (22, OsSignal::Linux),
            (3389, OsSignal::Windows),
            (10250, OsSignal::Windows),
        ])
    }
}

/// Everything a single host probe needs to know.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub ports: PortOsMapping,
    pub timeout: Duration,
    pub snmp_community: String,
    pub snmp_port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ports: PortOsMapping::default(),
            timeout: DEFAULT_TIMEOUT,
            snmp_community: DEFAULT_SNMP_COMMUNITY.to_string(),
            snmp_port: DEFAULT_SNMP_PORT,
        }
    }
}
