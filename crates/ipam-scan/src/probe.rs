//! Per-host probing.
//!
//! A probe gathers three signals for one address: ICMP reachability, the
//! configured signalling TCP ports, and (only for reachable hosts) the SNMP
//! sysName. Each signal sits behind a capability trait so the sweep can run
//! against fakes. A probe never fails: every network error downgrades its own
//! signal to "absent".

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ipam_core::{HostProbeResult, OsSignal, ProbeConfig, UNKNOWN_HOSTNAME};

use crate::ping::SystemPing;
use crate::snmp::SnmpResolver;
use crate::tcp::TcpConnect;

/// Answers "does this host respond to an echo request?".
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    async fn is_reachable(&self, addr: IpAddr, timeout: Duration) -> bool;
}

/// Answers "does this TCP port accept a connection?".
#[async_trait]
pub trait PortChecker: Send + Sync {
    async fn is_open(&self, addr: IpAddr, port: u16, timeout: Duration) -> bool;
}

/// Looks up a host's configured name. `None` means unresolved.
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    async fn resolve(&self, addr: IpAddr, config: &ProbeConfig) -> Option<String>;
}

/// Runs the three probe signals for one address at a time.
#[derive(Clone)]
pub struct HostProber {
    config: Arc<ProbeConfig>,
    ping: Arc<dyn ReachabilityChecker>,
    ports: Arc<dyn PortChecker>,
    resolver: Arc<dyn HostnameResolver>,
}

impl HostProber {
    pub fn new(
        config: ProbeConfig,
        ping: Arc<dyn ReachabilityChecker>,
        ports: Arc<dyn PortChecker>,
        resolver: Arc<dyn HostnameResolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            ping,
            ports,
            resolver,
        }
    }

    /// Prober backed by the OS ping utility, TCP connects, and SNMP v2c.
    pub fn system(config: ProbeConfig) -> Self {
        Self::new(
            config,
            Arc::new(SystemPing),
            Arc::new(TcpConnect),
            Arc::new(SnmpResolver::new()),
        )
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe a single address.
    ///
    /// Every configured port is tried, independently of the others. The
    /// hostname lookup is skipped entirely when no signal came back.
    pub async fn probe(&self, address: IpAddr) -> HostProbeResult {
        let timeout = self.config.timeout;
        let mut result = HostProbeResult::unreachable(address);

        result.ping_ok = self.ping.is_reachable(address, timeout).await;

        for (port, signal) in self.config.ports.iter() {
            if !self.ports.is_open(address, port, timeout).await {
                continue;
            }
            match signal {
                OsSignal::Linux => result.linux_port_open = true,
                OsSignal::Windows => result.windows_port_open = true,
            }
        }

        if result.is_reachable() {
            if let Some(name) = self
                .resolver
                .resolve(address, &self.config)
                .await
                .and_then(|raw| sanitize_hostname(&raw))
            {
                result.hostname = name;
            }
        }

        tracing::debug!(
            address = %address,
            ping = result.ping_ok,
            linux = result.linux_port_open,
            windows = result.windows_port_open,
            hostname = %result.hostname,
            "Host probed"
        );

        result
    }
}

/// Make a resolved name safe for a comma-separated log line.
///
/// Returns `None` for names that are empty after trimming.
pub fn sanitize_hostname(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_HOSTNAME {
        return None;
    }
    Some(
        trimmed
            .chars()
            .map(|c| if matches!(c, ',' | '\r' | '\n') { '_' } else { c })
            .collect(),
    )
}
