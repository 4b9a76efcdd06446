//! Subnet enumeration.
//!
//! Literals are parsed non-strictly: `10.0.0.77/24` is accepted and means the
//! same network as `10.0.0.0/24`. A bare address is treated as a single-host
//! network. The literal itself is kept verbatim (trimmed) because the log
//! filename is derived from it.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{Result, ScanError};
use crate::logfile;

/// A parsed CIDR literal from the batch input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    literal: String,
    net: IpNet,
}

impl Subnet {
    /// Parse a literal. Only malformed literals are rejected.
    pub fn parse(literal: &str) -> Result<Self> {
        let trimmed = literal.trim();
        let invalid = |reason: String| ScanError::InvalidSubnet {
            literal: literal.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("empty literal".to_string()));
        }

        let net = if trimmed.contains('/') {
            trimmed
                .parse::<IpNet>()
                .map_err(|e| invalid(e.to_string()))?
        } else {
            let addr = trimmed
                .parse::<IpAddr>()
                .map_err(|e| invalid(e.to_string()))?;
            let max_prefix = if addr.is_ipv4() { 32 } else { 128 };
            IpNet::new(addr, max_prefix).map_err(|e| invalid(e.to_string()))?
        };

        Ok(Self {
            literal: trimmed.to_string(),
            net,
        })
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// The network with host bits cleared.
    pub fn network(&self) -> IpNet {
        self.net.trunc()
    }

    /// Number of addresses [`Subnet::hosts`] yields.
    pub fn host_count(&self) -> u128 {
        match self.net {
            IpNet::V4(net) => {
                let total = 1u128 << (32 - u32::from(net.prefix_len()));
                if net.prefix_len() < 31 {
                    total - 2
                } else {
                    total
                }
            }
            IpNet::V6(net) => {
                let total = 1u128
                    .checked_shl(128 - u32::from(net.prefix_len()))
                    .unwrap_or(u128::MAX);
                if net.prefix_len() < 127 {
                    total - 1
                } else {
                    total
                }
            }
        }
    }

    /// Usable host addresses in ascending order.
    ///
    /// IPv4 excludes the network and broadcast addresses except for /31 and
    /// /32. IPv6 excludes the subnet-router anycast address except for /127
    /// and /128.
    pub fn hosts(&self) -> Vec<IpAddr> {
        match self.net {
            IpNet::V4(net) => net.hosts().map(IpAddr::V4).collect(),
            IpNet::V6(net) => {
                let skip = usize::from(net.prefix_len() < 127);
                net.hosts().skip(skip).map(IpAddr::V6).collect()
            }
        }
    }

    /// Log filename for this subnet, e.g. `192-168-1-0_24.log`.
    pub fn log_filename(&self) -> String {
        logfile::filename_for(&self.literal)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Expand a CIDR literal into its usable host addresses.
pub fn expand(literal: &str) -> Result<Vec<IpAddr>> {
    Ok(Subnet::parse(literal)?.hosts())
}
