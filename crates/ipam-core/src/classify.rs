//! Host classification.

use crate::types::{Classification, HostProbeResult};

/// Map a probe result to its log category.
///
/// Only the three reachability signals participate; the hostname never does.
pub fn classify(result: &HostProbeResult) -> Classification {
    Classification::from_signals(
        result.linux_port_open,
        result.windows_port_open,
        result.ping_ok,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(linux: bool, windows: bool, ping: bool) -> HostProbeResult {
        HostProbeResult {
            address: "192.168.1.10".parse().unwrap(),
            linux_port_open: linux,
            windows_port_open: windows,
            ping_ok: ping,
            hostname: "host-a".to_string(),
        }
    }

    #[test]
    fn test_priority_table() {
        let cases = [
            ((true, true, true), Classification::Both),
            ((true, true, false), Classification::Both),
            ((true, false, true), Classification::Linux),
            ((true, false, false), Classification::Linux),
            ((false, true, true), Classification::Windows),
            ((false, true, false), Classification::Windows),
            ((false, false, true), Classification::Ping),
            ((false, false, false), Classification::NotUse),
        ];

        for ((linux, windows, ping), expected) in cases {
            assert_eq!(
                classify(&result(linux, windows, ping)),
                expected,
                "linux={linux} windows={windows} ping={ping}"
            );
        }
    }

    #[test]
    fn test_every_category_is_reachable() {
        let mut seen = Vec::new();
        for bits in 0u8..8 {
            let class = Classification::from_signals(bits & 4 != 0, bits & 2 != 0, bits & 1 != 0);
            if !seen.contains(&class) {
                seen.push(class);
            }
        }
        assert_eq!(seen.len(), Classification::ALL.len());
    }

    #[test]
    fn test_hostname_does_not_participate() {
        let mut a = result(false, true, true);
        let mut b = a.clone();
        a.hostname = "Unknown".to_string();
        b.hostname = "dc01.corp".to_string();
        assert_eq!(classify(&a), classify(&b));
    }
}
