//! ICMP reachability via the operating system's `ping` utility.
//!
//! Runs `ping` as a child process via `tokio::process::Command` so raw
//! sockets (and the privileges they need) are not required.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::probe::ReachabilityChecker;

/// Grace period on top of the ping timeout for process start-up and exit.
const SPAWN_GRACE: Duration = Duration::from_millis(500);

/// Sends one echo request through the system `ping` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPing;

#[async_trait]
impl ReachabilityChecker for SystemPing {
    async fn is_reachable(&self, addr: IpAddr, timeout: Duration) -> bool {
        let mut cmd = Command::new("ping");
        cmd.args(ping_args(addr, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout + SPAWN_GRACE, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(address = %addr, error = %e, "Failed to spawn ping");
                false
            }
            Err(_) => false,
        }
    }
}

/// Arguments for a single echo request bounded by `timeout`.
pub fn ping_args(addr: IpAddr, timeout: Duration) -> Vec<String> {
    let secs = timeout.as_secs().max(1).to_string();
    let mut args: Vec<String> = if cfg!(windows) {
        vec![
            "-n".into(),
            "1".into(),
            "-w".into(),
            timeout.as_millis().max(1).to_string(),
        ]
    } else if cfg!(target_os = "macos") {
        vec!["-c".into(), "1".into(), "-t".into(), secs]
    } else {
        vec!["-c".into(), "1".into(), "-W".into(), secs]
    };

    if addr.is_ipv6() && cfg!(target_os = "linux") {
        args.insert(0, "-6".into());
    }
    args.push(addr.to_string());
    args
}
