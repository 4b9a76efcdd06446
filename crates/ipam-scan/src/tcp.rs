//! TCP connect checks.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::probe::PortChecker;

/// A port counts as open when a full TCP handshake completes in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnect;

#[async_trait]
impl PortChecker for TcpConnect {
    async fn is_open(&self, addr: IpAddr, port: u16, timeout: Duration) -> bool {
        let target = SocketAddr::new(addr, port);
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect(target)).await,
            Ok(Ok(_))
        )
    }
}
