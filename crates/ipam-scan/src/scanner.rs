//! Subnet scan orchestration.
//!
//! Fans the hosts of one subnet out over a bounded set of tokio tasks. A
//! semaphore caps how many probes are in flight; join handles are awaited
//! in submission order so the output always matches the enumerator's order,
//! whatever order the probes finish in.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use ipam_core::HostProbeResult;
use tokio::sync::Semaphore;

use crate::probe::HostProber;
use crate::subnet::Subnet;

/// Probes in flight per subnet unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Scans one subnet at a time with a bounded worker pool.
#[derive(Clone)]
pub struct SubnetScanner {
    prober: HostProber,
    concurrency: usize,
}

impl SubnetScanner {
    pub fn new(prober: HostProber, concurrency: usize) -> Self {
        Self {
            prober,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Probe every host of `subnet`, returning one result per address in
    /// ascending address order.
    pub async fn scan(&self, subnet: &Subnet) -> Vec<HostProbeResult> {
        let start = Instant::now();
        let results = self.scan_addresses(subnet.hosts()).await;

        tracing::info!(
            subnet = %subnet,
            hosts = results.len(),
            reachable = results.iter().filter(|r| r.is_reachable()).count(),
            duration_ms = start.elapsed().as_millis(),
            "Subnet scan complete"
        );

        results
    }

    /// Probe `addresses`, preserving their order in the output.
    ///
    /// A probe task that panics yields an all-false result for its address.
    pub async fn scan_addresses(&self, addresses: Vec<IpAddr>) -> Vec<HostProbeResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(addresses.len());

        for address in &addresses {
            // Acquire before spawning so at most `concurrency` tasks exist.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Probe semaphore closed");
                    break;
                }
            };
            let prober = self.prober.clone();
            let address = *address;

            handles.push(tokio::spawn(async move {
                let result = prober.probe(address).await;
                drop(permit);
                result
            }));
        }

        let mut joined = join_all(handles).await.into_iter();

        addresses
            .into_iter()
            .map(|address| match joined.next() {
                Some(Ok(result)) => result,
                Some(Err(e)) => {
                    tracing::error!(address = %address, error = %e, "Probe task failed");
                    HostProbeResult::unreachable(address)
                }
                None => HostProbeResult::unreachable(address),
            })
            .collect()
    }
}
