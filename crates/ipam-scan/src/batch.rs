//! Batch execution.
//!
//! Reads the ordered list of subnet literals, then runs
//! enumerate → scan → classify → write for each one, strictly one subnet at
//! a time. A bad literal or a failed log write is recorded and the batch
//! moves on; only configuration problems stop a run, and those are caught
//! before any scanning starts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use crate::error::{Result, ScanError};
use crate::logfile;
use crate::scanner::SubnetScanner;
use crate::subnet::Subnet;

/// Batch source name that means "read from stdin".
pub const STDIN_SOURCE: &str = "-";

/// Subnet literals from batch text: trimmed, blank and `#` lines dropped.
pub fn parse_batch(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Read the batch from a file, or from stdin when `source` is `-`.
pub async fn read_batch(source: &str) -> Result<Vec<String>> {
    let text = if source == STDIN_SOURCE {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .map_err(|e| ScanError::Config(format!("Cannot read batch from stdin: {e}")))?;
        buf
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| ScanError::Config(format!("Cannot read batch input {source}: {e}")))?
    };
    Ok(parse_batch(&text))
}

/// Create the log directory if needed and make sure files can be written
/// into it.
pub fn prepare_log_dir(dir: &Path) -> Result<PathBuf> {
    let unusable =
        |e: std::io::Error| ScanError::Config(format!("Log directory {} unusable: {e}", dir.display()));

    fs::create_dir_all(dir).map_err(unusable)?;

    let probe = dir.join(format!(".ipam-write-check-{}", Uuid::new_v4()));
    fs::write(&probe, b"").map_err(unusable)?;
    fs::remove_file(&probe).map_err(unusable)?;

    Ok(dir.to_path_buf())
}

/// A batch entry that produced no log, and why.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedEntry {
    pub literal: String,
    pub reason: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Logs written, in batch order.
    pub written: Vec<PathBuf>,
    /// Literals that could not be parsed as a subnet.
    pub skipped: Vec<FailedEntry>,
    /// Subnets that were scanned but whose log could not be written.
    pub failed_writes: Vec<FailedEntry>,
}

impl BatchReport {
    fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            written: Vec::new(),
            skipped: Vec::new(),
            failed_writes: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.skipped.is_empty() || !self.failed_writes.is_empty()
    }
}

/// Drives the sweep over an ordered batch of subnets.
pub struct BatchRunner {
    scanner: SubnetScanner,
    log_dir: PathBuf,
    max_hosts: Option<u64>,
}

impl BatchRunner {
    pub fn new(scanner: SubnetScanner, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            scanner,
            log_dir: log_dir.into(),
            max_hosts: None,
        }
    }

    /// Skip subnets with more than `max_hosts` usable hosts. `None` scans
    /// every subnet regardless of size.
    pub fn with_max_hosts(mut self, max_hosts: Option<u64>) -> Self {
        self.max_hosts = max_hosts;
        self
    }

    /// Parse a batch entry and apply the host-count limit, if any.
    fn subnet_for(&self, literal: &str) -> Result<Subnet> {
        let subnet = Subnet::parse(literal)?;
        match self.max_hosts {
            Some(limit) if subnet.host_count() > u128::from(limit) => {
                Err(ScanError::SubnetTooLarge {
                    literal: subnet.literal().to_string(),
                    hosts: subnet.host_count(),
                    limit,
                })
            }
            _ => Ok(subnet),
        }
    }

    /// Process `literals` in order. Never stops early.
    pub async fn run(&self, literals: &[String]) -> BatchReport {
        let mut report = BatchReport::start();

        tracing::info!(
            run_id = %report.run_id,
            subnets = literals.len(),
            log_dir = %self.log_dir.display(),
            concurrency = self.scanner.concurrency(),
            "Batch started"
        );

        for literal in literals {
            let subnet = match self.subnet_for(literal) {
                Ok(subnet) => subnet,
                Err(e) => {
                    tracing::warn!(subnet = %literal, error = %e, "Skipping batch entry");
                    report.skipped.push(FailedEntry {
                        literal: literal.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            tracing::info!(subnet = %subnet, hosts = %subnet.host_count(), "Scanning subnet");
            let results = self.scanner.scan(&subnet).await;

            match logfile::write_log(&self.log_dir, &subnet, &results) {
                Ok(path) => report.written.push(path),
                Err(e) => {
                    tracing::error!(subnet = %subnet, error = %e, "Failed to write subnet log");
                    report.failed_writes.push(FailedEntry {
                        literal: subnet.literal().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Some(Utc::now());

        tracing::info!(
            run_id = %report.run_id,
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed_writes = report.failed_writes.len(),
            "Batch complete"
        );

        report
    }
}

/// Read the batch, prepare the log directory, then run every subnet.
///
/// Fails only for configuration problems, before any probe is sent.
pub async fn run_batch(
    source: &str,
    log_dir: &Path,
    scanner: SubnetScanner,
    max_hosts: Option<u64>,
) -> Result<BatchReport> {
    let literals = read_batch(source).await?;
    let log_dir = prepare_log_dir(log_dir)?;

    let runner = BatchRunner::new(scanner, log_dir).with_max_hosts(max_hosts);
    Ok(runner.run(&literals).await)
}
