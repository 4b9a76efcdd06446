//! Subnet log files.
//!
//! One file per subnet, named after the subnet literal, holding one
//! `address,classification,hostname` line per host in scan order. There is
//! no header. The file is replaced wholesale on every run.
//!
//! The reading half mirrors what the log browser does with these files:
//! three-field lines only, grouped by /24, labelled from the filename.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use ipam_core::{classify, Classification, CoreError, HostProbeResult};

use crate::error::{Result, ScanError};
use crate::subnet::Subnet;

const LOG_EXTENSION: &str = ".log";

/// Log filename for a subnet literal: `.` → `-`, `/` → `_`, plus `.log`.
pub fn filename_for(literal: &str) -> String {
    format!(
        "{}{LOG_EXTENSION}",
        literal.replace('.', "-").replace('/', "_")
    )
}

/// Recover the subnet literal from a log filename.
pub fn subnet_label(filename: &str) -> String {
    let stem = filename.strip_suffix(LOG_EXTENSION).unwrap_or(filename);
    match stem.rsplit_once('_') {
        Some((addr, prefix)) => format!("{}/{prefix}", addr.replace('-', ".")),
        None => stem.replace('-', "."),
    }
}

/// Render one log line, without the trailing newline.
pub fn format_line(result: &HostProbeResult) -> String {
    format!("{},{},{}", result.address, classify(result), result.hostname)
}

/// Write (or overwrite) the log for `subnet` under `dir`.
///
/// Returns the path written. A failed write is not rolled back.
pub fn write_log(dir: &Path, subnet: &Subnet, results: &[HostProbeResult]) -> Result<PathBuf> {
    let path = dir.join(subnet.log_filename());

    write_lines(&path, results).map_err(|source| ScanError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        subnet = %subnet,
        path = %path.display(),
        lines = results.len(),
        "Subnet log written"
    );

    Ok(path)
}

fn write_lines(path: &Path, results: &[HostProbeResult]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for result in results {
        writeln!(writer, "{}", format_line(result))?;
    }
    writer.flush()
}

/// A line read back from a subnet log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: IpAddr,
    pub classification: Classification,
    pub hostname: String,
}

impl LogEntry {
    /// The /24 grouping key: the first three octets of an IPv4 address.
    pub fn slash24_prefix(&self) -> String {
        match self.address {
            IpAddr::V4(v4) => {
                let [a, b, c, _] = v4.octets();
                format!("{a}.{b}.{c}")
            }
            IpAddr::V6(v6) => v6.to_string(),
        }
    }

    pub fn is_not_use(&self) -> bool {
        self.classification == Classification::NotUse
    }
}

impl From<&HostProbeResult> for LogEntry {
    fn from(result: &HostProbeResult) -> Self {
        Self {
            address: result.address,
            classification: classify(result),
            hostname: result.hostname.clone(),
        }
    }
}

/// Parse a single `address,classification,hostname` line.
pub fn parse_line(line: &str) -> std::result::Result<LogEntry, CoreError> {
    let trimmed = line.trim_end_matches(&['\r', '\n'][..]);
    let fields: Vec<&str> = trimmed.split(',').collect();
    let [address, classification, hostname] = fields.as_slice() else {
        return Err(CoreError::MalformedLogLine(trimmed.to_string()));
    };

    let address = address
        .trim()
        .parse()
        .map_err(|_| CoreError::MalformedLogLine(trimmed.to_string()))?;

    Ok(LogEntry {
        address,
        classification: classification.trim().parse()?,
        hostname: hostname.trim().to_string(),
    })
}

/// Read every well-formed line of a subnet log, in file order.
///
/// Blank and malformed lines are skipped.
pub fn read_log(path: &Path) -> Result<Vec<LogEntry>> {
    let content = fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::debug!(path = %path.display(), line = lineno + 1, error = %e, "Skipping log line");
            }
        }
    }

    Ok(entries)
}

/// Group entries by /24 prefix, keeping first-seen group order and the
/// original order inside each group.
pub fn group_by_slash24(entries: &[LogEntry]) -> Vec<(String, Vec<&LogEntry>)> {
    let mut groups: Vec<(String, Vec<&LogEntry>)> = Vec::new();

    for entry in entries {
        let key = entry.slash24_prefix();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(entry),
            None => groups.push((key, vec![entry])),
        }
    }

    groups
}
