//! Configuration for the ipam-scan sweep.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::FileFormat;
use ipam_core::config::{DEFAULT_SNMP_COMMUNITY, DEFAULT_SNMP_PORT};
use ipam_core::{PortOsMapping, ProbeConfig};
use serde::Deserialize;

use crate::error::{Result, ScanError};
use crate::scanner::DEFAULT_CONCURRENCY;

/// Top-level sweep configuration.
///
/// Loaded from a `key=value` file (default `config.txt`) and then
/// `IPAM_`-prefixed environment variables. Only the log directory is
/// required.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Directory the per-subnet logs are written to.
    #[serde(default, alias = "logdir")]
    pub log_dir: Option<String>,

    /// Batch input: one subnet literal per line, or `-` for stdin.
    #[serde(default = "default_input")]
    pub input: String,

    /// Maximum probes in flight within one subnet.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout for each individual network signal.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_snmp_community")]
    pub snmp_community: String,

    #[serde(default = "default_snmp_port")]
    pub snmp_port: u16,

    /// Subnets with more usable hosts than this are skipped. Unset means
    /// no limit.
    #[serde(default)]
    pub max_hosts_per_subnet: Option<u64>,
}

impl ScanConfig {
    /// Load configuration from `path` (if it exists) and the environment.
    ///
    /// `.txt` and `.ini` files are read as INI so a plain `logdir=/var/ipam`
    /// line works; other extensions are inferred by the `config` crate.
    pub fn load(path: &Path) -> Result<Self> {
        let name = path.to_string_lossy();
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("txt") | Some("ini") => config::File::new(&name, FileFormat::Ini),
            _ => config::File::with_name(&name),
        };

        let cfg = config::Config::builder()
            .add_source(file.required(false))
            .add_source(
                config::Environment::with_prefix("IPAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ScanError::Config(e.to_string()))?;

        cfg.try_deserialize::<ScanConfig>()
            .map_err(|e| ScanError::Config(e.to_string()))
    }

    /// The log directory, or a config error if it was never set.
    pub fn log_dir(&self) -> Result<PathBuf> {
        match self.log_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => Err(ScanError::Config(
                "logdir is not set (config file, IPAM_LOGDIR, or --log-dir)".to_string(),
            )),
        }
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            ports: PortOsMapping::default(),
            timeout: Duration::from_millis(self.timeout_ms),
            snmp_community: self.snmp_community.clone(),
            snmp_port: self.snmp_port,
        }
    }
}

fn default_input() -> String {
    "input.txt".to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_snmp_community() -> String {
    DEFAULT_SNMP_COMMUNITY.to_string()
}

fn default_snmp_port() -> u16 {
    DEFAULT_SNMP_PORT
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            input: default_input(),
            concurrency: default_concurrency(),
            timeout_ms: default_timeout_ms(),
            snmp_community: default_snmp_community(),
            snmp_port: default_snmp_port(),
            max_hosts_per_subnet: None,
        }
    }
}
