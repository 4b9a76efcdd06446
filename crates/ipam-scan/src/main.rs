//! CLI entry point for the ipam-scan subnet sweep.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ipam_scan::batch::run_batch;
use ipam_scan::config::ScanConfig;
use ipam_scan::probe::HostProber;
use ipam_scan::scanner::SubnetScanner;

#[derive(Parser)]
#[command(name = "ipam-scan")]
#[command(about = "Sweep subnets, classify hosts by OS signal, and write per-subnet logs")]
struct Cli {
    /// Config file (key=value for .txt/.ini, otherwise by extension).
    #[arg(short, long, default_value = "config.txt")]
    config: PathBuf,

    /// Override the log directory from the config file.
    #[arg(short, long)]
    log_dir: Option<String>,

    /// Batch input file with one subnet per line, or `-` for stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Maximum probes in flight within one subnet.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the batch report as JSON on stdout when the run finishes.
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ScanConfig::load(&cli.config)?;

    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }

    let log_dir = config.log_dir()?;
    let prober = HostProber::system(config.probe_config());
    let scanner = SubnetScanner::new(prober, config.concurrency);

    let report = run_batch(
        &config.input,
        &log_dir,
        scanner,
        config.max_hosts_per_subnet,
    )
    .await?;

    if report.has_failures() {
        tracing::warn!(
            skipped = report.skipped.len(),
            failed_writes = report.failed_writes.len(),
            "Batch finished with per-subnet failures"
        );
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
