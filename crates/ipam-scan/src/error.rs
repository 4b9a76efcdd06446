//! Error types for the ipam-scan crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid subnet {literal:?}: {reason}")]
    InvalidSubnet { literal: String, reason: String },

    #[error("Subnet {literal:?} has {hosts} hosts, over the limit of {limit}")]
    SubnetTooLarge {
        literal: String,
        hosts: u128,
        limit: u64,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Log format error: {0}")]
    Log(#[from] ipam_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
