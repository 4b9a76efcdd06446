//! ipam-core: Shared types for the ipam subnet sweep.
//!
//! This crate provides the pieces every sweep component agrees on:
//! - Probe results and the OS signals a port stands for
//! - The five-way host classification and its priority rules
//! - Probe configuration (port table, timeouts, SNMP credentials)
//! - Common error types

pub mod classify;
pub mod config;
pub mod error;
pub mod types;

pub use classify::classify;
pub use config::{PortOsMapping, ProbeConfig};
pub use error::CoreError;
pub use types::{Classification, HostProbeResult, OsSignal, UNKNOWN_HOSTNAME};
