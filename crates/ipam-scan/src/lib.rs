//! ipam-scan: One-shot subnet sweep.
//!
//! Expands each subnet of a batch into host addresses, probes every host
//! (ping, signalling TCP ports, SNMP sysName), classifies the results, and
//! overwrites one log file per subnet for the downstream browser.

pub mod batch;
pub mod config;
pub mod error;
pub mod logfile;
pub mod ping;
pub mod probe;
pub mod scanner;
pub mod snmp;
pub mod subnet;
pub mod tcp;
