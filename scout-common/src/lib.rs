//! # Scout Common Library
//!
//! Shared code for the scout binaries and tests:
//! - Account identity parsing and canonical keys
//! - Rank scale (tier/division ordering and range checks)
//! - Duration parsing and compact display
//! - Structured log sink shared by the CLI and HTTP layers
//! - Configuration file loading

pub mod config;
pub mod error;
pub mod human_time;
pub mod identity;
pub mod log_sink;
pub mod rank;

pub use error::{Error, Result};
pub use identity::Identity;
pub use log_sink::{LogEntry, LogKind, LogSink};
pub use rank::{Division, RankBound, RankInfo, Tier};
