//! CLI driver for the sharding strategies.
//!
//! Provides commands for:
//! - Routing a batch of keys over an HRW pool and printing the distribution
//! - Building a consistent-hash ring, routing keys, and exercising churn
//!
//! Everything here is presentation: the core returns structured values and
//! this crate renders them.

pub mod commands;
pub mod config;

pub use commands::Command;
pub use config::CliConfig;
