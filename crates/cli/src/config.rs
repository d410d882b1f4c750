//! Top-level CLI configuration.

use clap::Parser;

use crate::commands::Command;

/// Request-to-server mapping strategies: HRW and consistent hashing.
#[derive(Debug, Parser)]
#[command(name = "shardring", version, about)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Emit structured JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        self.command.run(self.json)
    }
}
