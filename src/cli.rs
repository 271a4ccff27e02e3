//! Command-line flags. Each flag overrides the matching environment variable.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "lp-agent",
    about = "Reserve-watching trading agent for a single token/native pool"
)]
pub struct Cli {
    /// Run a single cycle and exit.
    #[arg(long)]
    pub once: bool,

    /// Read and size trades but never submit transactions.
    #[arg(long)]
    pub dry_run: bool,

    /// Path of the persisted trade state.
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Path whose presence stops the agent before its next cycle.
    #[arg(long)]
    pub stop_flag: Option<PathBuf>,

    /// Seconds between the end of one cycle and the start of the next.
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

impl Cli {
    /// Value a flag contributes for an environment key, if any.
    pub fn env_override(&self, key: &str) -> Option<String> {
        match key {
            "DRY_RUN" if self.dry_run => Some("true".into()),
            "STATE_FILE" => self.state_file.as_ref().map(|p| p.display().to_string()),
            "STOP_FLAG" => self.stop_flag.as_ref().map(|p| p.display().to_string()),
            "CYCLE_INTERVAL_SECS" => self.interval_secs.map(|s| s.to_string()),
            _ => None,
        }
    }
}
