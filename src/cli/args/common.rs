//! Common CLI types shared across commands

use clap::Args;

use crate::client::PollOptions;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - human-optimized rich formatting (default)
    #[default]
    Pretty,
    /// Table format - one row per entry
    Table,
    /// JSON format - structured for scripts
    Json,
}

/// Poll budget overrides for commands that wait on a task.
#[derive(Args, Debug, Default, Clone)]
pub struct PollArgs {
    /// Maximum number of polls before giving up
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Milliseconds between polls
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

impl PollArgs {
    /// Apply overrides on top of configured options
    pub fn apply(&self, base: PollOptions) -> PollOptions {
        PollOptions {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts).max(1),
            interval: self
                .interval_ms
                .map(std::time::Duration::from_millis)
                .unwrap_or(base.interval),
        }
    }
}
