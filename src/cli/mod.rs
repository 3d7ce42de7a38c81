//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
pub use clap_complete::Shell;

pub mod analyze;
pub mod args;
pub mod auth;
pub mod cache;
pub mod completions;
pub mod context;
pub mod ocr;
pub mod progress;
pub mod status;
pub mod task;

pub use args::{OutputFormat, PollArgs};
pub use context::CommandContext;

/// SolveCam CLI - snap a question, get the steps
#[derive(Parser, Debug)]
#[command(name = "solvecam")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "SOLVECAM_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "SOLVECAM_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the API host (e.g. http://localhost:3000)
    #[arg(long, global = true, env = "SOLVECAM_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Use built-in fixture data instead of the backend
    #[arg(long, global = true, env = "SOLVECAM_FIXTURES", hide_env = true)]
    pub fixtures: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "SOLVECAM_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass cache, fetch fresh data from API
    #[arg(long, global = true, env = "SOLVECAM_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in to SolveCam
    Login {
        /// Username (prompted when omitted)
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long, env = "SOLVECAM_PASSWORD", hide_env = true)]
        password: Option<String>,
    },

    /// Create a SolveCam account and sign in
    Register {
        /// Username (prompted when omitted)
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Email address
        #[arg(long, short = 'e')]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long, env = "SOLVECAM_PASSWORD", hide_env = true)]
        password: Option<String>,
    },

    /// Sign out and remove the stored credential
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show configuration, credential and cache status
    Status,

    /// Display version information
    Version,

    /// Recognize the question in an image
    #[command(after_help = "EXAMPLES:\n  \
            solvecam ocr question.png                  # Upload and wait for the text\n  \
            solvecam ocr question.png --no-wait        # Print the task ID and exit\n  \
            solvecam ocr question.jpg --format json    # JSON for scripting")]
    Ocr {
        /// Image file (png, jpg, jpeg, webp, heic, bmp)
        image: PathBuf,

        /// Submit only; print the task ID without polling
        #[arg(long)]
        no_wait: bool,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Get a step-by-step solution
    #[command(
        group(ArgGroup::new("source").required(true).args(["image", "text", "ocr_task"])),
        after_help = "EXAMPLES:\n  \
            solvecam analyze --image question.png            # OCR, then solve\n  \
            solvecam analyze --text \"2x+5=15\" --subject math  # Solve typed text\n  \
            solvecam analyze --ocr-task t1                   # Solve a finished OCR task"
    )]
    Analyze {
        /// Recognize this image first, then analyze the text
        #[arg(long, short = 'i')]
        image: Option<PathBuf>,

        /// Question text to analyze
        #[arg(long, short = 't')]
        text: Option<String>,

        /// Reuse the result of a completed OCR task
        #[arg(long)]
        ocr_task: Option<String>,

        /// Subject hint (e.g. math, physics)
        #[arg(long, short = 's')]
        subject: Option<String>,

        /// Grade hint (e.g. 7)
        #[arg(long, short = 'g')]
        grade: Option<String>,

        /// Extra note for the solver
        #[arg(long, short = 'n')]
        note: Option<String>,

        /// Submit only; print the task ID without polling
        #[arg(long)]
        no_wait: bool,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Check on a submitted task
    #[command(after_help = "EXAMPLES:\n  \
            solvecam task ocr t1             # One poll\n  \
            solvecam task analysis q1 --wait # Poll until finished")]
    Task {
        /// Kind of task
        #[arg(value_enum)]
        kind: TaskKind,

        /// Task ID returned on submission
        task_id: String,

        /// Keep polling until the task finishes
        #[arg(long, short = 'w')]
        wait: bool,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Manage local response cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    #[command(after_help = "\
  bash:   solvecam completion bash > /etc/bash_completion.d/solvecam
  zsh:    solvecam completion zsh > \"${fpath[1]}/_solvecam\"
  fish:   solvecam completion fish > ~/.config/fish/completions/solvecam.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Kinds of server-side task
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskKind {
    /// Image OCR task
    Ocr,
    /// Question analysis task
    Analysis,
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Clear all cached data
    Clear,

    /// Print cache directory path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_requires_a_source() {
        assert!(Cli::try_parse_from(["solvecam", "analyze"]).is_err());
        assert!(
            Cli::try_parse_from(["solvecam", "analyze", "--text", "x", "--ocr-task", "t1"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["solvecam", "analyze", "--text", "2x+5=15", "-s", "math"])
            .unwrap();
        match cli.command {
            Commands::Analyze { text, subject, .. } => {
                assert_eq!(text.as_deref(), Some("2x+5=15"));
                assert_eq!(subject.as_deref(), Some("math"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "solvecam",
            "task",
            "ocr",
            "t1",
            "--fixtures",
            "--format",
            "json",
            "--max-attempts",
            "3",
        ])
        .unwrap();

        assert!(cli.fixtures);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Task {
                kind, task_id, poll, ..
            } => {
                assert_eq!(kind, TaskKind::Ocr);
                assert_eq!(task_id, "t1");
                assert_eq!(poll.max_attempts, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
