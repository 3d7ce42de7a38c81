//! Global CLI options shared across all commands
//!
//! Centralizes the global flags so handlers take one parameter instead of
//! several.

use clap::ValueEnum;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// For most options, the precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; config file defaults are resolved later in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json); `None` defers to the config file
    pub format: Option<OutputFormat>,

    /// Custom config file path (defaults to ~/.solvecam/config.yaml)
    pub config: Option<String>,

    /// Custom API host for development/testing
    pub api_host: Option<String>,

    /// Serve built-in fixture data instead of calling the backend
    pub fixtures: bool,

    /// Bypass cache and fetch fresh data from API
    pub no_cache: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            api_host: cli.api_host.clone(),
            fixtures: cli.fixtures,
            no_cache: cli.no_cache,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get API host override as `Option<&str>`.
    pub fn api_host_ref(&self) -> Option<&str> {
        self.api_host.as_deref()
    }

    /// Resolve the output format: flag, then config preference, then pretty.
    pub fn resolve_format(&self, config: &Config) -> OutputFormat {
        if let Some(format) = self.format {
            return format;
        }

        match config.preferences.format.as_deref() {
            Some(name) => OutputFormat::from_str(name, true).unwrap_or_else(|_| {
                log::warn!("Ignoring unknown format preference '{}'", name);
                OutputFormat::default()
            }),
            None => OutputFormat::default(),
        }
    }
}
