//! Status command implementation

use colored::Colorize;

use crate::cache::{CacheStorage, CacheTtl};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{FileCredentialStore, TokenStore, data_source};
use crate::config::{Config, DataSource};
use crate::error::Result;
use crate::output;

/// Run the status command to display configuration status
///
/// Makes no network calls; everything shown is local state.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = Config::resolve_path(opts.config_ref())?;
    let found = config_path.exists();
    let mut config = Config::load_or_default_at(opts.config_ref())?;
    if let Some(host) = opts.api_host_ref() {
        config.api_host = host.trim_end_matches('/').to_string();
    }

    let source = data_source(&config, opts.fixtures);
    let credential_dir = Config::state_dir(opts.config_ref())?;
    let credentials = FileCredentialStore::in_dir(&credential_dir);
    let credential_path = credentials.path().display().to_string();
    let signed_in = TokenStore::new(Box::new(credentials)).has().await;
    let cache_dir = CacheStorage::cache_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if opts.resolve_format(&config) == OutputFormat::Json {
        return output::print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "config_found": found,
            "api_host": config.api_host,
            "data_source": source,
            "timeout_secs": config.timeout_secs,
            "retry": config.retry,
            "polling": config.polling,
            "signed_in": signed_in,
            "credentials_path": credential_path,
            "cache_dir": cache_dir,
        }));
    }

    println!("{}\n", "SolveCam Status".bold());

    if found {
        println!("Config file: {}", config_path.display().to_string().cyan());
    } else {
        println!(
            "Config file: {} {}",
            config_path.display().to_string().cyan(),
            "(not found, using defaults)".dimmed()
        );
    }
    println!("API host:    {}", config.api_host.cyan());
    match source {
        DataSource::Backend => println!("Data source: backend"),
        DataSource::Fixture => println!("Data source: {}", "fixture (no network)".yellow()),
    }
    println!();

    if signed_in {
        println!("{} Signed in (credential in {})", "✓".green(), credential_path);
    } else {
        println!("{} Not signed in", "✗".red());
        println!("  → Run 'solvecam login' to sign in");
    }

    println!(
        "{} Timeout {}s, {} retries (base delay {}ms)",
        "○".dimmed(),
        config.timeout_secs,
        config.retry.max_retries,
        config.retry.base_delay_ms
    );
    println!(
        "{} Polling up to {} times every {}ms",
        "○".dimmed(),
        config.polling.max_attempts,
        config.polling.interval_ms
    );

    match CacheStorage::open(CacheTtl::DEFAULT).and_then(|cache| cache.stats()) {
        Ok(stats) => println!(
            "{} Cache: {} valid entries in {}",
            "○".dimmed(),
            stats.valid_entries,
            cache_dir
        ),
        Err(e) => println!("{} Cache unavailable: {}", "⚠".yellow(), e),
    }
    println!();

    Ok(())
}
