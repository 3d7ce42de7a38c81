//! Cache management commands

use colored::Colorize;

use crate::cache::{CacheStorage, CacheTtl};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::{self, formatters, table};

/// Show what the response cache currently holds
pub fn status(format: OutputFormat) -> Result<()> {
    let cache = CacheStorage::open(CacheTtl::DEFAULT)?;
    let stats = cache.stats()?;
    let location = CacheStorage::cache_dir()?.display().to_string();

    if format == OutputFormat::Json {
        return output::print_json(&serde_json::json!({
            "path": location,
            "ttl_secs": cache.ttl().as_secs(),
            "entries": {
                "total": stats.total_entries,
                "valid": stats.valid_entries,
                "expired": stats.expired_entries,
            },
            "size_bytes": stats.total_size_bytes,
            "oldest_entry_ms": stats.oldest_entry,
            "newest_entry_ms": stats.newest_entry,
        }));
    }

    let when = |millis: Option<i64>| {
        millis
            .map(formatters::format_timestamp_local)
            .unwrap_or_default()
    };

    println!("{}", "Response cache".bold());
    println!(
        "{}",
        table::format_details(&[
            ("Location", location),
            (
                "Entries",
                format!(
                    "{} valid, {} expired",
                    stats.valid_entries, stats.expired_entries
                ),
            ),
            ("Size", formatters::format_size(stats.total_size_bytes)),
            ("Lifetime", format!("{} min", cache.ttl().as_secs() / 60)),
            ("Oldest", when(stats.oldest_entry)),
            ("Newest", when(stats.newest_entry)),
        ])
    );
    Ok(())
}

/// Drop every cached response
pub fn clear(format: OutputFormat) -> Result<()> {
    let removed = CacheStorage::open(CacheTtl::DEFAULT)?
        .clear()?
        .entries_removed;

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({ "entries_removed": removed })),
        _ if removed == 0 => {
            println!("{} Cache was already empty", "○".dimmed());
            Ok(())
        }
        _ => {
            println!("{} Removed {} cached responses", "✓".green(), removed);
            Ok(())
        }
    }
}

/// Print the cache directory
pub fn path() -> Result<()> {
    println!("{}", CacheStorage::cache_dir()?.display());
    Ok(())
}
