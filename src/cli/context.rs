//! Command execution context
//!
//! Builds the per-run components once (config, credential store, cache and
//! client for the selected data source) and hands them to commands.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStorage, CacheTtl, CachedLearningClient};
use crate::cli::OutputFormat;
use crate::cli::args::{GlobalOptions, PollArgs};
use crate::client::{
    FileCredentialStore, LearningApi, PollOptions, SourceClient, TokenStore, data_source,
};
use crate::config::{Config, DataSource};
use crate::error::Result;

/// Username the fixture data source starts signed in as
pub const FIXTURE_USERNAME: &str = "student";

/// Context for command execution containing config, client, and runtime options.
pub struct CommandContext {
    /// Loaded configuration with CLI overrides applied
    pub config: Config,
    /// Where API data comes from this run
    pub source: DataSource,
    /// API client with caching
    pub client: Arc<dyn LearningApi>,
    /// Credential shared with the client
    pub tokens: Arc<TokenStore>,
    /// Output format preference
    pub format: OutputFormat,
    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Create a new command context with full initialization.
    ///
    /// # Errors
    /// Returns error if config cannot be loaded or an override is invalid.
    pub async fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_or_default_at(opts.config_ref())?;
        if let Some(host) = opts.api_host_ref() {
            config.api_host = host.trim_end_matches('/').to_string();
            config.validate()?;
        }

        let format = opts.resolve_format(&config);
        let source = data_source(&config, opts.fixtures);
        let tokens = Arc::new(Self::token_store(opts, source).await?);
        let cache = Self::open_cache(opts, source);

        let client: Arc<dyn LearningApi> =
            match SourceClient::build(&config, source, Arc::clone(&tokens))? {
                SourceClient::Backend(c) => Arc::new(CachedLearningClient::new(c, cache)),
                SourceClient::Fixture(c) => Arc::new(CachedLearningClient::new(c, cache)),
            };

        Ok(Self {
            config,
            source,
            client,
            tokens,
            format,
            cancel: ctrl_c_token(),
        })
    }

    /// Poll options from config, with per-command overrides
    pub fn poll_options(&self, args: &PollArgs) -> PollOptions {
        args.apply(PollOptions::from(&self.config.polling))
    }

    /// Backend credentials persist next to the config file; fixture runs
    /// start signed in with a throwaway credential.
    async fn token_store(opts: &GlobalOptions, source: DataSource) -> Result<TokenStore> {
        match source {
            DataSource::Backend => {
                let dir = Config::state_dir(opts.config_ref())?;
                Ok(TokenStore::new(Box::new(FileCredentialStore::in_dir(&dir))))
            }
            DataSource::Fixture => {
                let tokens = TokenStore::in_memory();
                tokens
                    .set(&format!("fixture-token-{}", FIXTURE_USERNAME))
                    .await?;
                Ok(tokens)
            }
        }
    }

    /// A cache that cannot be opened is skipped, not fatal
    fn open_cache(opts: &GlobalOptions, source: DataSource) -> Option<CacheStorage> {
        if opts.no_cache {
            return None;
        }

        let opened = match source {
            DataSource::Backend => CacheStorage::open(CacheTtl::DEFAULT),
            DataSource::Fixture => CacheStorage::open_in_memory(CacheTtl::DEFAULT),
        };
        match opened {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::warn!("Response cache unavailable, continuing without it: {}", e);
                None
            }
        }
    }
}

/// Token cancelled when the user presses Ctrl-C
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::debug!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AuthApi;
    use std::time::Duration;
    use tempfile::tempdir;

    fn opts_in(dir: &std::path::Path) -> GlobalOptions {
        GlobalOptions {
            config: Some(dir.join("config.yaml").to_string_lossy().into_owned()),
            no_cache: true,
            ..GlobalOptions::default()
        }
    }

    #[tokio::test]
    async fn test_fixture_context_starts_signed_in() {
        let dir = tempdir().unwrap();
        let opts = GlobalOptions {
            fixtures: true,
            ..opts_in(dir.path())
        };

        let ctx = CommandContext::new(&opts).await.unwrap();
        assert_eq!(ctx.source, DataSource::Fixture);
        assert_eq!(
            ctx.client.current_user().await.unwrap().username,
            FIXTURE_USERNAME
        );
        // Nothing written next to the config
        assert!(!dir.path().join(FileCredentialStore::FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_backend_context_without_credential() {
        let dir = tempdir().unwrap();
        let ctx = CommandContext::new(&opts_in(dir.path())).await.unwrap();

        assert_eq!(ctx.source, DataSource::Backend);
        assert!(!ctx.tokens.has().await);
        assert_eq!(ctx.format, OutputFormat::Pretty);
    }

    #[tokio::test]
    async fn test_api_host_override_is_validated() {
        let dir = tempdir().unwrap();
        let opts = GlobalOptions {
            api_host: Some("localhost:3000".to_string()),
            ..opts_in(dir.path())
        };
        assert!(CommandContext::new(&opts).await.is_err());

        let opts = GlobalOptions {
            api_host: Some("http://localhost:3000/".to_string()),
            ..opts_in(dir.path())
        };
        let ctx = CommandContext::new(&opts).await.unwrap();
        assert_eq!(ctx.config.api_host, "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_poll_options_layering() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "polling:\n  max_attempts: 12\n  interval_ms: 250\n",
        )
        .unwrap();
        let ctx = CommandContext::new(&opts_in(dir.path())).await.unwrap();

        let opts = ctx.poll_options(&PollArgs::default());
        assert_eq!(opts.max_attempts, 12);
        assert_eq!(opts.interval, Duration::from_millis(250));

        let opts = ctx.poll_options(&PollArgs {
            max_attempts: Some(3),
            interval_ms: None,
        });
        assert_eq!(opts.max_attempts, 3);
    }
}
