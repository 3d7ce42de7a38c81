//! SolveCam CLI - snap a question, get the steps

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;

use cli::analyze::{Hints, QuestionSource};
use cli::args::GlobalOptions;
use cli::{CacheCommands, Cli, CommandContext, Commands};
use error::{ApiError, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        if let error::Error::Api(ref api_err) = err {
            log::debug!("Request failed with HTTP status {}", api_err.status());
        }
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` raises the default filter; `RUST_LOG` still wins when set
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
    log::debug!("Debug logging enabled");
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Status => cli::status::run(&opts).await,
        Commands::Version => {
            println!("solvecam version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completion { shell } => cli::completions::run(shell),
        Commands::Cache(cache_cmd) => {
            let format = opts.format.unwrap_or_default();
            match cache_cmd {
                CacheCommands::Status => cli::cache::status(format),
                CacheCommands::Clear => cli::cache::clear(format),
                CacheCommands::Path => cli::cache::path(),
            }
        }
        Commands::Login { username, password } => {
            let ctx = CommandContext::new(&opts).await?;
            cli::auth::login(&ctx, username, password).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let ctx = CommandContext::new(&opts).await?;
            cli::auth::register(&ctx, username, email, password).await
        }
        Commands::Logout => {
            let ctx = CommandContext::new(&opts).await?;
            cli::auth::logout(&ctx).await
        }
        Commands::Whoami => {
            let ctx = CommandContext::new(&opts).await?;
            cli::auth::whoami(&ctx).await
        }
        Commands::Ocr {
            image,
            no_wait,
            poll,
        } => {
            let ctx = CommandContext::new(&opts).await?;
            cli::ocr::run(&ctx, &image, no_wait, &poll).await
        }
        Commands::Analyze {
            image,
            text,
            ocr_task,
            subject,
            grade,
            note,
            no_wait,
            poll,
        } => {
            let source = match (image, text, ocr_task) {
                (Some(path), _, _) => QuestionSource::Image(path),
                (_, Some(text), _) => QuestionSource::Text(text),
                (_, _, Some(task_id)) => QuestionSource::OcrTask(task_id),
                // clap's required group guarantees one of the three
                (None, None, None) => {
                    return Err(ApiError::Validation(
                        "One of --image, --text or --ocr-task is required".to_string(),
                    )
                    .into());
                }
            };
            let hints = Hints {
                subject,
                grade,
                note,
            };

            let ctx = CommandContext::new(&opts).await?;
            cli::analyze::run(&ctx, source, hints, no_wait, &poll).await
        }
        Commands::Task {
            kind,
            task_id,
            wait,
            poll,
        } => {
            let ctx = CommandContext::new(&opts).await?;
            cli::task::run(&ctx, kind, &task_id, wait, &poll).await
        }
    }
}
