//! WebQA - multi-tool question answering agent
//!
//! Main entry point for the WebQA command-line application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webqa::cli::{Cli, Commands};
use webqa::commands;
use webqa::config::{Config, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a .env file next to the binary's working directory
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Ask {
            question,
            steps,
            json,
            quiet,
        } => {
            tracing::info!("Answering question with the reasoning agent");
            commands::ask::run_ask(config, question, steps, json, quiet).await?;
            Ok(())
        }
        Commands::Context { question, file } => {
            tracing::info!("Answering question from {}", file.display());
            commands::context::run_context(config, question, file).await?;
            Ok(())
        }
        Commands::Tools { json } => {
            commands::tools::run_tools(config, json)?;
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber
///
/// Logs go to stderr so stdout stays clean for answers and JSON output.
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_level = if verbose { "webqa=debug" } else { "webqa=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
