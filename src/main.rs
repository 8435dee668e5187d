//! Tutorbot - course assistant chatbot CLI
//!
//! Main entry point for the tutorbot application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tutorbot::cli::{Cli, Commands};
use tutorbot::commands;
use tutorbot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat => commands::chat::run_chat(config).await,
        Commands::Ask { prompt } => {
            tracing::debug!("Asking a single question ({} chars)", prompt.len());
            commands::ask::run_ask(config, prompt).await
        }
        Commands::Weather { city } => commands::weather::run_weather(&config, &city).await,
        Commands::Models { json } => commands::models::list_models(&config, json).await,
        Commands::Feedback { limit } => commands::feedback::show_feedback(&config, limit),
    }
}

/// Initialize tracing; `RUST_LOG` wins over `--verbose`
///
/// Logs go to stderr so streamed answers on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "tutorbot=debug" } else { "tutorbot=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
