//! Model discovery command for Tutorbot
//!
//! Lists the models the configured provider can use for content
//! generation, as a table or as JSON.

use crate::config::Config;
use crate::error::{Result, TutorbotError};
use crate::providers;
use crate::providers::ModelInfo;
use prettytable::{row, Table};

/// List models that support content generation
///
/// # Errors
///
/// Returns error if the provider cannot be created or the listing fails
///
/// # Examples
///
/// ```no_run
/// use tutorbot::config::Config;
/// use tutorbot::commands::models::list_models;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// list_models(&config, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_models(config: &Config, json: bool) -> Result<()> {
    tracing::info!(
        "Listing models from provider: {}",
        config.provider.provider_type
    );

    let provider = providers::create_provider(&config.provider)?;
    let models = provider.list_models().await?;

    if json {
        output_models_json(&models)?;
    } else if models.is_empty() {
        println!("No generation models available.");
    } else {
        output_models_table(&models, &provider.model_name());
    }
    Ok(())
}

fn render_models_json(models: &[ModelInfo]) -> Result<String> {
    serde_json::to_string_pretty(models).map_err(|e| TutorbotError::Serialization(e).into())
}

fn output_models_json(models: &[ModelInfo]) -> Result<()> {
    println!("{}", render_models_json(models)?);
    Ok(())
}

fn format_limit(limit: Option<u64>) -> String {
    limit
        .map(|l| format!("{} tokens", l))
        .unwrap_or_else(|| "-".to_string())
}

fn build_models_table(models: &[ModelInfo], current: &str) -> Table {
    let mut table = Table::new();
    table.add_row(row!["", "Model Name", "Display Name", "Input Limit", "Output Limit"]);

    for model in models {
        let marker = if model.name == current { "*" } else { "" };
        table.add_row(row![
            marker,
            model.name,
            model.display_name,
            format_limit(model.input_token_limit),
            format_limit(model.output_token_limit)
        ]);
    }
    table
}

fn output_models_table(models: &[ModelInfo], current: &str) {
    println!("\nAvailable generation models (* = configured):\n");
    build_models_table(models, current).printstd();
    println!();
}
