//! Command-line interface definition for Tutorbot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, the
//! weather tool, model discovery and the feedback log.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tutorbot - course assistant chatbot
///
/// Chat with a hosted generative model, ask about the weather, and rate
/// answers into a feedback log.
#[derive(Parser, Debug, Clone)]
#[command(name = "tutorbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the generation model from config
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Override the feedback log path from config
    #[arg(long, global = true)]
    pub feedback_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Tutorbot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and stream the answer to stdout
    Ask {
        /// The question to send
        prompt: String,
    },

    /// Look up the current weather for a city using the weather tool directly
    Weather {
        /// City name
        city: String,
    },

    /// List models that support content generation
    Models {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show entries recorded in the feedback log
    Feedback {
        /// Only show the most recent N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            model: None,
            feedback_path: None,
            command: Commands::Chat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Chat));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["tutorbot", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat));
    }

    #[test]
    fn test_cli_parse_ask_command() {
        let cli = Cli::try_parse_from(["tutorbot", "ask", "What is a closure?"]).unwrap();
        if let Commands::Ask { prompt } = cli.command {
            assert_eq!(prompt, "What is a closure?");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["tutorbot", "ask"]).is_err());
    }

    #[test]
    fn test_cli_parse_weather_command() {
        let cli = Cli::try_parse_from(["tutorbot", "weather", "Seoul"]).unwrap();
        if let Commands::Weather { city } = cli.command {
            assert_eq!(city, "Seoul");
        } else {
            panic!("Expected Weather command");
        }
    }

    #[test]
    fn test_cli_parse_models_json() {
        let cli = Cli::try_parse_from(["tutorbot", "models", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Models { json: true }));
    }

    #[test]
    fn test_cli_parse_feedback_limit() {
        let cli = Cli::try_parse_from(["tutorbot", "feedback", "-n", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Feedback { limit: Some(5) }));
    }

    #[test]
    fn test_cli_parse_global_model_after_subcommand() {
        let cli = Cli::try_parse_from(["tutorbot", "chat", "--model", "gemini-flash"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("gemini-flash"));
    }

    #[test]
    fn test_cli_parse_config_and_verbose() {
        let cli =
            Cli::try_parse_from(["tutorbot", "--config", "my.yaml", "--verbose", "chat"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("my.yaml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_invalid_command() {
        assert!(Cli::try_parse_from(["tutorbot", "invalid"]).is_err());
    }
}
