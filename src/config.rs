//! Configuration management for Tutorbot
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, TutorbotError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Tutorbot
///
/// Holds everything needed to run a chat session: the generation provider,
/// chat behavior, tool settings and the feedback log location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration
    pub provider: ProviderConfig,
    /// Chat session configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Feedback log configuration
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Provider configuration
///
/// Specifies which generation provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; usually supplied through `GOOGLE_API_KEY` rather than the file
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for generation
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Base URL of the Generative Language API
    ///
    /// Tests point this at a mock server.
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// HTTP timeout for a whole request, including the streamed body (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_gemini_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Greeting seeded as the first assistant turn of every conversation
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Optional system instruction sent with every generation request
    #[serde(default)]
    pub system_instruction: Option<String>,

    /// Default file name used by `/save`
    #[serde(default = "default_transcript_file")]
    pub transcript_file: PathBuf,
}

fn default_greeting() -> String {
    "Hi! I'm the course assistant chatbot for App Programming. Ask me anything!".to_string()
}

fn default_transcript_file() -> PathBuf {
    PathBuf::from("chatbot_history.txt")
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            system_instruction: None,
            transcript_file: default_transcript_file(),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Weather tool settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Weather tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the weather service
    #[serde(default = "default_weather_api_base")]
    pub api_base: String,

    /// Request timeout (seconds)
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,
}

fn default_weather_api_base() -> String {
    "https://wttr.in".to_string()
}

fn default_weather_timeout() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base: default_weather_api_base(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

/// Feedback log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Path of the CSV feedback log
    #[serde(default = "default_feedback_path")]
    pub path: PathBuf,
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from("feedback.csv")
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            path: default_feedback_path(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: a warning is logged and defaults
    /// are used.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "gemini".to_string(),
                gemini: GeminiConfig::default(),
            },
            chat: ChatConfig::default(),
            tools: ToolsConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TutorbotError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TutorbotError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("TUTORBOT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        // The project-specific variable wins over the generic one
        if let Ok(key) = std::env::var("TUTORBOT_GOOGLE_API_KEY") {
            self.provider.gemini.api_key = Some(key);
        } else if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            self.provider.gemini.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("TUTORBOT_GEMINI_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(api_base) = std::env::var("TUTORBOT_GEMINI_API_BASE") {
            self.provider.gemini.api_base = api_base;
        }

        if let Ok(timeout) = std::env::var("TUTORBOT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.gemini.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TUTORBOT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(api_base) = std::env::var("TUTORBOT_WEATHER_API_BASE") {
            self.tools.weather.api_base = api_base;
        }

        if let Ok(path) = std::env::var("TUTORBOT_FEEDBACK_PATH") {
            self.feedback.path = PathBuf::from(path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(model) = &cli.model {
            tracing::debug!("Using model override from CLI: {}", model);
            self.provider.gemini.model = model.clone();
        }

        if let Some(path) = &cli.feedback_path {
            self.feedback.path = path.clone();
        }
    }

    /// Validate the configuration
    ///
    /// The API key is not checked here; it is only required by commands
    /// that talk to the provider.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(TutorbotError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["gemini"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(TutorbotError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.gemini.model.trim().is_empty() {
            return Err(
                TutorbotError::Config("provider.gemini.model cannot be empty".to_string()).into(),
            );
        }

        if url::Url::parse(&self.provider.gemini.api_base).is_err() {
            return Err(TutorbotError::Config(format!(
                "provider.gemini.api_base is not a valid URL: {}",
                self.provider.gemini.api_base
            ))
            .into());
        }

        if self.provider.gemini.timeout_seconds == 0 {
            return Err(TutorbotError::Config(
                "provider.gemini.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.greeting.trim().is_empty() {
            return Err(TutorbotError::Config("chat.greeting cannot be empty".to_string()).into());
        }

        if url::Url::parse(&self.tools.weather.api_base).is_err() {
            return Err(TutorbotError::Config(format!(
                "tools.weather.api_base is not a valid URL: {}",
                self.tools.weather.api_base
            ))
            .into());
        }

        if self.tools.weather.timeout_seconds == 0 {
            return Err(TutorbotError::Config(
                "tools.weather.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.feedback.path.as_os_str().is_empty() {
            return Err(TutorbotError::Config("feedback.path cannot be empty".to_string()).into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
