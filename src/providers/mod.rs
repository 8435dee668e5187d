//! Provider module for Tutorbot
//!
//! This module contains the generation provider abstraction and the
//! Gemini implementation.

pub mod base;
pub mod gemini;

pub use base::{
    translate_role, Content, Fragment, FragmentStream, FunctionCall, FunctionResponse,
    GenerationRequest, ModelInfo, Part, Provider,
};
pub use gemini::GeminiProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, TutorbotError};
use std::sync::Arc;

/// Create a provider instance based on configuration
///
/// The provider is built once and shared for the rest of the process.
///
/// # Errors
///
/// Returns error if the provider type is unknown or the provider cannot
/// be initialized (for example, no API key is configured).
///
/// # Examples
///
/// ```no_run
/// use tutorbot::config::Config;
/// use tutorbot::providers::create_provider;
///
/// let config = Config::default();
/// let provider = create_provider(&config.provider).unwrap();
/// println!("Using model {}", provider.model_name());
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    match config.provider_type.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.gemini.clone())?)),
        other => Err(TutorbotError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}
