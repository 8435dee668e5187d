//! Base provider trait and common types for Tutorbot
//!
//! This module defines the Provider trait that generation backends
//! implement, the wire-level content model shared by requests and
//! streamed responses, and the fragment type the orchestrator consumes.

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Role name the generation service uses for assistant turns
pub const MODEL_ROLE: &str = "model";

/// Translate a conversation role into the generation service's vocabulary
///
/// `assistant` becomes `model`; every other role is passed through unchanged.
///
/// # Examples
///
/// ```
/// use tutorbot::providers::translate_role;
///
/// assert_eq!(translate_role("assistant"), "model");
/// assert_eq!(translate_role("user"), "user");
/// ```
pub fn translate_role(role: &str) -> &str {
    if role == "assistant" {
        MODEL_ROLE
    } else {
        role
    }
}

/// A structured capability-invocation request issued by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function/tool to call
    pub name: String,
    /// Arguments as a JSON object
    #[serde(default)]
    pub args: serde_json::Value,
}

impl FunctionCall {
    /// Create a function call
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// The result of a function call, sent back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Name of the function that produced this response
    pub name: String,
    /// Response payload
    pub response: serde_json::Value,
}

/// One part of a content block
///
/// Unknown part kinds are preserved as raw JSON so that a response with,
/// for example, executable code parts still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// Function call requested by the model
    FunctionCall {
        /// Call details
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    /// Function result supplied by the client
    FunctionResponse {
        /// Response details
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    /// Any other part kind
    Other(serde_json::Value),
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

/// A role-tagged block of parts, as sent to and received from the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Role of the author (`user`, `model`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a single-text content block with the role translated
    ///
    /// # Examples
    ///
    /// ```
    /// use tutorbot::providers::Content;
    ///
    /// let content = Content::text("assistant", "Hello!");
    /// assert_eq!(content.role.as_deref(), Some("model"));
    /// ```
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(translate_role(role).to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Content block replaying the model's function call request
    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: Some(MODEL_ROLE.to_string()),
            parts: vec![Part::FunctionCall {
                function_call: call,
            }],
        }
    }

    /// Content block carrying a tool result back to the model
    ///
    /// The output is wrapped as `{"result": output}`.
    pub fn function_response(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::FunctionResponse {
                function_response: FunctionResponse {
                    name: name.into(),
                    response: serde_json::json!({ "result": output.into() }),
                },
            }],
        }
    }
}

/// A single streamed generation request
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Conversation history, oldest first
    pub contents: Vec<Content>,
    /// Function declarations the model may call
    pub tools: Vec<serde_json::Value>,
    /// Optional system instruction
    pub system_instruction: Option<String>,
}

/// One incremental piece of a streamed response
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Plain text to append to the answer
    Text(String),
    /// The model asked for a capability invocation
    FunctionCall(FunctionCall),
}

/// Stream of fragments produced by a provider
///
/// Finite and not restartable; an `Err` item ends the useful part of the
/// stream.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// Model information returned by model discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier (without the `models/` prefix)
    pub name: String,
    /// Display name for user-friendly presentation
    pub display_name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Maximum input tokens
    #[serde(default)]
    pub input_token_limit: Option<u64>,
    /// Maximum output tokens
    #[serde(default)]
    pub output_token_limit: Option<u64>,
    /// Generation methods the model supports
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Check whether the model supports a generation method
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

/// Provider trait for generation backends
///
/// # Examples
///
/// ```no_run
/// use tutorbot::providers::{Fragment, FragmentStream, GenerationRequest, Provider};
/// use tutorbot::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn stream_generate(&self, _request: &GenerationRequest) -> Result<FragmentStream> {
///         let items = vec![Ok(Fragment::Text("echo".to_string()))];
///         Ok(Box::pin(futures::stream::iter(items)))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a streaming generation call
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the service rejects it
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream>;

    /// List available models
    ///
    /// # Default Implementation
    ///
    /// Returns an error indicating that model listing is not supported.
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Err(crate::error::TutorbotError::Provider(
            "Model listing is not supported by this provider".to_string(),
        )
        .into())
    }

    /// Name of the model requests are sent to
    fn model_name(&self) -> String {
        "unknown".to_string()
    }
}
