//! Tools module for Tutorbot
//!
//! This module contains the capabilities the model may invoke mid-answer,
//! the registry that looks them up by name, and the dispatcher that turns
//! a function call into the text sent back to the model.

pub mod weather;

pub use weather::WeatherTool;

use crate::config::ToolsConfig;
use crate::error::Result;
use crate::providers::FunctionCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Function declaration advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON schema for the tool's parameters
    pub parameters: serde_json::Value,
}

impl Tool {
    /// Create a new tool declaration
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Outcome of a tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if execution failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed tool result
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text handed back to the model
    pub fn to_message(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```no_run
/// use tutorbot::tools::{Tool, ToolExecutor, ToolResult};
/// use tutorbot::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct ClockTool;
///
/// #[async_trait]
/// impl ToolExecutor for ClockTool {
///     fn tool_definition(&self) -> Tool {
///         Tool::new("clock", "Current time", serde_json::json!({"type": "object"}))
///     }
///
///     async fn execute(&self, _args: Value) -> Result<ToolResult> {
///         Ok(ToolResult::success("12:00"))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Declaration sent to the model
    fn tool_definition(&self) -> Tool;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns error if execution fails; the dispatcher turns it into text
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}

/// Registry of tools the model may call
///
/// Tools are keyed by the name in their declaration.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name it declares
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        let name = executor.tool_definition().name;
        self.tools.insert(name, executor);
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// Declarations of every registered tool, sorted by name
    pub fn declarations(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.values().map(|t| t.tool_definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Declarations as JSON values, ready for a generation request
    pub fn function_declarations(&self) -> Vec<serde_json::Value> {
        self.declarations()
            .into_iter()
            .filter_map(|tool| match serde_json::to_value(&tool) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Skipping tool {}: {}", tool.name, e);
                    None
                }
            })
            .collect()
    }

    /// Execute a function call and return the text for the model
    ///
    /// Never fails: unknown tools and execution errors come back as
    /// `Error: ...` text so the model can explain the problem.
    pub async fn dispatch(&self, call: &FunctionCall) -> String {
        let Some(executor) = self.get(&call.name) else {
            tracing::warn!("Model requested unknown tool: {}", call.name);
            return ToolResult::error(format!("Unknown tool: {}", call.name)).to_message();
        };

        tracing::info!("Executing tool {} with args {}", call.name, call.args);
        match executor.execute(call.args.clone()).await {
            Ok(result) => {
                tracing::debug!("Tool {} succeeded={}", call.name, result.success);
                result.to_message()
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", call.name, e);
                ToolResult::error(e.to_string()).to_message()
            }
        }
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

/// Build the registry holding every built-in tool
///
/// # Errors
///
/// Returns error if a tool cannot be constructed
pub fn build_registry(config: &ToolsConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WeatherTool::new(&config.weather)?));
    tracing::debug!("Registered {} tools", registry.len());
    Ok(registry)
}
