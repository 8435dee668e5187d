use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tutorbot::error::{Result, TutorbotError};
use tutorbot::providers::{
    Fragment, FragmentStream, FunctionCall, GenerationRequest, Provider,
};
use tutorbot::tools::{Tool, ToolExecutor, ToolResult};

/// One scripted stream item
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Step {
    Text(&'static str),
    Call(&'static str, serde_json::Value),
    Fail(&'static str),
}

/// Provider that replays one scripted stream per call and records requests
#[allow(dead_code)]
pub struct ScriptedProvider {
    scripts: Mutex<Vec<Vec<Step>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(scripts: Vec<Vec<Step>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        self.requests.lock().unwrap().push(request.clone());
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            return Err(TutorbotError::Provider("service unavailable".to_string()).into());
        }
        let items: Vec<Result<Fragment>> = scripts
            .remove(0)
            .into_iter()
            .map(|step| match step {
                Step::Text(text) => Ok(Fragment::Text(text.to_string())),
                Step::Call(name, args) => Ok(Fragment::FunctionCall(FunctionCall::new(name, args))),
                Step::Fail(message) => Err(TutorbotError::Provider(message.to_string()).into()),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn model_name(&self) -> String {
        "scripted".to_string()
    }
}

/// Weather-shaped tool that counts invocations
#[allow(dead_code)]
pub struct CountingTool {
    calls: Mutex<Vec<serde_json::Value>>,
}

#[allow(dead_code)]
impl CountingTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for CountingTool {
    fn tool_definition(&self) -> Tool {
        Tool::new(
            "get_weather",
            "Get the current weather for a city.",
            serde_json::json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        )
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        self.calls.lock().unwrap().push(args.clone());
        let city = args["city"].as_str().unwrap_or("nowhere");
        Ok(ToolResult::success(format!(
            "Current weather in {}: Sunny, temperature 25°C",
            city
        )))
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Wrap text payloads as a `text/event-stream` body
#[allow(dead_code)]
pub fn sse_body(events: &[serde_json::Value]) -> Vec<u8> {
    events
        .iter()
        .map(|e| format!("data: {}\r\n\r\n", e))
        .collect::<String>()
        .into_bytes()
}

/// A streamed chunk carrying one text part
#[allow(dead_code)]
pub fn text_chunk(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

/// A streamed chunk carrying one function call
#[allow(dead_code)]
pub fn call_chunk(name: &str, args: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"functionCall": {"name": name, "args": args}}]}}]
    })
}
