//! Gemini provider implementation
//!
//! Talks to the Generative Language REST API: streamed generation over
//! server-sent events and model discovery.

use crate::config::GeminiConfig;
use crate::error::{Result, TutorbotError};
use crate::providers::base::{
    Content, Fragment, FragmentStream, GenerationRequest, ModelInfo, Part, Provider,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATE_METHOD: &str = "generateContent";

/// Gemini provider
///
/// Holds one HTTP client for the lifetime of the process. The API key is
/// sent in the `x-goog-api-key` header on every request.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool<'a> {
    function_declarations: &'a [serde_json::Value],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_token_limit: Option<u64>,
    #[serde(default)]
    output_token_limit: Option<u64>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<GeminiModel> for ModelInfo {
    fn from(model: GeminiModel) -> Self {
        let name = model
            .name
            .strip_prefix("models/")
            .unwrap_or(&model.name)
            .to_string();
        Self {
            display_name: model.display_name.unwrap_or_else(|| name.clone()),
            name,
            description: model.description.unwrap_or_default(),
            input_token_limit: model.input_token_limit,
            output_token_limit: model.output_token_limit,
            supported_generation_methods: model.supported_generation_methods,
        }
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when no API key is configured, or a
    /// provider error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(TutorbotError::MissingCredentials("gemini".to_string()).into()),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("tutorbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TutorbotError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Gemini provider: model={}", config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    fn stream_url(&self) -> String {
        let model = self
            .config
            .model
            .strip_prefix("models/")
            .unwrap_or(&self.config.model);
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.api_base(),
            model
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        let body = GenerateContentRequest {
            contents: &request.contents,
            tools: if request.tools.is_empty() {
                Vec::new()
            } else {
                vec![GeminiTool {
                    function_declarations: &request.tools,
                }]
            },
            system_instruction: request
                .system_instruction
                .as_ref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| Content {
                    role: None,
                    parts: vec![Part::text(s.clone())],
                }),
        };

        tracing::debug!(
            "Opening Gemini stream: model={} contents={} tools={}",
            self.config.model,
            request.contents.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(self.stream_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TutorbotError::Provider(format!("Failed to reach Gemini: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, text);
            return Err(TutorbotError::Provider(format!(
                "Gemini returned error {}: {}",
                status,
                error_message(&text)
            ))
            .into());
        }

        Ok(fragment_stream(response.bytes_stream()))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.api_base());
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", "1000".to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .query(&query)
                .send()
                .await
                .map_err(|e| TutorbotError::Provider(format!("Failed to list models: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(TutorbotError::Provider(format!(
                    "Gemini returned error {}: {}",
                    status,
                    error_message(&text)
                ))
                .into());
            }

            let page: ListModelsResponse = response.json().await.map_err(|e| {
                TutorbotError::Provider(format!("Failed to parse model list: {}", e))
            })?;

            models.extend(
                page.models
                    .into_iter()
                    .map(ModelInfo::from)
                    .filter(|m| m.supports(GENERATE_METHOD)),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("Discovered {} generation models", models.len());
        Ok(models)
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}

/// Pull the human-readable message out of a Gemini error body
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: ApiError,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}

/// Incremental decoder for a `text/event-stream` body
///
/// Bytes are buffered until a full line is available so multi-byte
/// characters split across chunks decode intact. Both `\n` and `\r\n`
/// line endings are accepted; a blank line terminates an event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning the data payload of every event it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Flush whatever is left once the byte stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string();
            self.process_line(&line);
        }
        self.take_event()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data_lines
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // Comments and the id/event/retry fields carry nothing we use.
        None
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        if data.trim().is_empty() {
            None
        } else {
            Some(data)
        }
    }
}

/// Convert one SSE data payload into fragments
///
/// Empty text parts are dropped. A payload carrying an `error` object or a
/// blocked prompt becomes a single `Err` item.
pub fn parse_event(data: &str) -> Vec<Result<Fragment>> {
    let response: GenerateContentResponse = match serde_json::from_str(data) {
        Ok(response) => response,
        Err(e) => {
            return vec![Err(TutorbotError::Provider(format!(
                "Failed to decode stream event: {}",
                e
            ))
            .into())]
        }
    };

    if let Some(error) = response.error {
        let code = error.code.map(|c| format!(" {}", c)).unwrap_or_default();
        return vec![Err(TutorbotError::Provider(format!(
            "Gemini stream error{}: {}",
            code, error.message
        ))
        .into())];
    }

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return vec![Err(
            TutorbotError::Provider(format!("Prompt was blocked: {}", reason)).into(),
        )];
    }

    let mut fragments = Vec::new();
    if let Some(candidate) = response.candidates.into_iter().next() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            tracing::trace!("Candidate finish reason: {}", reason);
        }
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                Part::Text { text } if !text.is_empty() => fragments.push(Ok(Fragment::Text(text))),
                Part::FunctionCall { function_call } => {
                    fragments.push(Ok(Fragment::FunctionCall(function_call)))
                }
                _ => {}
            }
        }
    }
    fragments
}

struct StreamState {
    bytes: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<Fragment>>,
    finished: bool,
}

/// Wrap a raw SSE byte stream as a fragment stream
pub fn fragment_stream<S>(bytes: S) -> FragmentStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in state.decoder.push(&chunk) {
                        state.pending.extend(parse_event(&event));
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.push_back(Err(TutorbotError::Provider(format!(
                        "Stream interrupted: {}",
                        e
                    ))
                    .into()));
                }
                None => {
                    state.finished = true;
                    if let Some(event) = state.decoder.finish() {
                        state.pending.extend(parse_event(&event));
                    }
                }
            }
        }
    }))
}
