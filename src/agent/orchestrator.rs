//! Chat turn orchestration
//!
//! Drives one user message through the provider: streams the first answer,
//! and if the model asks for a tool, runs it once and streams a second
//! answer that sees the tool result. Failures never escape as errors; they
//! become part of the assistant's reply so the conversation stays
//! consistent.

use crate::agent::{Conversation, Turn};
use crate::providers::{Content, Fragment, FunctionCall, GenerationRequest, Provider};
use crate::tools::ToolRegistry;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress notifications emitted while a reply is produced
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A piece of answer text, in arrival order
    Text(String),
    /// Text already surfaced that will not be part of the reply
    ///
    /// Sent when the model asks for a tool after streaming some text; the
    /// reply is rebuilt from the answer that follows the tool result.
    Discarded(String),
    /// The model asked for a tool
    ToolCall {
        /// Tool name
        name: String,
        /// Arguments as sent by the model
        args: serde_json::Value,
    },
    /// The tool finished
    ToolResult {
        /// Tool name
        name: String,
        /// Text handed back to the model
        output: String,
    },
    /// The provider failed; the text is also appended to the reply
    Error(String),
}

/// What one streamed pass produced
#[derive(Debug, Default)]
struct Pass {
    text: String,
    call: Option<FunctionCall>,
}

/// Orchestrates the request/stream/tool cycle for chat turns
///
/// # Examples
///
/// ```no_run
/// use tutorbot::agent::{ChatEvent, ChatOrchestrator, Conversation};
/// use tutorbot::config::Config;
/// use tutorbot::providers::create_provider;
/// use tutorbot::tools::build_registry;
///
/// # async fn example() -> tutorbot::error::Result<()> {
/// let config = Config::default();
/// let provider = create_provider(&config.provider)?;
/// let orchestrator = ChatOrchestrator::new(provider, build_registry(&config.tools)?);
///
/// let conversation = Conversation::new(config.chat.greeting.clone());
/// let conversation = orchestrator
///     .respond(conversation, "What's the weather in Seoul?", |event| {
///         if let ChatEvent::Text(text) = event {
///             print!("{}", text);
///         }
///     })
///     .await;
/// assert_eq!(conversation.len(), 3);
/// # Ok(())
/// # }
/// ```
pub struct ChatOrchestrator {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    system_instruction: Option<String>,
}

impl ChatOrchestrator {
    /// Create an orchestrator over a shared provider and a tool registry
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            system_instruction: None,
        }
    }

    /// Send a system instruction with every request
    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction.filter(|s| !s.trim().is_empty());
        self
    }

    /// The provider in use
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The tools the model may call
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `message` and return the conversation with both new turns
    ///
    /// The user turn is appended first, then exactly one assistant turn.
    /// Text fragments are forwarded to `on_event` as they arrive. When the
    /// model requests a tool, text from the first pass is discarded and the
    /// reply is the second pass's text.
    pub async fn respond<F>(
        &self,
        mut conversation: Conversation,
        message: impl Into<String>,
        mut on_event: F,
    ) -> Conversation
    where
        F: FnMut(ChatEvent),
    {
        conversation.append(Turn::user(message));
        let contents = conversation.to_contents();

        info!("Generating reply ({} turns of history)", conversation.len());
        let first = self.stream_pass(contents.clone(), &mut on_event).await;

        let reply = match first.call {
            None => first.text,
            Some(call) => {
                if !first.text.is_empty() {
                    debug!(
                        "Discarding {} chars streamed before the tool call",
                        first.text.len()
                    );
                    on_event(ChatEvent::Discarded(first.text));
                }
                on_event(ChatEvent::ToolCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                });

                let output = self.tools.dispatch(&call).await;
                on_event(ChatEvent::ToolResult {
                    name: call.name.clone(),
                    output: output.clone(),
                });

                let mut follow_up = contents;
                let name = call.name.clone();
                follow_up.push(Content::function_call(call));
                follow_up.push(Content::function_response(name, output));

                let second = self.stream_pass(follow_up, &mut on_event).await;
                if let Some(nested) = second.call {
                    warn!(
                        "Ignoring tool call {} requested after a tool result",
                        nested.name
                    );
                }
                second.text
            }
        };

        conversation.append(Turn::assistant(reply));
        conversation
    }

    fn request(&self, contents: Vec<Content>) -> GenerationRequest {
        GenerationRequest {
            contents,
            tools: self.tools.function_declarations(),
            system_instruction: self.system_instruction.clone(),
        }
    }

    /// Consume one streamed response
    ///
    /// Stops at the first function call. A provider error is appended to the
    /// text and ends the pass.
    async fn stream_pass<F>(&self, contents: Vec<Content>, on_event: &mut F) -> Pass
    where
        F: FnMut(ChatEvent),
    {
        let mut pass = Pass::default();
        let request = self.request(contents);

        let mut stream = match self.provider.stream_generate(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to open generation stream: {}", e);
                append_error(&mut pass.text, &e, on_event);
                return pass;
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(Fragment::Text(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    pass.text.push_str(&text);
                    on_event(ChatEvent::Text(text));
                }
                Ok(Fragment::FunctionCall(call)) => {
                    debug!("Model requested tool {}", call.name);
                    pass.call = Some(call);
                    break;
                }
                Err(e) => {
                    warn!("Generation stream failed: {}", e);
                    append_error(&mut pass.text, &e, on_event);
                    break;
                }
            }
        }

        pass
    }
}

fn append_error<F>(text: &mut String, error: &anyhow::Error, on_event: &mut F)
where
    F: FnMut(ChatEvent),
{
    let message = format!("Error: {}", error);
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(&message);
    on_event(ChatEvent::Error(message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TutorbotError};
    use crate::providers::FragmentStream;
    use crate::tools::{Tool, ToolExecutor, ToolResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Step {
        Text(&'static str),
        Call(&'static str, serde_json::Value),
        Fail(&'static str),
    }

    /// Provider that replays one scripted stream per call
    struct ScriptedProvider {
        scripts: Mutex<Vec<Vec<Step>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn new(scripts: Vec<Vec<Step>>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn stream_generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
            self.requests.lock().unwrap().push(request.clone());
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                return Err(TutorbotError::Provider("no script left".to_string()).into());
            }
            let items: Vec<Result<Fragment>> = scripts
                .remove(0)
                .into_iter()
                .map(|step| match step {
                    Step::Text(t) => Ok(Fragment::Text(t.to_string())),
                    Step::Call(name, args) => Ok(Fragment::FunctionCall(FunctionCall::new(name, args))),
                    Step::Fail(msg) => Err(TutorbotError::Provider(msg.to_string()).into()),
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    struct CountingTool {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ToolExecutor for CountingTool {
        fn tool_definition(&self) -> Tool {
            Tool::new("get_weather", "weather", serde_json::json!({"type": "object"}))
        }

        async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
            *self.calls.lock().unwrap() += 1;
            Ok(ToolResult::success(format!("Sunny in {}", args["city"].as_str().unwrap_or("?"))))
        }
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> (ChatOrchestrator, Arc<CountingTool>) {
        let tool = Arc::new(CountingTool {
            calls: Mutex::new(0),
        });
        let mut tools = ToolRegistry::new();
        tools.register(tool.clone());
        (ChatOrchestrator::new(provider, tools), tool)
    }

    #[tokio::test]
    async fn test_text_fragments_concatenate() {
        let provider = ScriptedProvider::new(vec![vec![Step::Text("Hel"), Step::Text("lo")]]);
        let (orchestrator, _) = orchestrator(provider.clone());

        let mut seen = Vec::new();
        let conversation = orchestrator
            .respond(Conversation::new("hi"), "Say hello", |e| seen.push(e))
            .await;

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.get(1), Some(&Turn::user("Say hello")));
        assert_eq!(conversation.last(), Some(&Turn::assistant("Hello")));
        assert_eq!(
            seen,
            vec![
                ChatEvent::Text("Hel".to_string()),
                ChatEvent::Text("lo".to_string())
            ]
        );
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_fragments_are_skipped() {
        let provider = ScriptedProvider::new(vec![vec![Step::Text(""), Step::Text("ok")]]);
        let (orchestrator, _) = orchestrator(provider);
        let mut count = 0;
        let conversation = orchestrator
            .respond(Conversation::new("hi"), "q", |_| count += 1)
            .await;
        assert_eq!(count, 1);
        assert_eq!(conversation.last().unwrap().content, "ok");
    }

    #[tokio::test]
    async fn test_function_call_runs_tool_once_and_streams_second_pass() {
        let provider = ScriptedProvider::new(vec![
            vec![
                Step::Text("Let me check. "),
                Step::Call("get_weather", serde_json::json!({"city": "Seoul"})),
                Step::Text("never read"),
            ],
            vec![Step::Text("It is sunny in Seoul.")],
        ]);
        let (orchestrator, tool) = orchestrator(provider.clone());

        let mut events = Vec::new();
        let conversation = orchestrator
            .respond(Conversation::new("hi"), "Weather in Seoul?", |e| events.push(e))
            .await;

        assert_eq!(*tool.calls.lock().unwrap(), 1);
        assert_eq!(conversation.last().unwrap().content, "It is sunny in Seoul.");
        assert_eq!(
            &events[..3],
            &[
                ChatEvent::Text("Let me check. ".to_string()),
                ChatEvent::Discarded("Let me check. ".to_string()),
                ChatEvent::ToolCall {
                    name: "get_weather".to_string(),
                    args: serde_json::json!({"city": "Seoul"}),
                },
            ]
        );
        assert!(events.contains(&ChatEvent::ToolResult {
            name: "get_weather".to_string(),
            output: "Sunny in Seoul".to_string(),
        }));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].contents;
        assert_eq!(second.len(), requests[0].contents.len() + 2);
        assert_eq!(
            second[second.len() - 1],
            Content::function_response("get_weather", "Sunny in Seoul")
        );
        assert_eq!(second[second.len() - 2].role.as_deref(), Some("model"));
    }

    #[tokio::test]
    async fn test_call_without_preamble_discards_nothing() {
        let provider = ScriptedProvider::new(vec![
            vec![Step::Call("get_weather", serde_json::json!({"city": "Daegu"}))],
            vec![Step::Text("Cloudy.")],
        ]);
        let (orchestrator, _) = orchestrator(provider);
        let mut events = Vec::new();
        orchestrator
            .respond(Conversation::new("hi"), "q", |e| events.push(e))
            .await;

        assert!(!events.iter().any(|e| matches!(e, ChatEvent::Discarded(_))));
    }

    #[tokio::test]
    async fn test_nested_call_in_second_pass_is_ignored() {
        let provider = ScriptedProvider::new(vec![
            vec![Step::Call("get_weather", serde_json::json!({"city": "Busan"}))],
            vec![
                Step::Text("Partial"),
                Step::Call("get_weather", serde_json::json!({"city": "Jeju"})),
            ],
        ]);
        let (orchestrator, tool) = orchestrator(provider.clone());
        let conversation = orchestrator
            .respond(Conversation::new("hi"), "q", |_| {})
            .await;

        assert_eq!(*tool.calls.lock().unwrap(), 1);
        assert_eq!(provider.requests().len(), 2);
        assert_eq!(conversation.last().unwrap().content, "Partial");
    }

    #[tokio::test]
    async fn test_open_failure_becomes_reply_text() {
        let provider = ScriptedProvider::new(vec![]);
        let (orchestrator, _) = orchestrator(provider);
        let mut errors = 0;
        let conversation = orchestrator
            .respond(Conversation::new("hi"), "q", |e| {
                if matches!(e, ChatEvent::Error(_)) {
                    errors += 1;
                }
            })
            .await;

        assert_eq!(errors, 1);
        assert_eq!(conversation.len(), 3);
        assert!(conversation.last().unwrap().content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial_text() {
        let provider = ScriptedProvider::new(vec![vec![
            Step::Text("Partial answer"),
            Step::Fail("connection reset"),
            Step::Text("unreachable"),
        ]]);
        let (orchestrator, _) = orchestrator(provider);
        let conversation = orchestrator
            .respond(Conversation::new("hi"), "q", |_| {})
            .await;

        let reply = &conversation.last().unwrap().content;
        assert!(reply.starts_with("Partial answer\n\nError: "));
        assert!(reply.contains("connection reset"));
        assert!(!reply.contains("unreachable"));
    }

    #[tokio::test]
    async fn test_request_carries_declarations_and_instruction() {
        let provider = ScriptedProvider::new(vec![vec![Step::Text("ok")]]);
        let (orchestrator, _) = orchestrator(provider.clone());
        let orchestrator = orchestrator.with_system_instruction(Some("Be concise".to_string()));
        orchestrator
            .respond(Conversation::new("hi"), "q", |_| {})
            .await;

        let request = &provider.requests()[0];
        assert_eq!(request.tools[0]["name"], "get_weather");
        assert_eq!(request.system_instruction.as_deref(), Some("Be concise"));
        assert_eq!(request.contents[0].role.as_deref(), Some("model"));
    }
}
