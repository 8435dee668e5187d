/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`     - Interactive chat mode
- `ask`      - One question, streamed to stdout
- `weather`  - Direct weather lookup
- `feedback` - Inspect the feedback log
- `models`   - Model discovery
*/

use crate::agent::{ChatEvent, ChatOrchestrator};
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider;
use crate::tools::build_registry;
use colored::Colorize;
use std::io::Write;

// Special commands parser for the chat REPL
pub mod special_commands;

// Session state behind the chat REPL
pub mod session;

// Model management commands
pub mod models;

pub use session::ChatSession;

/// Build the orchestrator from configuration
///
/// The provider is created once here and shared for the rest of the run.
fn build_orchestrator(config: &Config) -> Result<ChatOrchestrator> {
    let provider = create_provider(&config.provider)?;
    let tools = build_registry(&config.tools)?;
    Ok(ChatOrchestrator::new(provider, tools)
        .with_system_instruction(config.chat.system_instruction.clone()))
}

/// Print one event the way the terminal shows a reply being typed
fn render_event(event: ChatEvent) {
    match event {
        ChatEvent::Text(text) => {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
        ChatEvent::Discarded(_) => {
            println!("\n{}", "(draft discarded, answering with the tool result)".dimmed());
        }
        ChatEvent::ToolCall { name, args } => {
            let subject = args
                .get("city")
                .and_then(|c| c.as_str())
                .map(|c| format!(" for `{}`", c))
                .unwrap_or_default();
            println!("\n{}", format!("Calling {}{}...", name, subject).cyan());
        }
        ChatEvent::ToolResult { name, output } => {
            tracing::debug!("Tool {} returned: {}", name, output);
        }
        ChatEvent::Error(message) => {
            print!("{}", message.red());
            let _ = std::io::stdout().flush();
        }
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Creates the provider and tools once, then runs a readline loop that
    //! either applies a special command or sends the line to the model and
    //! types the reply out as it streams in.

    use super::*;
    use crate::agent::{Conversation, Role};
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::feedback::{FeedbackStore, Rating};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Errors
    ///
    /// Returns error if the provider, tools or line editor cannot be set up
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let orchestrator = build_orchestrator(&config)?;
        let model = orchestrator.provider().model_name();
        let mut session = ChatSession::new(
            orchestrator,
            config.chat.greeting.clone(),
            FeedbackStore::new(&config.feedback.path),
            config.chat.transcript_file.clone(),
        );

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&model);
        print_assistant(session.conversation().greeting());

        loop {
            let prompt = format!("{} ", "You>".green().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {
                            print!("{} ", "Assistant>".blue().bold());
                            let _ = std::io::stdout().flush();
                            session.send(trimmed, render_event).await;
                            println!("\n");
                        }
                        Ok(SpecialCommand::NewConversation) => {
                            session.new_conversation();
                            println!("{}", "Started a new conversation.".cyan());
                            print_assistant(session.conversation().greeting());
                        }
                        Ok(SpecialCommand::Like(index)) => {
                            report_feedback(
                                session.rate(index, Rating::Positive, ""),
                                session.conversation(),
                            );
                        }
                        Ok(SpecialCommand::Dislike { index, comment }) => {
                            let comment = match comment {
                                Some(comment) => comment,
                                None => rl
                                    .readline("What could have been better? (optional) ")
                                    .unwrap_or_default(),
                            };
                            report_feedback(
                                session.rate(index, Rating::Negative, &comment),
                                session.conversation(),
                            );
                        }
                        Ok(SpecialCommand::History) => print_history(session.conversation()),
                        Ok(SpecialCommand::Save(path)) => {
                            match session.save_transcript(path.as_deref()) {
                                Ok(path) => println!(
                                    "{}",
                                    format!("Transcript saved to {}", path.display()).cyan()
                                ),
                                Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                            }
                        }
                        Ok(SpecialCommand::Help) => print_help(),
                        Ok(SpecialCommand::Exit) => break,
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome_banner(model: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              Tutorbot Course Assistant - Welcome!            ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Model: {}", model.cyan());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_assistant(text: &str) {
        println!("{} {}\n", "Assistant>".blue().bold(), text);
    }

    fn report_feedback(
        result: Result<crate::feedback::FeedbackRecord>,
        conversation: &Conversation,
    ) {
        match result {
            Ok(record) => println!(
                "{}",
                format!("Thanks! Recorded {} feedback.", record.rating).cyan()
            ),
            Err(e) => {
                eprintln!("{}", format!("Error: {}", e).red());
                eprintln!("{}", rateable_hint(conversation).dimmed());
            }
        }
    }

    /// Which turn indices `/like` and `/dislike` accept
    fn rateable_hint(conversation: &Conversation) -> String {
        let indices = conversation
            .assistant_indices()
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("Answers you can rate: {} (see /history)", indices)
    }

    /// Print every turn with the index `/like` and `/dislike` accept
    pub(crate) fn print_history(conversation: &Conversation) {
        println!();
        for (index, turn) in conversation.iter().enumerate() {
            let label = match turn.role {
                Role::User => turn.role.label().green().bold(),
                Role::Assistant => turn.role.label().blue().bold(),
            };
            println!("[{}] {}: {}\n", index, label, turn.content);
        }
    }

}

// One-shot question handler
pub mod ask {
    //! Sends a single question and streams the answer to stdout.

    use super::*;
    use crate::agent::Conversation;

    /// Ask one question
    ///
    /// # Errors
    ///
    /// Returns error if setup fails or the provider reported an error while
    /// answering. The provider's message is printed with the answer only.
    pub async fn run_ask(config: Config, prompt: String) -> Result<()> {
        let orchestrator = build_orchestrator(&config)?;
        let conversation = Conversation::new(config.chat.greeting.clone());

        let mut failed = false;
        orchestrator
            .respond(conversation, prompt, |event| {
                failed |= matches!(event, ChatEvent::Error(_));
                render_event(event);
            })
            .await;
        println!();

        if failed {
            anyhow::bail!("no complete answer was received");
        }
        Ok(())
    }
}

// Weather command handler
pub mod weather {
    //! Runs the weather tool directly, without the model.

    use super::*;
    use crate::tools::WeatherTool;

    /// Print the current weather for `city`
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails
    pub async fn run_weather(config: &Config, city: &str) -> Result<()> {
        let tool = WeatherTool::new(&config.tools.weather)?;
        let summary = tool.current_weather(city.trim()).await?;
        println!("{}", summary);
        Ok(())
    }
}

// Feedback log inspection
pub mod feedback {
    //! Prints what has been recorded in the feedback log.

    use super::*;
    use crate::feedback::{FeedbackRecord, FeedbackStore, Rating};

    /// Show the most recent `limit` records (all when `None`)
    ///
    /// # Errors
    ///
    /// Returns error if the log exists but cannot be read
    pub fn show_feedback(config: &Config, limit: Option<usize>) -> Result<()> {
        let store = FeedbackStore::new(&config.feedback.path);
        let records = store.read_all()?;

        if records.is_empty() {
            println!("No feedback recorded in {}", store.path().display());
            return Ok(());
        }

        let positive = records
            .iter()
            .filter(|r| r.rating == Rating::Positive)
            .count();
        println!(
            "{} entries in {} ({} positive, {} negative)\n",
            records.len(),
            store.path().display(),
            positive,
            records.len() - positive
        );

        for record in recent(&records, limit) {
            print_record(record);
        }
        Ok(())
    }

    fn recent(records: &[FeedbackRecord], limit: Option<usize>) -> &[FeedbackRecord] {
        match limit {
            Some(n) if n < records.len() => &records[records.len() - n..],
            _ => records,
        }
    }

    fn print_record(record: &FeedbackRecord) {
        let rating = match record.rating {
            Rating::Positive => record.rating.as_str().green(),
            Rating::Negative => record.rating.as_str().red(),
        };
        println!("{} [{}]", record.timestamp.dimmed(), rating);
        if !record.user_question.is_empty() {
            println!("  Q: {}", record.user_question);
        }
        println!("  A: {}", record.ai_answer);
        if !record.feedback_text.is_empty() {
            println!("  Comment: {}", record.feedback_text);
        }
        println!();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn record(answer: &str) -> FeedbackRecord {
            FeedbackRecord {
                timestamp: "2026-01-01 00:00:00".to_string(),
                user_question: String::new(),
                ai_answer: answer.to_string(),
                rating: Rating::Positive,
                feedback_text: String::new(),
            }
        }

        #[test]
        fn test_recent_limits_to_tail() {
            let records = vec![record("a"), record("b"), record("c")];
            let tail = recent(&records, Some(2));
            assert_eq!(tail.len(), 2);
            assert_eq!(tail[0].ai_answer, "b");
            assert_eq!(recent(&records, Some(10)).len(), 3);
            assert_eq!(recent(&records, None).len(), 3);
        }

        #[test]
        fn test_show_feedback_missing_log() {
            let dir = crate::test_utils::temp_dir();
            let config = crate::test_utils::test_config(&dir);
            assert!(show_feedback(&config, None).is_ok());
        }
    }
}
