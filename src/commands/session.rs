//! Interactive chat session state
//!
//! Owns the current conversation and applies REPL actions to it. Kept free
//! of terminal I/O so the chat loop stays a thin shell around it.

use crate::agent::{ChatEvent, ChatOrchestrator, Conversation};
use crate::error::{Result, TutorbotError};
use crate::feedback::{FeedbackRecord, FeedbackStore, Rating};
use std::fs;
use std::path::{Path, PathBuf};

/// One interactive session
pub struct ChatSession {
    orchestrator: ChatOrchestrator,
    conversation: Conversation,
    feedback: FeedbackStore,
    transcript_file: PathBuf,
}

impl ChatSession {
    /// Create a session whose conversation starts with `greeting`
    pub fn new(
        orchestrator: ChatOrchestrator,
        greeting: impl Into<String>,
        feedback: FeedbackStore,
        transcript_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            conversation: Conversation::new(greeting),
            feedback,
            transcript_file: transcript_file.into(),
        }
    }

    /// Current conversation
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Send a message and stream the reply through `on_event`
    ///
    /// Returns the assistant's reply text.
    pub async fn send<F>(&mut self, message: &str, on_event: F) -> String
    where
        F: FnMut(ChatEvent),
    {
        let placeholder = Conversation::new(self.conversation.greeting().to_string());
        let current = std::mem::replace(&mut self.conversation, placeholder);
        self.conversation = self.orchestrator.respond(current, message, on_event).await;
        self.conversation
            .last()
            .map(|t| t.content.clone())
            .unwrap_or_default()
    }

    /// Start over from the greeting
    pub fn new_conversation(&mut self) {
        tracing::info!("Starting a new conversation");
        self.conversation.reset();
    }

    /// Rate an answer; `None` targets the latest one
    ///
    /// # Errors
    ///
    /// Returns error if the index is not an assistant turn or the log
    /// cannot be written
    pub fn rate(
        &self,
        index: Option<usize>,
        rating: Rating,
        comment: &str,
    ) -> Result<FeedbackRecord> {
        let index = match index {
            Some(i) => i,
            None => self.conversation.last_assistant_index().ok_or_else(|| {
                TutorbotError::Feedback("there is no answer to rate yet".to_string())
            })?,
        };
        self.feedback
            .record(&self.conversation, index, rating, comment)
    }

    /// Write the transcript to `path`, or to the configured file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save_transcript(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.unwrap_or(&self.transcript_file).to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut text = self.conversation.transcript();
        text.push('\n');
        fs::write(&path, text)?;
        tracing::info!("Saved transcript to {}", path.display());
        Ok(path)
    }
}
