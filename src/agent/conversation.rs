//! Conversation state for a chat session
//!
//! A conversation is an ordered, append-only list of turns that always
//! starts with the configured greeting. It is an explicit value: the
//! orchestrator takes one and hands back the updated one.

use crate::error::TutorbotError;
use crate::providers::Content;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// The model
    Assistant,
}

impl Role {
    /// Wire name of the role (`user` / `assistant`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used in transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TutorbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" | "model" => Ok(Role::Assistant),
            other => Err(TutorbotError::Config(format!("Unknown role: {}", other))),
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who wrote it
    pub role: Role,
    /// Text content
    pub content: String,
}

impl Turn {
    /// Create a turn
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Translate into a generation request content block
    pub fn to_content(&self) -> Content {
        Content::text(self.role.as_str(), self.content.clone())
    }
}

/// Ordered history of a chat session
///
/// # Examples
///
/// ```
/// use tutorbot::agent::{Conversation, Turn};
///
/// let mut conversation = Conversation::new("Hello!");
/// conversation.append(Turn::user("What is Rust?"));
/// assert_eq!(conversation.len(), 2);
///
/// conversation.reset();
/// assert_eq!(conversation.len(), 1);
/// assert_eq!(conversation.turns()[0].content, "Hello!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
    greeting: String,
}

impl Conversation {
    /// Start a conversation holding only the greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            turns: vec![Turn::assistant(greeting.clone())],
            greeting,
        }
    }

    /// Append a turn at the end
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop every turn and start over from the greeting
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::assistant(self.greeting.clone()));
    }

    /// Iterate turns in order
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when there are no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turn at `index`
    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    /// Most recent turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The greeting this conversation resets to
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Indices of every assistant turn, oldest first
    pub fn assistant_indices(&self) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.role == Role::Assistant)
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the most recent assistant turn
    pub fn last_assistant_index(&self) -> Option<usize> {
        self.turns.iter().rposition(|t| t.role == Role::Assistant)
    }

    /// Markdown transcript, one `**Label**: content` block per turn
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("**{}**: {}", t.role.label(), t.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Full history as generation request contents
    pub fn to_contents(&self) -> Vec<Content> {
        self.turns.iter().map(Turn::to_content).collect()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
