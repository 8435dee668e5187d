//! Tutorbot - course assistant chatbot library
//!
//! This library provides the pieces behind the `tutorbot` CLI: a streaming
//! chat orchestrator over a hosted generative model, a weather tool the
//! model can call mid-answer, and an append-only feedback log for rating
//! answers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Conversation state and the chat orchestrator
//! - `providers`: Generation provider abstraction and the Gemini client
//! - `tools`: Tool registry and the weather tool
//! - `feedback`: CSV feedback log
//! - `commands`: CLI command handlers and the chat REPL
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use tutorbot::{ChatOrchestrator, Config, Conversation};
//! use tutorbot::providers::create_provider;
//! use tutorbot::tools::build_registry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let orchestrator =
//!         ChatOrchestrator::new(create_provider(&config.provider)?, build_registry(&config.tools)?);
//!
//!     let conversation = orchestrator
//!         .respond(Conversation::new("Hi!"), "What is a lifetime?", |_| {})
//!         .await;
//!     println!("{}", conversation.transcript());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod feedback;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use agent::{ChatEvent, ChatOrchestrator, Conversation, Role, Turn};
pub use config::Config;
pub use error::{Result, TutorbotError};
pub use feedback::{FeedbackRecord, FeedbackStore, Rating};

#[cfg(test)]
pub mod test_utils;
