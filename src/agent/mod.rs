//! Agent module for Tutorbot
//!
//! This module contains the conversation state and the orchestrator that
//! turns a user message into a streamed, optionally tool-assisted reply.

pub mod conversation;
pub mod orchestrator;

pub use conversation::{Conversation, Role, Turn};
pub use orchestrator::{ChatEvent, ChatOrchestrator};
