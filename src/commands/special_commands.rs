//! Special commands parser for interactive chat mode
//!
//! Commands start with `/` and are case-insensitive; their arguments keep
//! the case the user typed. `exit` and `quit` also work without a slash.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
///
/// These act on the session instead of being sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Clear the conversation back to the greeting
    NewConversation,

    /// Rate an answer positively; `None` means the latest answer
    Like(Option<usize>),

    /// Rate an answer negatively, optionally with a comment
    Dislike {
        /// Turn index; `None` means the latest answer
        index: Option<usize>,
        /// Comment; `None` means ask for one
        comment: Option<String>,
    },

    /// Print the conversation with turn indices
    History,

    /// Write the transcript to a file; `None` uses the configured name
    Save(Option<PathBuf>),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input to the model
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if the input starts with `/` but
/// is not a known command, and `CommandError::UnsupportedArgument` if a
/// turn index is not a number.
///
/// # Examples
///
/// ```
/// use tutorbot::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/like 2").unwrap(), SpecialCommand::Like(Some(2)));
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "/new" | "/reset" | "/clear" => Ok(SpecialCommand::NewConversation),
        "/like" | "/up" => {
            if rest.is_empty() {
                Ok(SpecialCommand::Like(None))
            } else {
                parse_index("/like", rest).map(|i| SpecialCommand::Like(Some(i)))
            }
        }
        "/dislike" | "/down" => Ok(parse_dislike(rest)),
        "/history" | "/transcript" => Ok(SpecialCommand::History),
        "/save" => Ok(SpecialCommand::Save(if rest.is_empty() {
            None
        } else {
            Some(PathBuf::from(rest))
        })),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn parse_index(command: &str, arg: &str) -> Result<usize, CommandError> {
    arg.parse::<usize>()
        .map_err(|_| CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        })
}

/// `/dislike [n] [comment...]`: a leading number is the turn index
fn parse_dislike(rest: &str) -> SpecialCommand {
    if rest.is_empty() {
        return SpecialCommand::Dislike {
            index: None,
            comment: None,
        };
    }

    let (first, tail) = match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => (first, tail.trim()),
        None => (rest, ""),
    };

    match first.parse::<usize>() {
        Ok(index) => SpecialCommand::Dislike {
            index: Some(index),
            comment: (!tail.is_empty()).then(|| tail.to_string()),
        },
        Err(_) => SpecialCommand::Dislike {
            index: None,
            comment: Some(rest.to_string()),
        },
    }
}

/// Display help information for special commands
pub fn print_help() {
    println!(
        r#"
Chat Commands
=============

CONVERSATION:
  /new            - Start a new conversation (keeps only the greeting)
  /history        - Show the conversation with turn numbers
  /save [path]    - Save the transcript to a text file

FEEDBACK:
  /like [n]               - Rate answer n (default: latest) as helpful
  /dislike [n] [comment]  - Rate answer n (default: latest) as not helpful;
                            you are asked for a comment if none is given

SESSION:
  /help           - Show this help message
  /?              - Same as /help
  exit            - Exit interactive mode
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - Turn numbers are the ones shown by /history
"#
    );
}
