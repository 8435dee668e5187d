//! Feedback log for rated answers
//!
//! Ratings are appended to a CSV file with the columns
//! `timestamp, user_question, ai_answer, rating, feedback_text`. A new file
//! starts with a UTF-8 byte order mark and the header row; later writes only
//! append rows. There is no locking.

use crate::agent::{Conversation, Role};
use crate::error::{Result, TutorbotError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Thumbs up or thumbs down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// The answer was helpful
    Positive,
    /// The answer fell short
    Negative,
}

impl Rating {
    /// Value stored in the `rating` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Positive => "positive",
            Rating::Negative => "negative",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = TutorbotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "like" | "up" => Ok(Rating::Positive),
            "negative" | "dislike" | "down" => Ok(Rating::Negative),
            other => Err(TutorbotError::Feedback(format!("Unknown rating: {}", other))),
        }
    }
}

/// One row of the feedback log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Local time the rating was given
    pub timestamp: String,
    /// The question that preceded the rated answer
    pub user_question: String,
    /// The rated answer
    pub ai_answer: String,
    /// The rating
    pub rating: Rating,
    /// Free-text comment, possibly empty
    pub feedback_text: String,
}

impl FeedbackRecord {
    /// Build a record for the assistant turn at `index`
    ///
    /// The question is the turn right before it, or empty for the greeting
    /// at index 0.
    ///
    /// # Errors
    ///
    /// Returns error if `index` is out of range or is not an assistant turn
    pub fn from_conversation(
        conversation: &Conversation,
        index: usize,
        rating: Rating,
        comment: &str,
    ) -> Result<Self> {
        let answer = conversation.get(index).ok_or_else(|| {
            TutorbotError::Feedback(format!(
                "turn {} does not exist (conversation has {} turns)",
                index,
                conversation.len()
            ))
        })?;
        if answer.role != Role::Assistant {
            return Err(TutorbotError::Feedback(format!(
                "turn {} is a user message, not an answer",
                index
            ))
            .into());
        }

        let question = match index {
            0 => String::new(),
            i => conversation
                .get(i - 1)
                .map(|t| t.content.clone())
                .unwrap_or_default(),
        };

        Ok(Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            user_question: question,
            ai_answer: answer.content.clone(),
            rating,
            feedback_text: comment.trim().to_string(),
        })
    }
}

/// Append-only CSV feedback log
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    /// Create a store backed by `path`; nothing is touched until the first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rate the assistant turn at `index` and append the record
    ///
    /// # Errors
    ///
    /// Returns error for a bad index or if the log cannot be written
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tutorbot::agent::{Conversation, Turn};
    /// use tutorbot::feedback::{FeedbackStore, Rating};
    ///
    /// let mut conversation = Conversation::new("Hi!");
    /// conversation.append(Turn::user("What is a trait?"));
    /// conversation.append(Turn::assistant("A set of shared behavior."));
    ///
    /// let store = FeedbackStore::new("feedback.csv");
    /// store.record(&conversation, 2, Rating::Positive, "").unwrap();
    /// ```
    pub fn record(
        &self,
        conversation: &Conversation,
        index: usize,
        rating: Rating,
        comment: &str,
    ) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::from_conversation(conversation, index, rating, comment)?;
        self.append(&record)?;
        tracing::info!(
            "Recorded {} feedback for turn {} in {}",
            rating,
            index,
            self.path.display()
        );
        Ok(record)
    }

    /// Append a prepared record
    ///
    /// # Errors
    ///
    /// Returns error if the file or its directory cannot be created or written
    pub fn append(&self, record: &FeedbackRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;
        if is_new {
            file.write_all(UTF8_BOM)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Load every record in the log, oldest first
    ///
    /// A missing file reads as an empty log.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path)?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(body);

        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: FeedbackRecord = row.map_err(|e| {
                TutorbotError::Feedback(format!(
                    "Malformed row in {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
