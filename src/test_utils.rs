//! Test utilities for Tutorbot
//!
//! Temporary directories, a ready-to-validate configuration and an
//! assertion helper for error messages.

use crate::config::Config;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// The directory is removed when the returned value is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Assert that a result is an error whose message contains `expected`
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration with an API key set and the feedback log inside `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.provider.gemini.api_key = Some("test-api-key".to_string());
    config.feedback.path = dir.path().join("feedback.csv");
    config.chat.transcript_file = dir.path().join("chatbot_history.txt");
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TutorbotError;

    #[test]
    fn test_assert_error_contains_success() {
        let result: crate::error::Result<()> =
            Err(TutorbotError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert!(config.validate().is_ok());
        assert!(config.feedback.path.starts_with(dir.path()));
    }
}
