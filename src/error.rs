//! Error types for mturkish operations.

use thiserror::Error;

use crate::answer::AnswerError;

/// Errors that can occur while talking to the Task Service or shaping its
/// results.
///
/// Every variant is fatal to the command that produced it; nothing in this
/// crate retries or downgrades an error to a warning.
#[derive(Debug, Error)]
pub enum MturkError {
    /// A batch input line was not valid JSON.
    #[error("invalid input on line {line}: {source}")]
    InvalidInput {
        /// 1-based line number within the batch input.
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A JMESPath expression failed to compile or evaluate.
    #[error("invalid query `{expression}`: {message}")]
    Query { expression: String, message: String },

    /// An assignment's answer document could not be flattened.
    #[error("answer of assignment {assignment_id} is malformed: {source}")]
    Answer {
        assignment_id: String,
        #[source]
        source: AnswerError,
    },

    /// The Task Service rejected or failed a request.
    #[error("{operation} failed: {message}")]
    Service {
        /// Name of the remote operation, e.g. `ListHITs`.
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A result item lacked a field the command needed.
    #[error("{context} is missing field `{field}`")]
    MissingField {
        field: &'static str,
        context: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MturkError {
    /// Builds a [`MturkError::Service`] from any SDK error, keeping it as the
    /// error source.
    pub fn service<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Service {
            operation,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type for mturkish operations.
pub type Result<T> = std::result::Result<T, MturkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_names_line() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = MturkError::InvalidInput { line: 3, source };
        assert!(err.to_string().starts_with("invalid input on line 3"));
    }

    #[test]
    fn test_service_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "socket timed out");
        let err = MturkError::service("ListHITs", io);
        assert_eq!(err.to_string(), "ListHITs failed: socket timed out");
        assert!(std::error::Error::source(&err).is_some());
    }
}
