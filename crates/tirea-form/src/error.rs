//! Error types for tirea-form operations.
//!
//! Reducers are total and never fail; errors only surface from parsing field
//! paths, decoding action records and replaying store history.

use thiserror::Error;

/// Result type alias for tirea-form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Errors produced while parsing a field path string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string was empty.
    #[error("field path is empty")]
    Empty,

    /// A key segment between separators was empty.
    #[error("empty segment at position {position} in `{path}`")]
    EmptySegment {
        /// The offending path.
        path: String,
        /// Byte offset of the empty segment.
        position: usize,
    },

    /// A `[` without a matching `]`.
    #[error("unclosed bracket in `{path}`")]
    UnclosedBracket {
        /// The offending path.
        path: String,
    },

    /// Bracket contents were not a non-negative integer.
    #[error("invalid array index `{index}` in `{path}`")]
    InvalidIndex {
        /// The offending path.
        path: String,
        /// The bracket contents.
        index: String,
    },

    /// The path started with an index instead of a key.
    #[error("path `{path}` must start with a key")]
    LeadingIndex {
        /// The offending path.
        path: String,
    },

    /// A character that cannot appear at this position.
    #[error("unexpected character at position {position} in `{path}`")]
    UnexpectedCharacter {
        /// The offending path.
        path: String,
        /// Byte offset of the character.
        position: usize,
    },
}

/// Errors that can occur during tirea-form operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field path could not be parsed.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Replay index past the end of the recorded history.
    #[error("invalid replay index: {index}, history length: {len}")]
    InvalidReplayIndex {
        /// Requested index.
        index: usize,
        /// Number of recorded actions.
        len: usize,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FormError::from(PathError::UnclosedBracket {
            path: "items[0".into(),
        });
        assert_eq!(err.to_string(), "unclosed bracket in `items[0`");

        let err = FormError::InvalidReplayIndex { index: 4, len: 2 };
        assert!(err.to_string().contains("history length: 2"));
    }
}
