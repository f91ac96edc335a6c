//! Error types for the expression service.

/// Errors from tokenizing, parsing, or evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("malformed number '{text}' at offset {offset}")]
    MalformedNumber { text: String, offset: usize },

    #[error("unexpected token '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: String,
    },

    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("empty expression")]
    Empty,

    #[error("no interpretation for variable <{0}>")]
    UnresolvedVariable(String),
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, ExprError>;
