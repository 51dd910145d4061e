//! Errors raised while building or compiling a request.

use thiserror::Error;

/// Errors raised by the query builder and the query grammars.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A builder method was called with arguments it cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The grammar has no way to express the request.
    #[error("the {grammar} grammar does not support {feature}")]
    Unsupported {
        /// Grammar name.
        grammar: &'static str,
        /// What was asked for.
        feature: String,
    },
}

/// Result type for builder and grammar operations.
pub type Result<T> = std::result::Result<T, Error>;
