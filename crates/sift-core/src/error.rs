//! Error types for sift-core.

use thiserror::Error;

/// Result type for sift-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sift-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Path has an extension no extractor knows how to handle.
    #[error("unknown extension for extracting code: '{0}'")]
    UnsupportedFormat(String),

    /// Notebook document failed to parse as JSON.
    #[error("malformed notebook document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// Source text failed to parse.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// An expression or statement failed to evaluate.
    #[error("execution error: {0}")]
    Execution(String),

    /// Execution of a loaded unit failed. Wraps the underlying cause
    /// with the unit's display name so traces point at the right file.
    #[error("execution of '{unit}' failed: {source}")]
    Runtime {
        unit: String,
        #[source]
        source: Box<Error>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a syntax error for a 1-based source line.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Wrap an execution failure with the display name of the unit
    /// that was being loaded.
    pub fn runtime(unit: impl Into<String>, cause: Error) -> Self {
        Error::Runtime {
            unit: unit.into(),
            source: Box::new(cause),
        }
    }
}
