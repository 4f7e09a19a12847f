//! Error types for the testsmith engine.
//!
//! All fallible public APIs return [`Result`] with [`TestsmithError`].
//! Per-unit failures (a single malformed declaration) are not surfaced
//! through this type; they become diagnostics on the suite result so that
//! one broken unit never aborts generation for its siblings.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TestsmithError>;

/// Errors produced by analysis, synthesis, and emission.
#[derive(Debug, Error)]
pub enum TestsmithError {
    /// Malformed source text. Fatal for the offending unit only.
    #[error("parse error in {file} at {line}:{column}: {message}")]
    Parse {
        /// Owning file path of the source text.
        file: String,
        /// 1-indexed line of the first syntax error.
        line: usize,
        /// 1-indexed column of the first syntax error.
        column: usize,
        /// Human-readable description.
        message: String,
    },

    /// The declared language tag has no registered implementation.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter parser or query failure.
    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    /// Invalid option values or conflicting mock bindings. Fatal for the
    /// affected suite, never for sibling suites.
    #[error("configuration error: {0}")]
    Config(String),

    /// A rendered case cannot satisfy the output constraints.
    #[error("emission error: {0}")]
    Emission(String),

    /// I/O failure while writing rendered output. Reported synchronously
    /// to the caller, never retried internally.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestsmithError {
    /// Build a parse error from a tree-sitter position (0-indexed row/column).
    pub fn parse_at(file: impl Into<String>, row: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line: row + 1,
            column: column + 1,
            message: message.into(),
        }
    }
}
