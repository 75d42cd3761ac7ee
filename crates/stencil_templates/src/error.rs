//! Error types for template compilation and loading.

use stencil_core::RenderError;
use thiserror::Error;

/// Result type alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors found while compiling template source. Lines are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unclosed tag on line {line}")]
    UnclosedTag { line: usize },

    #[error("Unclosed section {name} opened on line {line}")]
    UnclosedSection { name: String, line: usize },

    #[error("Mismatched closing tag on line {line}: expected {expected}, found {found}")]
    MismatchedClose {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Unexpected closing tag {name} on line {line}")]
    UnexpectedClose { name: String, line: usize },

    #[error("Empty tag on line {line}")]
    EmptyTag { line: usize },

    #[error("Invalid expression `{expression}` on line {line}")]
    InvalidExpression { expression: String, line: usize },

    #[error("Invalid set delimiters tag on line {line}")]
    InvalidDelimiters { line: usize },
}

impl CompileError {
    /// Line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            Self::UnclosedTag { line }
            | Self::UnclosedSection { line, .. }
            | Self::MismatchedClose { line, .. }
            | Self::UnexpectedClose { line, .. }
            | Self::EmptyTag { line }
            | Self::InvalidExpression { line, .. }
            | Self::InvalidDelimiters { line } => *line,
        }
    }
}

/// Errors that can occur while loading, compiling or rendering templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template name: {0}")]
    InvalidName(String),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
