//! Error types for rendering.

use thiserror::Error;

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort a render call.
///
/// Any of these discards the output accumulated so far: a render either
/// produces its complete text or fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Filter not callable: {name}")]
    FilterNotCallable { name: String },

    #[error("Custom rendering failed: {0}")]
    CustomRenderFailure(String),

    #[error("Recursion limit exceeded: more than {limit} nested renderings")]
    RecursionLimitExceeded { limit: usize },

    #[error("Argument mismatch in filter {filter}: {message}")]
    ArgumentMismatch { filter: String, message: String },

    #[error("Partial not found: {0}")]
    PartialNotFound(String),

    #[error("Invalid partial {name}: {message}")]
    InvalidPartial { name: String, message: String },
}

impl RenderError {
    /// Failure reported by a render override, filter or hook.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::CustomRenderFailure(message.into())
    }

    pub fn argument_mismatch(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArgumentMismatch {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RenderError::FilterNotCallable {
            name: "f".to_string(),
        };
        assert_eq!(err.to_string(), "Filter not callable: f");

        let err = RenderError::custom("boom");
        assert_eq!(err, RenderError::CustomRenderFailure("boom".to_string()));
        assert_eq!(err.to_string(), "Custom rendering failed: boom");

        let err = RenderError::RecursionLimitExceeded { limit: 8 };
        assert!(err.to_string().contains("more than 8"));
    }
}
