//! Render configuration.

use serde::{Deserialize, Serialize};

use crate::content::ContentType;

/// Default bound on nested renderings (sections, partials, overrides).
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings applied to a whole render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Content type of the rendered document. Text output of escaping tags
    /// is HTML-escaped only in HTML documents.
    pub content_type: ContentType,
    /// Maximum nesting of section bodies, partials and override renderings.
    pub max_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            content_type: ContentType::Html,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for plain text documents: nothing is escaped.
    pub fn text() -> Self {
        Self::default().with_content_type(ContentType::Text)
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
