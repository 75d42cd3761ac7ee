//! Content types and rendered fragments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of rendered text, governing escaping at each boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Plain text: escaped when embedded in HTML.
    Text,
    /// HTML: never escaped again.
    #[default]
    Html,
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rendered fragment tagged with its content type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendering {
    pub text: String,
    pub content_type: ContentType,
}

impl Rendering {
    pub fn new(text: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            text: text.into(),
            content_type,
        }
    }

    /// Text rendering, escaped when embedded in HTML.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, ContentType::Text)
    }

    /// HTML rendering, embedded verbatim.
    pub fn html(text: impl Into<String>) -> Self {
        Self::new(text, ContentType::Html)
    }

    /// Converts the fragment for embedding into a document of `target` type.
    ///
    /// Only text embedded into HTML through an escaping tag is escaped.
    pub fn embed(self, target: ContentType, escape: bool) -> String {
        if escape && target == ContentType::Html && self.content_type == ContentType::Text {
            escape_html(&self.text)
        } else {
            self.text
        }
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
