//! Tag trees: the compiled form of a template.
//!
//! Tag trees are produced by a compiler outside this crate and are immutable
//! once built. Tags are reference counted so a compiled tree can be shared by
//! any number of concurrent renders.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Kind of a template directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagKind {
    Variable,
    Section,
    InvertedSection,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Section => write!(f, "section"),
            Self::InvertedSection => write!(f, "inverted section"),
        }
    }
}

/// An expression inside a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// `.`: the innermost scope value.
    Implicit,
    /// A name resolved by walking the scope chain.
    Identifier(String),
    /// `base.key`: keyed lookup on an already resolved value.
    Scoped { base: Box<Expression>, key: String },
    /// `filter(argument)`.
    Filtered {
        filter: Box<Expression>,
        argument: Box<Expression>,
    },
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Builds `a.b.c` from its components.
    pub fn path<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut components = components.into_iter();
        let mut expression = match components.next() {
            Some(first) => Self::Identifier(first.into()),
            None => return Self::Implicit,
        };
        for key in components {
            expression = expression.scoped(key);
        }
        expression
    }

    pub fn scoped(self, key: impl Into<String>) -> Self {
        Self::Scoped {
            base: Box::new(self),
            key: key.into(),
        }
    }

    pub fn filtered(filter: Expression, argument: Expression) -> Self {
        Self::Filtered {
            filter: Box::new(filter),
            argument: Box::new(argument),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implicit => write!(f, "."),
            Self::Identifier(name) => write!(f, "{}", name),
            Self::Scoped { base, key } => match base.as_ref() {
                Self::Implicit => write!(f, ".{}", key),
                base => write!(f, "{}.{}", base, key),
            },
            Self::Filtered { filter, argument } => write!(f, "{}({})", filter, argument),
        }
    }
}

/// The view of a tag handed to hooks and render overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
    pub kind: TagKind,
    /// Expression as written in the template.
    pub expression: String,
    /// Raw template source between the section delimiters.
    pub nested_source: Option<String>,
}

/// One template directive.
#[derive(Debug, Clone)]
pub struct Tag {
    descriptor: TagDescriptor,
    expression: Expression,
    escaped: bool,
    nodes: Vec<Node>,
}

impl Tag {
    /// A `{{name}}` tag, or `{{{name}}}` when `escaped` is false.
    pub fn variable(expression: Expression, escaped: bool) -> Self {
        Self {
            descriptor: TagDescriptor {
                kind: TagKind::Variable,
                expression: expression.to_string(),
                nested_source: None,
            },
            expression,
            escaped,
            nodes: Vec::new(),
        }
    }

    /// A `{{#name}}...{{/name}}` tag.
    pub fn section(expression: Expression, nodes: Vec<Node>, source: impl Into<String>) -> Self {
        Self::block(TagKind::Section, expression, nodes, source.into())
    }

    /// A `{{^name}}...{{/name}}` tag.
    pub fn inverted_section(
        expression: Expression,
        nodes: Vec<Node>,
        source: impl Into<String>,
    ) -> Self {
        Self::block(TagKind::InvertedSection, expression, nodes, source.into())
    }

    fn block(kind: TagKind, expression: Expression, nodes: Vec<Node>, source: String) -> Self {
        Self {
            descriptor: TagDescriptor {
                kind,
                expression: expression.to_string(),
                nested_source: Some(source),
            },
            expression,
            escaped: true,
            nodes,
        }
    }

    pub fn kind(&self) -> TagKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &TagDescriptor {
        &self.descriptor
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Whether text output of this tag is HTML-escaped.
    pub fn escapes(&self) -> bool {
        self.escaped
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nested_source(&self) -> Option<&str> {
        self.descriptor.nested_source.as_deref()
    }
}

/// An element of a tag tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// Literal template text, emitted verbatim.
    Text(String),
    Tag(Arc<Tag>),
    /// `{{> name}}`: a template included by name.
    Partial(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tag(tag: Tag) -> Self {
        Self::Tag(Arc::new(tag))
    }

    pub fn partial(name: impl Into<String>) -> Self {
        Self::Partial(name.into())
    }
}

impl From<Tag> for Node {
    fn from(tag: Tag) -> Self {
        Self::tag(tag)
    }
}
