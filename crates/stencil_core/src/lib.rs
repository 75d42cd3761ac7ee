//! # stencil_core
//!
//! Evaluation engine for Stencil, a logic-less Mustache-family template
//! language.
//!
//! This crate renders compiled tag trees; compiling template source is the
//! job of `stencil_templates`.
//!
//! # Architecture
//!
//! - **Value**: capability-tagged datum: scalars, sequences, keyed
//!   collections and custom objects, optionally carrying a render override,
//!   a filter, or will/did hooks
//! - **ScopeChain**: persistent chain of lookup scopes and registered hooks
//! - **FilterInvoker**: resolves expressions and applies `f(x)` calls
//! - **HookCoordinator**: runs will hooks inner to outer and did hooks outer
//!   to inner around every tag
//! - **Renderer**: walks the tag tree and produces text
//!
//! # Example
//!
//! ```rust
//! use stencil_core::{Expression, Node, Renderer, Tag, Value};
//!
//! // <{{name}}>
//! let nodes = vec![
//!     Node::text("<"),
//!     Node::tag(Tag::variable(Expression::identifier("name"), true)),
//!     Node::text(">"),
//! ];
//!
//! let output = Renderer::default()
//!     .render(&nodes, Value::map([("name", "Arthur")]))
//!     .unwrap();
//! assert_eq!(output, "<Arthur>");
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod filter;
pub mod hook;
pub mod json;
pub mod render;
pub mod scope;
pub mod stdlib;
pub mod tag;
pub mod value;

// Re-export main types for convenience
pub use config::{RenderConfig, DEFAULT_MAX_DEPTH};
pub use content::{escape_html, ContentType, Rendering};
pub use error::{RenderError, RenderResult};
pub use filter::FilterInvoker;
pub use hook::HookCoordinator;
#[cfg(any(test, feature = "mock"))]
pub use render::MockPartialResolver;
pub use render::{PartialResolver, RenderRequest, Renderer};
pub use scope::ScopeChain;
pub use stdlib::standard_library;
pub use tag::{Expression, Node, Tag, TagDescriptor, TagKind};
pub use value::{
    DidRenderFn, FilterFn, Map, Observer, Position, RenderFn, Value, ValueKind, WillRenderFn,
};

/// Renders `nodes` against `value` with the default configuration.
pub fn render(nodes: &[Node], value: Value) -> RenderResult<String> {
    Renderer::default().render(nodes, value)
}
