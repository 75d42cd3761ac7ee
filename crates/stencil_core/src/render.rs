//! Tag tree evaluation.
//!
//! The [`Renderer`] walks a tag tree depth first. Text is copied verbatim,
//! partials are expanded through a [`PartialResolver`], and every tag is
//! evaluated inside the hook protocol:
//!
//! - **Variable**: the value's render override, or its scalar text. Text
//!   output of an escaping tag is HTML-escaped in HTML documents.
//! - **Section**: a render override takes over. Otherwise observers render
//!   the body once with themselves pushed, falsy values render nothing,
//!   sequences render the body once per element with the element pushed, and
//!   any other truthy value renders the body once with itself pushed.
//! - **Inverted section**: renders the body once, with the scope unchanged,
//!   when the value is falsy.
//!
//! Partial expansions and the templates expanded by render overrides count
//! against [`RenderConfig::max_depth`]. Section bodies of a static tree do
//! not.

use std::sync::Arc;

use tracing::debug;

use crate::config::RenderConfig;
use crate::content::{ContentType, Rendering};
use crate::error::{RenderError, RenderResult};
use crate::filter::FilterInvoker;
use crate::hook::HookCoordinator;
use crate::scope::ScopeChain;
use crate::tag::{Node, Tag, TagDescriptor, TagKind};
use crate::value::Value;

/// Source of the templates included by `{{> name}}`.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait PartialResolver: Send + Sync {
    /// Returns the compiled tag tree of the partial named `name`.
    fn resolve(&self, name: &str) -> RenderResult<Arc<Vec<Node>>>;
}

/// Evaluates tag trees.
///
/// A renderer holds no per-render state: each call builds its own scope
/// chain, so one renderer and one tree can serve concurrent renders.
#[derive(Clone)]
pub struct Renderer {
    config: RenderConfig,
    base: ScopeChain,
    partials: Option<Arc<dyn PartialResolver>>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Renderer {
    /// A renderer whose base context holds the standard library.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            base: ScopeChain::standard(),
            partials: None,
        }
    }

    /// Replaces the chain every render starts from.
    pub fn with_base_context(mut self, base: ScopeChain) -> Self {
        self.base = base;
        self
    }

    pub fn with_partials(mut self, partials: Arc<dyn PartialResolver>) -> Self {
        self.partials = Some(partials);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn base_context(&self) -> &ScopeChain {
        &self.base
    }

    /// Renders `nodes` with `value` pushed on top of the base context.
    pub fn render(&self, nodes: &[Node], value: Value) -> RenderResult<String> {
        let scope = self.base.extended(value);
        self.render_in(nodes, &scope)
    }

    /// Renders `nodes` against an explicit scope chain.
    pub fn render_in(&self, nodes: &[Node], scope: &ScopeChain) -> RenderResult<String> {
        debug!("Rendering {} nodes as {}", nodes.len(), self.config.content_type);
        self.render_nodes(nodes, scope, 0)
    }

    fn render_nodes(&self, nodes: &[Node], scope: &ScopeChain, depth: usize) -> RenderResult<String> {
        if depth > self.config.max_depth {
            return Err(RenderError::RecursionLimitExceeded {
                limit: self.config.max_depth,
            });
        }

        let mut output = String::new();
        for node in nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Tag(tag) => output.push_str(&self.render_tag(tag, scope, depth)?),
                Node::Partial(name) => output.push_str(&self.render_partial(name, scope, depth)?),
            }
        }
        Ok(output)
    }

    fn render_partial(&self, name: &str, scope: &ScopeChain, depth: usize) -> RenderResult<String> {
        let partials = self
            .partials
            .as_ref()
            .ok_or_else(|| RenderError::PartialNotFound(name.to_string()))?;
        let nodes = partials.resolve(name)?;
        debug!("Expanding partial {}", name);
        self.render_nodes(&nodes, scope, depth + 1)
    }

    fn render_tag(&self, tag: &Tag, scope: &ScopeChain, depth: usize) -> RenderResult<String> {
        let candidate = FilterInvoker::new(scope).evaluate(tag.expression())?;

        HookCoordinator::new(tag.descriptor()).observe(scope, candidate, |value| {
            let request = RenderRequest {
                renderer: self,
                tag,
                scope,
                depth,
            };
            let rendering = match (tag.kind(), value.render_override()) {
                (TagKind::InvertedSection, _) | (_, None) => request.render_default(value)?,
                (_, Some(render)) => render(&request)?,
            };
            Ok(rendering.embed(self.config.content_type, tag.escapes()))
        })
    }

    fn default_rendering(
        &self,
        tag: &Tag,
        value: &Value,
        scope: &ScopeChain,
        depth: usize,
    ) -> RenderResult<Rendering> {
        let content_type = self.config.content_type;
        match tag.kind() {
            TagKind::Variable => Ok(Rendering::text(value.render_text().unwrap_or_default())),
            TagKind::Section if value.as_observer().is_some() && !value.is_truthy() => {
                let text = self.render_nodes(tag.nodes(), &scope.extended(value.clone()), depth)?;
                Ok(Rendering::new(text, content_type))
            }
            TagKind::Section if !value.is_truthy() => Ok(Rendering::new(String::new(), content_type)),
            TagKind::Section => {
                let text = match value.as_sequence() {
                    Some(items) => {
                        let mut text = String::new();
                        for item in items {
                            let scope = scope.extended(item.clone());
                            text.push_str(&self.render_nodes(tag.nodes(), &scope, depth)?);
                        }
                        text
                    }
                    None => self.render_nodes(tag.nodes(), &scope.extended(value.clone()), depth)?,
                };
                Ok(Rendering::new(text, content_type))
            }
            TagKind::InvertedSection if value.is_truthy() => {
                Ok(Rendering::new(String::new(), content_type))
            }
            TagKind::InvertedSection => {
                let text = self.render_nodes(tag.nodes(), scope, depth)?;
                Ok(Rendering::new(text, content_type))
            }
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("base", &self.base)
            .field("partials", &self.partials.is_some())
            .finish()
    }
}

/// What a render override receives: the tag being rendered and where.
pub struct RenderRequest<'a> {
    renderer: &'a Renderer,
    tag: &'a Tag,
    scope: &'a ScopeChain,
    depth: usize,
}

impl<'a> RenderRequest<'a> {
    pub fn tag(&self) -> &TagDescriptor {
        self.tag.descriptor()
    }

    /// The scope chain of the tag.
    pub fn scope(&self) -> &ScopeChain {
        self.scope
    }

    /// Content type of the document being rendered.
    pub fn content_type(&self) -> ContentType {
        self.renderer.config.content_type
    }

    /// Raw source of the section body; `None` for variable tags.
    pub fn nested_source(&self) -> Option<&str> {
        self.tag.nested_source()
    }

    /// Renders the section body against `scope`. Variable tags have an empty
    /// body.
    pub fn render_inner(&self, scope: &ScopeChain) -> RenderResult<Rendering> {
        let text = self
            .renderer
            .render_nodes(self.tag.nodes(), scope, self.depth + 1)?;
        Ok(Rendering::new(text, self.content_type()))
    }

    /// Renders another tag tree from inside a render override.
    ///
    /// Overrides that expand templates must go through here rather than
    /// [`Renderer::render_in`], so that a template expanding itself fails
    /// with [`RenderError::RecursionLimitExceeded`].
    pub fn render_template(&self, nodes: &[Node], scope: &ScopeChain) -> RenderResult<Rendering> {
        let text = self.renderer.render_nodes(nodes, scope, self.depth + 1)?;
        Ok(Rendering::new(text, self.content_type()))
    }

    /// Renders `value` as the tag would if it had no render override.
    pub fn render_default(&self, value: &Value) -> RenderResult<Rendering> {
        self.renderer
            .default_rendering(self.tag, value, self.scope, self.depth)
    }
}
