//! Compiled templates.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use stencil_core::{ContentType, Node, PartialResolver, RenderConfig, Renderer, ScopeChain, Value};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::parser::{CompiledTemplate, TemplateParser};

/// A compiled template, ready to render.
///
/// Every render starts from the template's base context: the standard
/// library, then whatever was added with [`Template::extend_base_context`]
/// and [`Template::register_hook`].
#[derive(Clone)]
pub struct Template {
    nodes: Arc<Vec<Node>>,
    config: RenderConfig,
    base: ScopeChain,
    partials: Option<Arc<dyn PartialResolver>>,
}

impl Template {
    /// Wraps compiled nodes. A content type pragma overrides `config`.
    pub fn new(compiled: CompiledTemplate, config: RenderConfig) -> Self {
        let config = match compiled.content_type {
            Some(content_type) => config.with_content_type(content_type),
            None => config,
        };
        Self {
            nodes: compiled.nodes,
            config,
            base: ScopeChain::standard(),
            partials: None,
        }
    }

    pub fn with_partials(mut self, partials: Arc<dyn PartialResolver>) -> Self {
        self.partials = Some(partials);
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn content_type(&self) -> ContentType {
        self.config.content_type
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn base_context(&self) -> &ScopeChain {
        &self.base
    }

    /// Pushes `value` on the base context. Values carrying hooks are
    /// registered as hooks too.
    pub fn extend_base_context(&mut self, value: Value) {
        self.base = self.base.extended(value);
    }

    /// Registers `hook` on the base context without making it a lookup scope.
    pub fn register_hook(&mut self, hook: Value) {
        self.base = self.base.with_hook(hook);
    }

    /// Renders the template with `value` as the innermost scope.
    pub fn render(&self, value: Value) -> TemplateResult<String> {
        debug!("Rendering template as {}", self.config.content_type);
        Ok(self.renderer().render(&self.nodes, value)?)
    }

    /// Renders serializable host data.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, data: &T) -> TemplateResult<String> {
        self.render(Value::from_serialize(data)?)
    }

    fn renderer(&self) -> Renderer {
        let renderer = Renderer::new(self.config.clone()).with_base_context(self.base.clone());
        match &self.partials {
            Some(partials) => renderer.with_partials(Arc::clone(partials)),
            None => renderer,
        }
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let compiled = TemplateParser::new().compile(source)?;
        Ok(Self::new(compiled, RenderConfig::default()))
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("nodes", &self.nodes.len())
            .field("config", &self.config)
            .field("partials", &self.partials.is_some())
            .finish()
    }
}
