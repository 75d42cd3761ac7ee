//! Named template sources and the partials they include.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stencil_core::{Node, PartialResolver, RenderConfig, RenderError, RenderResult};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::loader::TemplateLoader;
use crate::parser::{CompiledTemplate, TemplateParser};
use crate::template::Template;

/// A set of named templates that can include each other with `{{> name}}`.
///
/// Sources are registered in memory or read from a directory; sources
/// registered in memory shadow files of the same name. Compiled trees are
/// cached, so each template is compiled once however often it is rendered or
/// included. Handles are cheap to clone and share one cache.
#[derive(Clone)]
pub struct TemplateRepository {
    inner: Arc<RepositoryInner>,
    config: RenderConfig,
}

struct RepositoryInner {
    loader: Option<TemplateLoader>,
    parser: TemplateParser,
    state: RwLock<RepositoryState>,
}

#[derive(Default)]
struct RepositoryState {
    sources: HashMap<String, String>,
    cache: HashMap<String, CompiledTemplate>,
    /// Bumped by every registration. A tree compiled from an older
    /// generation is never cached.
    generation: u64,
}

/// Result of looking a name up before compilation.
enum Lookup {
    Cached(CompiledTemplate),
    Source { source: String, generation: u64 },
}

/// Outcome of compiling one template during [`TemplateRepository::check_all`].
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub error: Option<TemplateError>,
}

impl CheckResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Default for TemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRepository {
    /// An in-memory repository.
    pub fn new() -> Self {
        Self::with_loader(None)
    }

    /// A repository reading `<name>.<extension>` files under `root`.
    pub fn from_directory(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::with_loader(Some(TemplateLoader::new(root).with_extension(extension)))
    }

    fn with_loader(loader: Option<TemplateLoader>) -> Self {
        Self {
            inner: Arc::new(RepositoryInner {
                loader,
                parser: TemplateParser::new(),
                state: RwLock::new(RepositoryState::default()),
            }),
            config: RenderConfig::default(),
        }
    }

    /// Configuration of the templates this handle hands out.
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Registers `source` under `name`, replacing any previous version.
    pub fn register_source(&self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        debug!("Registering template source: {}", name);
        let mut state = self.write_state();
        state.generation += 1;
        state.cache.remove(&name);
        state.sources.insert(name, source.into());
    }

    /// The template named `name`, with partials resolved in this repository.
    pub fn template(&self, name: &str) -> TemplateResult<Template> {
        let compiled = self.compiled(name)?;
        Ok(self.wrap(compiled))
    }

    /// Compiles `source` as an anonymous template whose partials are
    /// resolved in this repository.
    pub fn template_from_str(&self, source: &str) -> TemplateResult<Template> {
        let compiled = self.inner.parser.compile(source)?;
        Ok(self.wrap(compiled))
    }

    /// Names of every known template, sorted.
    pub fn names(&self) -> TemplateResult<Vec<String>> {
        let mut names: BTreeSet<String> = self.read_state().sources.keys().cloned().collect();
        if let Some(loader) = &self.inner.loader {
            names.extend(loader.discover()?);
        }
        Ok(names.into_iter().collect())
    }

    /// Compiles every known template.
    pub fn check_all(&self) -> TemplateResult<Vec<CheckResult>> {
        Ok(self
            .names()?
            .into_iter()
            .map(|name| {
                let error = self.compiled(&name).err();
                CheckResult { name, error }
            })
            .collect())
    }

    /// Compiled tree of `name`, from the cache when possible.
    pub fn compiled(&self, name: &str) -> TemplateResult<CompiledTemplate> {
        match self.lookup(name)? {
            Lookup::Cached(compiled) => Ok(compiled),
            Lookup::Source { source, generation } => {
                let compiled = self.inner.parser.compile(&source)?;
                debug!("Compiled template: {}", name);
                self.store(name, generation, compiled.clone());
                Ok(compiled)
            }
        }
    }

    fn lookup(&self, name: &str) -> TemplateResult<Lookup> {
        let (registered, generation) = {
            let state = self.read_state();
            if let Some(compiled) = state.cache.get(name) {
                return Ok(Lookup::Cached(compiled.clone()));
            }
            (state.sources.get(name).cloned(), state.generation)
        };
        let source = match (registered, &self.inner.loader) {
            (Some(source), _) => source,
            (None, Some(loader)) => loader.load(name)?,
            (None, None) => return Err(TemplateError::NotFound(name.to_string())),
        };
        Ok(Lookup::Source { source, generation })
    }

    /// Caches `compiled` unless a source was registered since `generation`.
    fn store(&self, name: &str, generation: u64, compiled: CompiledTemplate) -> bool {
        let mut state = self.write_state();
        if state.generation != generation {
            debug!("Template {} changed while compiling, not caching", name);
            return false;
        }
        state.cache.insert(name.to_string(), compiled);
        true
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RepositoryState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RepositoryState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn wrap(&self, compiled: CompiledTemplate) -> Template {
        Template::new(compiled, self.config.clone()).with_partials(Arc::new(self.clone()))
    }
}

impl PartialResolver for TemplateRepository {
    fn resolve(&self, name: &str) -> RenderResult<Arc<Vec<Node>>> {
        match self.compiled(name) {
            Ok(compiled) => Ok(compiled.nodes),
            Err(TemplateError::NotFound(_)) => Err(RenderError::PartialNotFound(name.to_string())),
            Err(e) => Err(RenderError::InvalidPartial {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for TemplateRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRepository")
            .field("loader", &self.inner.loader)
            .field("config", &self.config)
            .finish()
    }
}
