//! # stencil_templates
//!
//! Template compilation and loading for Stencil.
//!
//! This crate turns template source into the tag trees rendered by
//! `stencil_core`, and manages named templates:
//!
//! - **TemplateParser**: source text to tag trees, with line-numbered errors
//! - **Template**: a compiled template with its base context
//! - **TemplateRepository**: named templates from memory or a directory,
//!   resolving `{{> partial}}` includes
//!
//! ## Example
//!
//! ```rust
//! use stencil_core::Value;
//! use stencil_templates::{Template, TemplateRepository};
//!
//! let template: Template = "Hello {{name}}!".parse().unwrap();
//! let output = template.render(Value::map([("name", "Arthur")])).unwrap();
//! assert_eq!(output, "Hello Arthur!");
//!
//! let repository = TemplateRepository::new();
//! repository.register_source("greeting", "Hello {{name}}");
//! let page = repository.template_from_str("{{> greeting}}!").unwrap();
//! assert_eq!(page.render(Value::map([("name", "Ford")])).unwrap(), "Hello Ford!");
//! ```

pub mod data;
pub mod error;
pub mod loader;
pub mod parser;
pub mod repository;
pub mod template;

pub use data::{load_config, load_data};
pub use error::{CompileError, CompileResult, TemplateError, TemplateResult};
pub use loader::{TemplateLoader, DEFAULT_EXTENSION};
pub use parser::{parse, CompiledTemplate, TemplateParser};
pub use repository::{CheckResult, TemplateRepository};
pub use template::Template;
