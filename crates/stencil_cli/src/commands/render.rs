//! Render command - Render a template file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use stencil_core::{ContentType, RenderConfig, Value};
use stencil_templates::{load_config, load_data, TemplateRepository, DEFAULT_EXTENSION};

#[derive(Args)]
pub struct RenderArgs {
    /// Template file to render
    template: PathBuf,

    /// JSON or YAML data file (by extension)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory holding partials (defaults to the template's directory)
    #[arg(short, long)]
    partials: Option<PathBuf>,

    /// Render as plain text: nothing is HTML-escaped
    #[arg(long)]
    text: bool,

    /// YAML render configuration
    #[arg(short, long, env = "STENCIL_CONFIG")]
    config: Option<PathBuf>,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    info!("Rendering template: {:?}", args.template);
    let output = render(&args)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {} bytes to {:?}", output.len(), path);
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn render(args: &RenderArgs) -> Result<String> {
    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("Failed to load config {:?}", path))?,
        None => RenderConfig::default(),
    };
    if args.text {
        config = config.with_content_type(ContentType::Text);
    }

    let source = fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template {:?}", args.template))?;

    let data = match &args.data {
        Some(path) => load_data(path).with_context(|| format!("Failed to load data {:?}", path))?,
        None => Value::empty(),
    };

    let repository = partials_repository(args).with_config(config);
    let template = repository
        .template_from_str(&source)
        .with_context(|| format!("Failed to compile {:?}", args.template))?;
    debug!("Template content type: {}", template.content_type());

    template
        .render(data)
        .with_context(|| format!("Failed to render {:?}", args.template))
}

fn partials_repository(args: &RenderArgs) -> TemplateRepository {
    let extension = args
        .template
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    let root = match &args.partials {
        Some(dir) => dir.clone(),
        None => args
            .template
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    TemplateRepository::from_directory(root, extension)
}
