//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod check;
pub mod render;

/// Stencil - logic-less templates
#[derive(Parser)]
#[command(name = "stencil")]
#[command(version, about = "Stencil - logic-less Mustache-family templates")]
#[command(long_about = r#"
Stencil renders Mustache-family templates against JSON or YAML data.

COMMANDS:
  render  → Render a template file and print the result
  check   → Compile every template in a directory

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Compile failure
  4 - Render failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a template against a data file
    Render(render::RenderArgs),

    /// Compile every template in a directory
    Check(check::CheckArgs),
}
