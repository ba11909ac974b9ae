//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// svgpack - package a web application into a single SVG document
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Source directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Output document path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Config file path (default: svgpack.toml)
    #[arg(short = 'C', long, default_value = "svgpack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one packaging pass and write the composite document
    #[command(visible_alias = "b")]
    Build {
        /// Minify bundled JS/CSS (best-effort)
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,

        /// Treat size-ceiling crossings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Start development server with rebuild-on-change and live preview
    #[command(visible_alias = "s")]
    Serve {
        /// HTTP preview port
        #[arg(short, long)]
        port: Option<u16>,

        /// WebSocket push port
        #[arg(long)]
        ws_port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}
