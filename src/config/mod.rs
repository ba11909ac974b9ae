//! Project configuration management for `svgpack.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                              |
//! |-----------|------------------------------------------------------|
//! | `[build]` | Paths, bundle order, feature flags, size ceiling     |
//! | `[serve]` | Development server (ports, watch, debounce window)   |

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::cli::Cli;

/// Default size ceiling for the composite document: 2 MiB.
const DEFAULT_SIZE_CEILING: u64 = 2 * 1024 * 1024;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing svgpack.toml.
///
/// Immutable for the duration of one build; the serve loop holds a single
/// instance for its whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

/// `[build]` section: one packaging pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Source root scanned for code/style/asset/manifest artifacts.
    pub source: PathBuf,
    /// Skeleton document with `{{NAME}}` placeholders.
    pub template: PathBuf,
    /// Output path for the composite document.
    pub output: PathBuf,
    /// Declared bundle order (relative paths). Unlisted files follow in
    /// lexical path order.
    pub order: Vec<String>,
    /// Minify bundled JS/CSS (best-effort; falls back to unminified).
    pub minify: bool,
    /// Re-serialize SVG assets through usvg to shrink them.
    pub optimize: bool,
    /// Promote size-ceiling crossings from warning to error.
    pub strict: bool,
    /// Size ceiling in bytes for the composite document and the
    /// cumulative embedded-asset total.
    pub size_ceiling: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            template: PathBuf::from("template.svg"),
            output: PathBuf::from("app.svg"),
            order: Vec::new(),
            minify: false,
            optimize: true,
            strict: false,
            size_ceiling: DEFAULT_SIZE_CEILING,
        }
    }
}

/// `[serve]` section: development orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// HTTP preview port.
    pub port: u16,
    /// WebSocket push port (retries upward when taken).
    pub ws_port: u16,
    /// Watch the source root for changes.
    pub watch: bool,
    /// Quiet window after the last change before a rebuild is enqueued.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 4200,
            ws_port: 4201,
            watch: true,
            debounce_ms: 200,
        }
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            config_path: PathBuf::from("svgpack.toml"),
            build: BuildConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl PackConfig {
    /// Load configuration from the CLI-specified config file, then apply
    /// CLI overrides. A missing config file yields defaults rooted at the
    /// current directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = if cli.config.exists() {
            let raw = fs::read_to_string(&cli.config)
                .map_err(|e| ConfigError::Io(cli.config.clone(), e))?;
            let mut config: Self = toml::from_str(&raw)?;
            config.config_path = cli
                .config
                .canonicalize()
                .map_err(|e| ConfigError::Io(cli.config.clone(), e))?;
            config.root = config
                .config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            config
        } else {
            let mut config = Self::default();
            config.root = std::env::current_dir()
                .map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
            config
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of file values.
    fn apply_cli(&mut self, cli: &Cli) {
        use crate::cli::Commands;

        if let Some(source) = &cli.source {
            self.build.source = source.clone();
        }
        if let Some(output) = &cli.output {
            self.build.output = output.clone();
        }

        match &cli.command {
            Commands::Build { minify, strict } => {
                if let Some(minify) = minify {
                    self.build.minify = *minify;
                }
                if *strict {
                    self.build.strict = true;
                }
            }
            Commands::Serve { port, ws_port, watch } => {
                if let Some(port) = port {
                    self.serve.port = *port;
                }
                if let Some(ws_port) = ws_port {
                    self.serve.ws_port = *ws_port;
                }
                if let Some(watch) = watch {
                    self.serve.watch = *watch;
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.build.size_ceiling == 0 {
            return Err(ConfigError::Validation(
                "build.size_ceiling must be greater than zero".into(),
            ));
        }
        if self.source_dir() == self.output_path() {
            return Err(ConfigError::Validation(
                "build.source and build.output must differ".into(),
            ));
        }
        Ok(())
    }

    /// Resolve a configured path relative to the project root.
    fn root_join(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root_join(&self.build.source)
    }

    pub fn template_path(&self) -> PathBuf {
        self.root_join(&self.build.template)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root_join(&self.build.output)
    }
}
