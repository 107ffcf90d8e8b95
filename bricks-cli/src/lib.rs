//! # Bricks CLI
//!
//! Command-line front end for `bricks-core`.
//!
//! ## Usage
//!
//! ```bash
//! bricks convert page.html -o page.json
//! bricks validate page.json
//! bricks doctor page.json
//! bricks compose hero-dark pricing-alpha --with-classes
//! bricks classes --stats
//! bricks templates search hero
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved directories and site identity
//! - [`run`] - Dispatches one subcommand, writing results to any `Write`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;

pub use commands::{run, CommandError};

use std::path::PathBuf;

use bricks_core::ClassOrigin;
use clap::{Parser, Subcommand, ValueEnum};

/// File name of the class registry cache inside the config directory.
pub const REGISTRY_CACHE_FILE: &str = "class-registry.json";

/// Config directory name under `$HOME`.
const DEFAULT_CONFIG_DIR_NAME: &str = ".agent-to-bricks";

/// Command-line arguments for bricks.
#[derive(Debug, Clone, Parser)]
#[command(name = "bricks")]
#[command(about = "Convert, check and compose Bricks element graphs")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding the class registry cache
    #[arg(long, env = "BRICKS_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Site the class registry was fetched from
    #[arg(long, env = "BRICKS_SITE_URL", global = true)]
    pub site_url: Option<String>,

    /// Template catalog directory
    #[arg(long, env = "BRICKS_TEMPLATES_DIR", global = true)]
    pub templates_dir: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Convert HTML into an element list
    Convert {
        /// HTML file, or `-` for stdin
        input: PathBuf,
        /// JSON file of global class records (`[{"id", "name"}, ...]`)
        #[arg(long)]
        registry_file: Option<PathBuf>,
        /// Resolve classes against the cached registry
        #[arg(long, conflicts_with = "registry_file")]
        use_cache: bool,
        /// Store the registry built from `--registry-file` in the cache
        #[arg(long, requires = "registry_file")]
        save_cache: bool,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate an element file; fails on blocking errors
    Validate {
        /// Element JSON file, or `-` for stdin
        input: PathBuf,
    },
    /// Report graded health findings for an element file
    Doctor {
        /// Element JSON file, or `-` for stdin
        input: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge templates into one element list
    Compose {
        /// Template names from the catalog, or template file paths
        #[arg(required = true)]
        templates: Vec<String>,
        /// Include deduplicated global classes in the output
        #[arg(long)]
        with_classes: bool,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect the cached class registry
    Classes {
        /// Only list classes of this origin
        #[arg(long, value_enum)]
        origin: Option<OriginArg>,
        /// Print counts instead of names
        #[arg(long)]
        stats: bool,
    },
    /// Browse and build the template catalog
    Templates {
        /// Catalog action
        #[command(subcommand)]
        action: TemplatesAction,
    },
}

/// Template catalog actions.
#[derive(Debug, Clone, Subcommand)]
pub enum TemplatesAction {
    /// List template names
    List,
    /// Search name, description, category and tags
    Search {
        /// Case-insensitive substring
        query: String,
    },
    /// Print one template as JSON
    Show {
        /// Template name
        name: String,
    },
    /// Split a page into one template per root section
    Learn {
        /// Element JSON file of the page
        input: PathBuf,
        /// Page name used as the template name prefix
        #[arg(long)]
        page: String,
        /// Write the learned templates into the catalog directory
        #[arg(long)]
        save: bool,
    },
}

/// Class origin filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OriginArg {
    /// Framework utility classes
    Acss,
    /// Component classes
    Frames,
}

impl From<OriginArg> for ClassOrigin {
    fn from(origin: OriginArg) -> Self {
        match origin {
            OriginArg::Acss => Self::Acss,
            OriginArg::Frames => Self::Frames,
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Directory holding the class registry cache.
    pub config_dir: PathBuf,
    /// Site identity recorded in the cache.
    pub site_url: String,
    /// Template catalog directory, if configured.
    pub templates_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Path of the class registry cache file.
    #[must_use]
    pub fn registry_cache_path(&self) -> PathBuf {
        self.config_dir.join(REGISTRY_CACHE_FILE)
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        let config_dir = args.config_dir.clone().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(DEFAULT_CONFIG_DIR_NAME)
        });
        Self {
            config_dir,
            site_url: args.site_url.clone().unwrap_or_default(),
            templates_dir: args.templates_dir.clone(),
        }
    }
}
