//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── layout: LayoutConfig   # grid used for documents without positions
//! └── command: Command       # import, export, normalize, split, merge
//! ```
//!
//! Export settings are flattened into the subcommands that write documents
//! and can also be set through `MPE_*` environment variables.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_CONFIG;
use crate::command::Command;
pub use crate::layout::LayoutConfig;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "mpe-cli")]
#[command(about = "Translate between automation graphs and pipeline documents")]
#[command(version)]
pub struct Cli {
    /// Grid layout for imported graphs.
    #[clap(flatten)]
    pub layout: LayoutConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so document output on stdout stays clean.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs configuration at debug level.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            command = self.command.name(),
            layout_columns = self.layout.layout_columns,
            layout_spacing_x = self.layout.layout_spacing_x,
            layout_spacing_y = self.layout.layout_spacing_y,
            "Configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
