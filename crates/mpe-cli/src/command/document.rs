//! `split` and `merge`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use mpe_pipeline::document::{merge, parse_document, split, to_pretty_string};

use super::{document_name, read_sidecar, read_text, sidecar_path, write_text};
use crate::TRACING_TARGET_COMMAND;

/// Arguments of `split`.
#[derive(Debug, Clone, Args)]
pub struct SplitArgs {
    /// Document carrying editor metadata.
    pub input: PathBuf,

    /// Where to write the marker-free pipeline; the side-car goes next to it.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Side-car path, instead of the one derived from the output name.
    #[arg(long = "sidecar")]
    pub sidecar: Option<PathBuf>,
}

impl SplitArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let text = read_text(&self.input)?;
        let document = parse_document(&text)
            .with_context(|| format!("failed to parse {}", self.input.display()))?;

        let (pipeline, mut config) = split(&document);
        if config.file_config.filename.is_empty() {
            config.file_config.filename = document_name(&self.input);
        }

        let sidecar = match &self.sidecar {
            Some(path) => path.clone(),
            None => sidecar_path(&self.output)?,
        };
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            node_count = pipeline.len(),
            sidecar = %sidecar.display(),
            "Splitting document"
        );

        write_text(Some(&self.output), &to_pretty_string(&pipeline)?)?;
        write_text(Some(&sidecar), &to_pretty_string(&config)?)
    }
}

/// Arguments of `merge`.
#[derive(Debug, Clone, Args)]
pub struct MergeArgs {
    /// Marker-free pipeline document.
    pub input: PathBuf,

    /// Side-car path, instead of the one next to the input.
    #[arg(long = "sidecar")]
    pub sidecar: Option<PathBuf>,

    /// Document name recorded in the file config; defaults to the side-car's.
    #[arg(long)]
    pub filename: Option<String>,

    /// Write the document here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl MergeArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let text = read_text(&self.input)?;
        let pipeline = parse_document(&text)
            .with_context(|| format!("failed to parse {}", self.input.display()))?;

        let sidecar = match &self.sidecar {
            Some(path) => path.clone(),
            None => sidecar_path(&self.input)?,
        };
        let config = read_sidecar(&sidecar)?;

        let filename = self.filename.clone().or_else(|| {
            config
                .file_config
                .filename
                .is_empty()
                .then(|| document_name(&self.input))
        });
        let merged = merge(&pipeline, &config, filename.as_deref())
            .with_context(|| format!("failed to merge {}", sidecar.display()))?;

        write_text(self.output.as_deref(), &to_pretty_string(&merged)?)
    }
}
