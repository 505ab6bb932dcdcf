//! Subcommands and shared file handling.
//!
//! Graph commands (`import`, `export`, `normalize`) go through the translator
//! and a [`MemoryGraphStore`]; document commands (`split`, `merge`) only move
//! editor metadata between files.

mod document;
mod graph;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
pub use document::{MergeArgs, SplitArgs};
pub use graph::{ExportArgs, ImportArgs, NormalizeArgs};
use mpe_pipeline::{MemoryGraphStore, MpeConfig, Notification, Notifier, TracingNotifier};

use crate::TRACING_TARGET_COMMAND;
use crate::config::LayoutConfig;

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import a document, and optionally its side-car, into a graph snapshot.
    Import(ImportArgs),
    /// Export a graph snapshot as a document.
    Export(ExportArgs),
    /// Import a document and export it again with the given settings.
    Normalize(NormalizeArgs),
    /// Move editor metadata out of a document into a side-car file.
    Split(SplitArgs),
    /// Put side-car metadata back into a pipeline document.
    Merge(MergeArgs),
}

impl Command {
    /// Subcommand name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Import(_) => "import",
            Self::Export(_) => "export",
            Self::Normalize(_) => "normalize",
            Self::Split(_) => "split",
            Self::Merge(_) => "merge",
        }
    }

    /// Runs the subcommand.
    pub fn run(&self, layout: &LayoutConfig) -> anyhow::Result<()> {
        match self {
            Self::Import(args) => args.run(layout),
            Self::Export(args) => args.run(),
            Self::Normalize(args) => args.run(layout),
            Self::Split(args) => args.run(),
            Self::Merge(args) => args.run(),
        }
    }
}

/// Notifier that logs every notification and remembers failures.
#[derive(Debug, Default)]
pub struct Reporter {
    failures: Vec<String>,
}

impl Notifier for Reporter {
    fn notify(&mut self, notification: Notification) {
        if notification.is_error() {
            self.failures.push(notification.to_string());
        }
        TracingNotifier.notify(notification);
    }
}

impl Reporter {
    /// Fails with the first reported failure, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(anyhow::anyhow!(failure)),
            None => Ok(()),
        }
    }
}

/// Reads a whole text file.
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Writes `text` to `path`, or to stdout when no path is given.
pub fn write_text(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                path = %path.display(),
                bytes = text.len(),
                "Wrote file"
            );
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}").context("failed to write to stdout")
        }
    }
}

/// Reads a side-car metadata file.
pub fn read_sidecar(path: &Path) -> anyhow::Result<MpeConfig> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid side-car file {}", path.display()))
}

/// Reads a graph snapshot written by `import`.
pub fn read_snapshot(path: &Path) -> anyhow::Result<MemoryGraphStore> {
    let text = read_text(path)?;
    let mut store: MemoryGraphStore = serde_json::from_str(&text)
        .with_context(|| format!("invalid graph snapshot {}", path.display()))?;
    store.refresh_name_collision();
    Ok(store)
}

/// Returns the side-car path that belongs next to the pipeline file `path`.
pub fn sidecar_path(path: &Path) -> anyhow::Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    Ok(path.with_file_name(mpe_pipeline::document::config_file_name(file_name)))
}

/// Returns the document name of the pipeline file `path`, without extension.
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path_and_name() {
        let path = Path::new("/work/tasks.jsonc");
        assert_eq!(
            sidecar_path(path).unwrap(),
            PathBuf::from("/work/.tasks.mpe.json")
        );
        assert_eq!(document_name(path), "tasks");
    }

    #[test]
    fn test_reporter_keeps_first_failure() {
        let mut reporter = Reporter::default();
        reporter.notify(Notification::ExportSucceeded { node_count: 1 });
        assert_eq!(reporter.failures.len(), 0);

        reporter.notify(Notification::ExportBlocked);
        reporter.notify(Notification::ExportFailed {
            reason: "later".into(),
        });
        let error = reporter.finish().unwrap_err();
        assert_eq!(error.to_string(), "Export blocked: two nodes share a name");
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_text(Some(&path), "{}").unwrap();
        assert_eq!(read_text(&path).unwrap(), "{}\n");
        assert!(read_text(&dir.path().join("missing.json")).is_err());
    }
}
