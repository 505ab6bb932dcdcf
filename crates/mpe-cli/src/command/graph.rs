//! `import`, `export` and `normalize`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use mpe_pipeline::document::to_pretty_string;
use mpe_pipeline::{
    ExportSettings, Exporter, GraphStore, IdAllocator, ImportSummary, Importer, MemoryGraphStore,
};

use super::{Reporter, document_name, read_sidecar, read_snapshot, read_text, sidecar_path, write_text};
use crate::TRACING_TARGET_COMMAND;
use crate::config::LayoutConfig;
use crate::layout::GridLayout;

/// Arguments of `import`.
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Pipeline document to read (JSON or JSONC).
    pub input: PathBuf,

    /// Side-car metadata merged into the document before import.
    #[arg(long = "sidecar")]
    pub sidecar: Option<PathBuf>,

    /// Write the graph snapshot here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number used for the first allocated node id.
    #[arg(long = "first-id", env = "MPE_FIRST_ID", default_value_t = 1)]
    pub first_id: u64,
}

impl ImportArgs {
    pub fn run(&self, layout: &LayoutConfig) -> anyhow::Result<()> {
        let (store, _) = import_file(&self.input, self.sidecar.as_deref(), self.first_id, layout)?;
        let text = to_pretty_string(&store).context("failed to serialize graph snapshot")?;
        write_text(self.output.as_deref(), &text)
    }
}

/// Arguments of `export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Graph snapshot written by `import`.
    pub input: PathBuf,

    /// Write the document here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write editor metadata to a side-car next to the output.
    #[arg(long, requires = "output")]
    pub separate: bool,

    #[command(flatten)]
    pub settings: ExportSettings,
}

impl ExportArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let store = read_snapshot(&self.input)?;
        write_document(&store, &self.settings, self.output.as_deref(), self.separate)
    }
}

/// Arguments of `normalize`.
#[derive(Debug, Clone, Args)]
pub struct NormalizeArgs {
    /// Pipeline document to read (JSON or JSONC).
    pub input: PathBuf,

    /// Side-car metadata merged into the document before import.
    #[arg(long = "sidecar")]
    pub sidecar: Option<PathBuf>,

    /// Write the document here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write editor metadata to a side-car next to the output.
    #[arg(long, requires = "output")]
    pub separate: bool,

    #[command(flatten)]
    pub settings: ExportSettings,
}

impl NormalizeArgs {
    pub fn run(&self, layout: &LayoutConfig) -> anyhow::Result<()> {
        let (store, summary) = import_file(&self.input, self.sidecar.as_deref(), 1, layout)?;
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            node_count = summary.node_count,
            protocol_version = %self.settings.protocol_version,
            attr_style = %self.settings.attr_style,
            "Normalizing document"
        );
        write_document(&store, &self.settings, self.output.as_deref(), self.separate)
    }
}

/// Imports the document at `input` into a fresh store.
///
/// A document without a file config is named after its file.
fn import_file(
    input: &Path,
    sidecar: Option<&Path>,
    first_id: u64,
    layout: &LayoutConfig,
) -> anyhow::Result<(MemoryGraphStore, ImportSummary)> {
    let text = read_text(input)?;
    let sidecar = sidecar.map(read_sidecar).transpose()?;

    let mut store = MemoryGraphStore::default();
    let mut reporter = Reporter::default();
    let summary = Importer::new(IdAllocator::starting_at(first_id))
        .import(
            &text,
            sidecar.as_ref(),
            &mut store,
            &mut GridLayout::new(*layout),
            &mut reporter,
        )
        .with_context(|| format!("failed to import {}", input.display()))?;

    if store.file_config().filename.is_empty() {
        let mut file_config = store.file_config().clone();
        file_config.filename = document_name(input);
        store.set_file_config(file_config);
    }

    Ok((store, summary))
}

/// Exports `store` to `output`, splitting metadata into a side-car when
/// `separate` is set.
fn write_document(
    store: &MemoryGraphStore,
    settings: &ExportSettings,
    output: Option<&Path>,
    separate: bool,
) -> anyhow::Result<()> {
    let exporter = Exporter::new(settings.clone());
    let mut reporter = Reporter::default();

    match output.filter(|_| separate) {
        Some(output) => {
            let (pipeline, config) = exporter
                .export_separated(store, &mut reporter)
                .context("failed to serialize document")?;
            reporter.finish()?;
            write_text(Some(output), &pipeline)?;
            write_text(Some(&sidecar_path(output)?), &config)
        }
        None => {
            let text = exporter
                .export_string(store, &mut reporter)
                .context("failed to serialize document")?;
            reporter.finish()?;
            write_text(output, &text)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mpe_pipeline::ProtocolVersion;
    use serde_json::{Value, json};

    use super::*;

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn settings(export_config: bool) -> ExportSettings {
        ExportSettings::builder()
            .with_export_config(export_config)
            .build()
            .unwrap()
    }

    const DOCUMENT: &str = r#"{
        // two nodes, one external reference
        "Start": {
            "recognition": { "type": "OCR", "param": { "expected": ["Go"] } },
            "next": ["Done", "Elsewhere"],
        },
        "Done": { "action": { "type": "StopTask", "param": {} } }
    }"#;

    #[test]
    fn test_import_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.jsonc");
        let snapshot = dir.path().join("graph.json");
        let output = dir.path().join("out.json");
        fs::write(&input, DOCUMENT).unwrap();

        ImportArgs {
            input: input.clone(),
            sidecar: None,
            output: Some(snapshot.clone()),
            first_id: 1,
        }
        .run(&LayoutConfig::default())
        .unwrap();

        let graph = read_json(&snapshot);
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(graph["edges"].as_array().unwrap().len(), 2);
        assert_eq!(graph["file_config"]["filename"], json!("tasks"));

        ExportArgs {
            input: snapshot,
            output: Some(output.clone()),
            separate: false,
            settings: settings(false),
        }
        .run()
        .unwrap();

        let document = read_json(&output);
        assert_eq!(document["Start"]["next"], json!(["Done", "Elsewhere"]));
        assert_eq!(
            document["Done"],
            json!({ "action": { "type": "StopTask", "param": {} } })
        );
    }

    #[test]
    fn test_import_applies_grid_layout() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.json");
        let snapshot = dir.path().join("graph.json");
        fs::write(&input, DOCUMENT).unwrap();

        let layout = LayoutConfig {
            layout_columns: 1,
            ..LayoutConfig::default()
        };
        ImportArgs {
            input,
            sidecar: None,
            output: Some(snapshot.clone()),
            first_id: 1,
        }
        .run(&layout)
        .unwrap();

        let graph = read_json(&snapshot);
        assert_eq!(graph["nodes"][1]["position"], json!({ "x": 0, "y": 200 }));
    }

    #[test]
    fn test_normalize_v1_to_v2_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("legacy.json");
        let output = dir.path().join("modern.json");
        fs::write(
            &input,
            r#"{ "A": { "recognition": "templatematch", "template": "a.png", "next": "B" }, "B": {} }"#,
        )
        .unwrap();

        NormalizeArgs {
            input,
            sidecar: None,
            output: Some(output.clone()),
            separate: true,
            settings: settings(true),
        }
        .run(&LayoutConfig::default())
        .unwrap();

        let document = read_json(&output);
        assert_eq!(
            document["A"],
            json!({
                "recognition": { "type": "TemplateMatch", "param": { "template": "a.png" } },
                "next": ["B"],
            })
        );
        let sidecar = read_json(&dir.path().join(".modern.mpe.json"));
        assert_eq!(sidecar["file_config"]["filename"], json!("legacy"));
        assert!(sidecar["node_configs"]["B"]["position"].is_object());
    }

    #[test]
    fn test_normalize_to_v1() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.json");
        let output = dir.path().join("v1.json");
        fs::write(&input, DOCUMENT).unwrap();

        let settings = ExportSettings::builder()
            .with_export_config(false)
            .with_protocol_version(ProtocolVersion::V1)
            .build()
            .unwrap();
        NormalizeArgs {
            input,
            sidecar: None,
            output: Some(output.clone()),
            separate: false,
            settings,
        }
        .run(&LayoutConfig::default())
        .unwrap();

        let document = read_json(&output);
        assert_eq!(document["Start"]["recognition"], json!("OCR"));
        assert_eq!(document["Start"]["expected"], json!(["Go"]));
    }

    #[test]
    fn test_import_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.json");
        let snapshot = dir.path().join("graph.json");
        fs::write(&input, r#"{ "A": { "action": "Teleport" } }"#).unwrap();

        let result = ImportArgs {
            input,
            sidecar: None,
            output: Some(snapshot.clone()),
            first_id: 1,
        }
        .run(&LayoutConfig::default());

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("failed to import"), "{message}");
        assert!(!snapshot.exists());
    }

    #[test]
    fn test_export_blocked_by_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("graph.json");
        let output = dir.path().join("out.json");
        fs::write(
            &snapshot,
            r#"{
                "nodes": [
                    { "id": "p_1", "type": "pipeline", "data": { "label": "A" } },
                    { "id": "p_2", "type": "pipeline", "data": { "label": "A" } }
                ]
            }"#,
        )
        .unwrap();

        let result = ExportArgs {
            input: snapshot,
            output: Some(output.clone()),
            separate: false,
            settings: settings(false),
        }
        .run();

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
