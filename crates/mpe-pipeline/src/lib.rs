#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for document import.
///
/// Use this target for parse failures, node creation and graph commits.
pub const TRACING_TARGET_IMPORT: &str = "mpe_pipeline::import";

/// Tracing target for document export.
pub const TRACING_TARGET_EXPORT: &str = "mpe_pipeline::export";

/// Tracing target for reference linking and placeholder synthesis.
pub const TRACING_TARGET_LINK: &str = "mpe_pipeline::link";

/// Tracing target for side-car metadata handling.
///
/// Use this target for config markers, splitting and merging.
pub const TRACING_TARGET_DOCUMENT: &str = "mpe_pipeline::document";

pub mod codec;
pub mod document;
mod error;
mod exporter;
mod importer;
pub mod linker;
pub mod model;
mod settings;
pub mod store;
pub mod version;

pub use document::{Document, FileConfig, MpeConfig, NodeConfig};
pub use error::{Error, Result};
pub use exporter::Exporter;
pub use importer::{ImportSummary, ImportedGraph, Importer};
pub use model::{GraphEdge, GraphNode, IdAllocator, NodeId, NodeKind};
pub use settings::{AttrStyle, ExportSettings, ExportSettingsBuilder};
pub use store::{
    GraphStore, LayoutEngine, MemoryGraphStore, MemoryNotifier, NoopLayout, Notification,
    Notifier, TracingNotifier,
};
pub use version::ProtocolVersion;
