//! Collaborator interfaces: graph store, layout engine and notifications.
//!
//! The translator never owns editor state. It reads from and commits to a
//! [`GraphStore`], asks a [`LayoutEngine`] to place nodes that carry no
//! position, and reports outcomes through a [`Notifier`].

use std::collections::HashMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::codec::{FieldSection, TypeMismatch};
use crate::document::FileConfig;
use crate::model::{GraphEdge, GraphNode, NodeId};
use crate::{TRACING_TARGET_EXPORT, TRACING_TARGET_IMPORT};

/// Live graph held by the editor.
pub trait GraphStore {
    /// Nodes in insertion order.
    fn nodes(&self) -> &[GraphNode];

    /// Mutable access to nodes, used by layout engines.
    fn nodes_mut(&mut self) -> &mut [GraphNode];

    fn edges(&self) -> &[GraphEdge];

    /// Export order of nodes; nodes without an entry go last.
    fn node_order(&self) -> &HashMap<NodeId, usize>;

    /// Whether two nodes currently share a document name.
    fn has_name_collision(&self) -> bool;

    fn file_config(&self) -> &FileConfig;

    /// Replaces the whole graph, fitting the view when `fit_view` is set.
    fn replace(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>, fit_view: bool);

    fn set_file_config(&mut self, config: FileConfig);
}

/// Places nodes on the canvas.
pub trait LayoutEngine {
    fn auto_layout(&mut self, store: &mut dyn GraphStore);
}

/// Receives user-facing outcomes.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Outcome of an import or export.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Notification {
    #[display("Imported {node_count} nodes and {edge_count} edges")]
    ImportSucceeded { node_count: usize, edge_count: usize },

    #[display("Import failed: {reason}")]
    ImportFailed { reason: String },

    #[display("Exported {node_count} nodes")]
    ExportSucceeded { node_count: usize },

    #[display("Export failed: {reason}")]
    ExportFailed { reason: String },

    #[display("Export blocked: two nodes share a name")]
    ExportBlocked,

    #[display("Node '{node}' {section} field '{key}' matches none of its types and was dropped")]
    TypeMismatch {
        node: String,
        key: String,
        section: FieldSection,
    },
}

impl From<TypeMismatch> for Notification {
    fn from(mismatch: TypeMismatch) -> Self {
        Self::TypeMismatch {
            node: mismatch.node,
            key: mismatch.key,
            section: mismatch.section,
        }
    }
}

impl Notification {
    /// Returns whether the notification reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ImportFailed { .. } | Self::ExportFailed { .. } | Self::ExportBlocked
        )
    }
}

/// In-memory graph store.
///
/// Serializes as a graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryGraphStore {
    #[serde(default)]
    pub file_config: FileConfig,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub node_order: HashMap<NodeId, usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub name_collision: bool,
    /// Whether the last replace asked to fit the view.
    #[serde(skip)]
    pub fit_view: bool,
}

impl MemoryGraphStore {
    /// Creates a store holding `nodes` and `edges`.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            nodes,
            edges,
            ..Self::default()
        }
    }

    /// Recomputes the name-collision flag from node labels.
    pub fn refresh_name_collision(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.name_collision = self
            .nodes
            .iter()
            .filter(|node| node.is_pipeline())
            .any(|node| !seen.insert(node.label()));
    }
}

impl GraphStore for MemoryGraphStore {
    fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    fn node_order(&self) -> &HashMap<NodeId, usize> {
        &self.node_order
    }

    fn has_name_collision(&self) -> bool {
        self.name_collision
    }

    fn file_config(&self) -> &FileConfig {
        &self.file_config
    }

    fn replace(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>, fit_view: bool) {
        self.node_order = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id.clone(), position))
            .collect();
        self.nodes = nodes;
        self.edges = edges;
        self.fit_view = fit_view;
        self.refresh_name_collision();
    }

    fn set_file_config(&mut self, config: FileConfig) {
        self.file_config = config;
    }
}

/// Layout engine that leaves positions untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLayout;

impl LayoutEngine for NoopLayout {
    fn auto_layout(&mut self, _store: &mut dyn GraphStore) {}
}

/// Notifier that renders notifications as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, notification: Notification) {
        match &notification {
            Notification::ImportSucceeded { .. } => {
                tracing::info!(target: TRACING_TARGET_IMPORT, "{notification}");
            }
            Notification::ImportFailed { .. } => {
                tracing::error!(target: TRACING_TARGET_IMPORT, "{notification}");
            }
            Notification::ExportSucceeded { .. } => {
                tracing::info!(target: TRACING_TARGET_EXPORT, "{notification}");
            }
            Notification::ExportFailed { .. } | Notification::ExportBlocked => {
                tracing::error!(target: TRACING_TARGET_EXPORT, "{notification}");
            }
            Notification::TypeMismatch { .. } => {
                tracing::warn!(target: TRACING_TARGET_EXPORT, "{notification}");
            }
        }
    }
}

/// Notifier that records notifications, for tests and batch tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNotifier {
    pub notifications: Vec<Notification>,
}

impl MemoryNotifier {
    /// Returns the failures received so far.
    pub fn errors(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| n.is_error())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}
