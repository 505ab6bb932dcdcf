//! Editor metadata records.

use indexmap::IndexMap;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{HandleDirection, Position};

/// Saved canvas viewport.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

/// File-level editor preferences.
///
/// Unknown preferences are kept in `extra` and written back unchanged.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Document file name, without extension.
    #[serde(default)]
    pub filename: String,

    /// Version of the tool that wrote the document, e.g. `v1.2.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Node name prefix, joined to labels with `_`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_viewport: Option<Viewport>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileConfig {
    /// Returns the prefix if set and non-empty.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }

    /// Returns the document key of a node labeled `label`.
    pub fn qualify(&self, label: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}_{label}"),
            None => label.to_owned(),
        }
    }

    /// Returns the label of the node stored under `key`.
    ///
    /// Keys without the prefix are returned unchanged.
    pub fn unqualify<'a>(&self, key: &'a str) -> &'a str {
        self.prefix()
            .and_then(|prefix| key.strip_prefix(prefix))
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(key)
    }
}

/// Per-node editor metadata, the payload of a marker field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_direction: Option<HandleDirection>,
}

impl NodeConfig {
    /// Creates a config at `position` with the position rounded.
    pub fn at(position: Position, handle_direction: Option<HandleDirection>) -> Self {
        Self {
            position: position.rounded(),
            handle_direction,
        }
    }
}

/// Contents of a side-car metadata file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct MpeConfig {
    #[serde(default)]
    pub file_config: FileConfig,

    /// Node key to node metadata.
    #[serde(default)]
    pub node_configs: IndexMap<String, NodeConfig>,

    /// External node name to stub metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_nodes: Option<IndexMap<String, NodeConfig>>,

    /// Anchor name to stub metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_nodes: Option<IndexMap<String, NodeConfig>>,
}
