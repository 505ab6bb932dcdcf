//! Graph node types.

use derive_more::{Deref, Display, From};
use mpe_schema::{ActionType, RecognitionType};
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display as StrumDisplay, EnumString};

/// Session-unique node identifier, e.g. `p_3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Display, From, Deref)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates an id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Role of a node in the graph.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, StrumDisplay, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    /// A node defined by the document.
    #[default]
    Pipeline,
    /// A node referenced by the document but defined elsewhere.
    External,
    /// A named anchor target resolved at runtime.
    Anchor,
    /// Editor annotation, never exported.
    Sticker,
    /// Editor grouping frame, never exported.
    Group,
}

impl NodeKind {
    /// Prefix used for ids allocated to this kind.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Pipeline => "p",
            Self::External => "e",
            Self::Anchor => "a",
            Self::Sticker => "s",
            Self::Group => "g",
        }
    }
}

/// Side from which a node's connections leave and enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, StrumDisplay, EnumString)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HandleDirection {
    LeftRight,
    RightLeft,
    TopBottom,
    BottomTop,
}

/// Canvas position of a node.
///
/// Integral coordinates serialize as JSON integers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Position {
    #[serde(serialize_with = "serialize_coordinate")]
    pub x: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub y: f64,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the position rounded to whole canvas units.
    pub fn rounded(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }
}

fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Recognition step of a pipeline node.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    #[serde(rename = "type")]
    pub kind: RecognitionType,
    #[serde(default)]
    pub param: Map<String, Value>,
}

/// Action step of a pipeline node.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default)]
    pub param: Map<String, Value>,
}

/// Editable payload of a node.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Display name, without the file prefix.
    pub label: String,
    #[serde(default)]
    pub recognition: Recognition,
    #[serde(default)]
    pub action: Action,
    /// Node-level fields such as delays, timeouts and focus.
    #[serde(default)]
    pub others: Map<String, Value>,
    /// Unrecognized document fields, kept verbatim.
    #[serde(default)]
    pub extras: Map<String, Value>,
}

/// A node as held by the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub data: NodeData,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_direction: Option<HandleDirection>,
}

impl GraphNode {
    /// Creates a node at the origin with empty recognition and action.
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            data: NodeData {
                label: label.into(),
                ..NodeData::default()
            },
            position: Position::default(),
            handle_direction: None,
        }
    }

    /// Returns the display name.
    #[inline]
    pub fn label(&self) -> &str {
        &self.data.label
    }

    /// Returns the node moved to `position`.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Returns whether the node is encoded as a full document entry.
    #[inline]
    pub fn is_pipeline(&self) -> bool {
        self.kind == NodeKind::Pipeline
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_position_serializes_integral_as_int() {
        let value = serde_json::to_value(Position::new(10.4, -3.0).rounded()).unwrap();
        assert_eq!(value, json!({"x": 10, "y": -3}));

        let value = serde_json::to_value(Position::new(1.5, 2.0)).unwrap();
        assert_eq!(value, json!({"x": 1.5, "y": 2}));
    }

    #[test]
    fn test_handle_direction_names() {
        assert_eq!(HandleDirection::TopBottom.to_string(), "top-bottom");
        let parsed: HandleDirection = serde_json::from_value(json!("right-left")).unwrap();
        assert_eq!(parsed, HandleDirection::RightLeft);
    }

    #[test]
    fn test_graph_node_snapshot_shape() {
        let node = GraphNode::new("p_1".into(), NodeKind::Pipeline, "Start");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["id"], json!("p_1"));
        assert_eq!(value["type"], json!("pipeline"));
        assert_eq!(value["data"]["recognition"]["type"], json!("DirectHit"));

        let back: GraphNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }
}
