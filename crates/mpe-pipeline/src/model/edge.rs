//! Graph edge types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::NodeId;

/// Handle name every edge enters its target through.
pub const TARGET_HANDLE: &str = "target";

/// Outgoing handle an edge leaves its source through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceHandle {
    /// Followed when the node succeeds.
    Next,
    /// Followed when the node fails or times out.
    OnError,
    /// Followed like `next`, returning to the source once the target finishes.
    JumpBack,
}

impl SourceHandle {
    /// Document field the edge is written to.
    pub fn document_key(self) -> &'static str {
        match self {
            Self::Next | Self::JumpBack => "next",
            Self::OnError => "on_error",
        }
    }
}

/// Reference attributes carried by an edge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub jump_back: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub anchor: bool,
}

impl EdgeAttributes {
    /// Returns `None` when no attribute is set.
    pub fn non_empty(self) -> Option<Self> {
        (self.jump_back || self.anchor).then_some(self)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: NodeId,
    pub source_handle: SourceHandle,
    pub target: NodeId,
    #[serde(default = "default_target_handle")]
    pub target_handle: String,
    /// 1-based order among edges sharing source and handle.
    pub label: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<EdgeAttributes>,
}

fn default_target_handle() -> String {
    TARGET_HANDLE.to_owned()
}

impl GraphEdge {
    /// Creates an edge without attributes.
    pub fn new(source: NodeId, source_handle: SourceHandle, target: NodeId, label: u32) -> Self {
        Self {
            id: format!("{source}_{source_handle}_{target}_{label}"),
            source,
            source_handle,
            target,
            target_handle: default_target_handle(),
            label,
            attributes: None,
        }
    }

    /// Returns the edge with `attributes` attached, if any is set.
    pub fn with_attributes(mut self, attributes: EdgeAttributes) -> Self {
        self.attributes = attributes.non_empty();
        self
    }

    /// Returns whether the reference targets an anchor.
    pub fn is_anchor(&self) -> bool {
        self.attributes.is_some_and(|attrs| attrs.anchor)
    }

    /// Returns whether the reference jumps back to its source.
    pub fn is_jump_back(&self) -> bool {
        self.source_handle == SourceHandle::JumpBack
            || self.attributes.is_some_and(|attrs| attrs.jump_back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_includes_label() {
        let edge = GraphEdge::new("p_1".into(), SourceHandle::OnError, "p_2".into(), 3);
        assert_eq!(edge.id, "p_1_on_error_p_2_3");
        assert_eq!(edge.target_handle, TARGET_HANDLE);
        assert!(edge.attributes.is_none());
    }

    #[test]
    fn test_jump_back_from_handle_or_attribute() {
        let by_handle = GraphEdge::new("a".into(), SourceHandle::JumpBack, "b".into(), 1);
        assert!(by_handle.is_jump_back());
        assert_eq!(by_handle.source_handle.document_key(), "next");

        let by_attr = GraphEdge::new("a".into(), SourceHandle::Next, "b".into(), 1)
            .with_attributes(EdgeAttributes {
                jump_back: true,
                anchor: false,
            });
        assert!(by_attr.is_jump_back());
        assert!(!by_attr.is_anchor());

        let plain = GraphEdge::new("a".into(), SourceHandle::Next, "b".into(), 1)
            .with_attributes(EdgeAttributes::default());
        assert!(plain.attributes.is_none());
    }
}
