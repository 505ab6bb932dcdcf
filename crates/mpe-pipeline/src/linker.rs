//! Connection references and edge linking.
//!
//! A connection array entry names a target node, optionally qualified with
//! `[Anchor]` / `[JumpBack]` attributes. Linking turns one array into ordered
//! edges and synthesizes placeholder nodes for names no node defines.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::model::{EdgeAttributes, GraphEdge, GraphNode, IdAllocator, NodeId, NodeKind, SourceHandle};
use crate::{AttrStyle, Error, Result, TRACING_TARGET_LINK};

const ANCHOR_PREFIX: &str = "[anchor]";
const JUMP_BACK_PREFIX: &str = "[jumpback]";

/// A parsed connection array entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub name: String,
    pub anchor: bool,
    pub jump_back: bool,
}

impl NodeRef {
    /// Creates a plain reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anchor: false,
            jump_back: false,
        }
    }

    /// Parses `"[Anchor][JumpBack]Name"`, with prefixes in any order and case.
    pub fn from_prefixed(text: &str) -> Self {
        let mut reference = Self::new("");
        let mut rest = text.trim_start();

        loop {
            if let Some(tail) = strip_prefix_ignore_case(rest, ANCHOR_PREFIX) {
                reference.anchor = true;
                rest = tail;
            } else if let Some(tail) = strip_prefix_ignore_case(rest, JUMP_BACK_PREFIX) {
                reference.jump_back = true;
                rest = tail;
            } else {
                break;
            }
        }

        reference.name = rest.to_owned();
        reference
    }

    /// Parses a string or `{name, anchor?, jump_back?}` entry.
    pub fn parse(value: &Value) -> Result<Self> {
        let reference = match value {
            Value::String(text) => Self::from_prefixed(text),
            Value::Object(object) => {
                let name = object
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::invalid_reference(value, "missing string `name`"))?;
                Self {
                    name: name.to_owned(),
                    anchor: flag(object, "anchor"),
                    jump_back: flag(object, "jump_back"),
                }
            }
            _ => {
                return Err(Error::invalid_reference(
                    value,
                    "expected a node name or an object",
                ));
            }
        };

        if reference.name.is_empty() {
            return Err(Error::invalid_reference(value, "empty node name"));
        }
        Ok(reference)
    }

    /// Parses a connection field; a lone entry counts as a one-element array.
    pub fn parse_list(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.iter().map(Self::parse).collect(),
            _ => Self::parse(value).map(|reference| vec![reference]),
        }
    }

    /// Encodes the reference in `style`; plain references are bare names.
    pub fn to_value(&self, style: AttrStyle) -> Value {
        if !self.anchor && !self.jump_back {
            return Value::String(self.name.clone());
        }

        match style {
            AttrStyle::Prefix => {
                let mut text = String::new();
                if self.anchor {
                    text.push_str("[Anchor]");
                }
                if self.jump_back {
                    text.push_str("[JumpBack]");
                }
                text.push_str(&self.name);
                Value::String(text)
            }
            AttrStyle::Object => {
                let mut object = Map::new();
                object.insert("name".into(), Value::String(self.name.clone()));
                if self.anchor {
                    object.insert("anchor".into(), Value::Bool(true));
                }
                if self.jump_back {
                    object.insert("jump_back".into(), Value::Bool(true));
                }
                Value::Object(object)
            }
        }
    }

    fn attributes(&self) -> EdgeAttributes {
        EdgeAttributes {
            jump_back: self.jump_back,
            anchor: self.anchor,
        }
    }
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// Name-to-id lookup built during import.
///
/// Anchors and nodes share one namespace; the `anchor` attribute of a
/// reference only decides the kind of a placeholder created for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIndex {
    names: HashMap<String, NodeId>,
}

impl NameIndex {
    /// Registers a name.
    pub fn insert(&mut self, name: impl Into<String>, id: NodeId) {
        self.names.insert(name.into(), id);
    }

    /// Looks up a name.
    pub fn get(&self, name: &str) -> Option<&NodeId> {
        self.names.get(name)
    }

    /// Resolves the target of a reference.
    pub fn resolve(&self, reference: &NodeRef) -> Option<&NodeId> {
        self.get(&reference.name)
    }

    /// Adds every entry of `other`.
    pub fn extend(&mut self, other: NameIndex) {
        self.names.extend(other.names);
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether no name is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Output of one linking call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linked {
    /// One edge per reference, labeled by array position.
    pub edges: Vec<GraphEdge>,
    /// Placeholder nodes for unresolved names.
    pub nodes: Vec<GraphNode>,
    /// Names of the placeholder nodes.
    pub index_additions: NameIndex,
}

/// Links the connection field `refs` of the node named `source`.
///
/// # Errors
///
/// Fails when `source` is not in `index` or an entry is not a valid
/// reference.
pub fn link(
    source: &str,
    refs: &Value,
    handle: SourceHandle,
    index: &NameIndex,
    ids: &mut IdAllocator,
) -> Result<Linked> {
    let source_id = index
        .get(source)
        .cloned()
        .ok_or_else(|| Error::invalid_document(format!("unknown source node '{source}'")))?;
    let refs = NodeRef::parse_list(refs)?;
    Ok(link_refs(&source_id, refs, handle, index, ids))
}

/// Links already parsed references leaving `source`.
///
/// Names are resolved against `index` and against placeholders created
/// earlier in the same call, so repeated unknown names share one node.
pub fn link_refs(
    source: &NodeId,
    refs: Vec<NodeRef>,
    handle: SourceHandle,
    index: &NameIndex,
    ids: &mut IdAllocator,
) -> Linked {
    let mut linked = Linked::default();

    for (position, reference) in refs.into_iter().enumerate() {
        let known = index
            .resolve(&reference)
            .or_else(|| linked.index_additions.resolve(&reference))
            .cloned();

        let target = match known {
            Some(id) => id,
            None => {
                let kind = if reference.anchor {
                    NodeKind::Anchor
                } else {
                    NodeKind::External
                };
                let id = ids.allocate(kind);
                tracing::debug!(
                    target: TRACING_TARGET_LINK,
                    name = %reference.name,
                    id = %id,
                    kind = %kind,
                    "Created placeholder node"
                );

                linked
                    .nodes
                    .push(GraphNode::new(id.clone(), kind, reference.name.clone()));
                linked.index_additions.insert(reference.name.clone(), id.clone());
                id
            }
        };

        let label = u32::try_from(position + 1).unwrap_or(u32::MAX);
        let edge = GraphEdge::new(source.clone(), handle, target, label)
            .with_attributes(reference.attributes());
        linked.edges.push(edge);
    }

    linked
}
