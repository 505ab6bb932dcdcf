//! Graph nodes to document node objects.

use mpe_schema::{FieldType, OTHER_FIELDS_WITHOUT_FOCUS, match_all, match_single};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};

use crate::document::{CONFIG_MARK, NodeConfig};
use crate::model::GraphNode;
use crate::{ExportSettings, ProtocolVersion, Result};

/// Part of a node a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldSection {
    Recognition,
    Action,
    Others,
}

/// A parameter dropped because its value fits none of its declared types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    /// Label of the node.
    pub node: String,
    pub key: String,
    pub section: FieldSection,
}

/// An encoded document node with its diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded {
    pub fields: Map<String, Value>,
    pub mismatches: Vec<TypeMismatch>,
}

impl Encoded {
    fn reject(&mut self, node: &GraphNode, keys: Vec<String>, section: FieldSection) {
        self.mismatches.extend(keys.into_iter().map(|key| TypeMismatch {
            node: node.label().to_owned(),
            key,
            section,
        }));
    }
}

fn is_empty_focus(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Object(object) => object.is_empty(),
        _ => false,
    }
}

fn typed(name: &str, param: Map<String, Value>, version: ProtocolVersion) -> Value {
    match version {
        ProtocolVersion::V1 => Value::String(name.to_owned()),
        ProtocolVersion::V2 => {
            let mut object = Map::new();
            object.insert("type".into(), Value::String(name.to_owned()));
            object.insert("param".into(), Value::Object(param));
            Value::Object(object)
        }
    }
}

fn marker(node: &GraphNode) -> Result<Value> {
    Ok(serde_json::to_value(NodeConfig::at(
        node.position,
        node.handle_direction,
    ))?)
}

/// Encodes a pipeline node.
///
/// Fields are written in order: recognition, action, flattened parameters
/// (v1 only), other fields, `focus`, extras, marker. Recognition is omitted
/// when it is the no-op type without parameters, unless defaults are
/// exported; action follows the same rule independently.
///
/// # Errors
///
/// Fails when the marker cannot be serialized.
pub fn encode_node(node: &GraphNode, settings: &ExportSettings) -> Result<Encoded> {
    let mut encoded = Encoded::default();
    let version = settings.protocol_version;
    let data = &node.data;

    let recognition = match_all(&data.recognition.param, data.recognition.kind.params());
    encoded.reject(node, recognition.rejected, FieldSection::Recognition);
    let action = match_all(&data.action.param, data.action.kind.params());
    encoded.reject(node, action.rejected, FieldSection::Action);

    let write_recognition = settings.export_defaults
        || !data.recognition.kind.is_noop()
        || !recognition.params.is_empty();
    let write_action =
        settings.export_defaults || !data.action.kind.is_noop() || !action.params.is_empty();

    let mut flattened = Vec::new();
    if write_recognition {
        let name = data.recognition.kind.as_str();
        if version == ProtocolVersion::V1 {
            flattened.push(recognition.params.clone());
        }
        encoded
            .fields
            .insert("recognition".into(), typed(name, recognition.params, version));
    }
    if write_action {
        let name = data.action.kind.as_str();
        if version == ProtocolVersion::V1 {
            flattened.push(action.params.clone());
        }
        encoded
            .fields
            .insert("action".into(), typed(name, action.params, version));
    }
    for params in flattened {
        encoded.fields.extend(params);
    }

    let others: Map<String, Value> = data
        .others
        .iter()
        .filter(|(key, _)| key.as_str() != "focus")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let others = match_all(&others, OTHER_FIELDS_WITHOUT_FOCUS);
    encoded.reject(node, others.rejected, FieldSection::Others);
    encoded.fields.extend(others.params);

    if let Some(focus) = data.others.get("focus").filter(|focus| !is_empty_focus(focus)) {
        match match_single(focus, FieldType::Any) {
            Ok(focus) => {
                encoded.fields.insert("focus".into(), focus);
            }
            Err(_) => encoded.reject(node, vec!["focus".into()], FieldSection::Others),
        }
    }

    encoded
        .fields
        .extend(data.extras.iter().map(|(key, value)| (key.clone(), value.clone())));

    if settings.export_config {
        encoded.fields.insert(CONFIG_MARK.into(), marker(node)?);
    }

    Ok(encoded)
}

/// Encodes an external or anchor node as a marker-only stub.
///
/// # Errors
///
/// Fails when the marker cannot be serialized.
pub fn encode_stub(node: &GraphNode) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    fields.insert(CONFIG_MARK.into(), marker(node)?);
    Ok(fields)
}
