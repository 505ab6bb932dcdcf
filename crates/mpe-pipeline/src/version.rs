//! Protocol version detection and type-name normalization.
//!
//! Documents mix two schemas. Version 1 writes `recognition: "OCR"` and spreads
//! parameters over the node, version 2 nests `{type, param}`. Recognition and
//! action are classified independently, so one node may use both.

use mpe_schema::{ActionType, RecognitionType, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Document protocol version.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProtocolVersion {
    /// Flat parameters, bare type strings.
    V1,
    /// Nested `{type, param}` objects.
    #[default]
    V2,
}

/// Detected versions of one document node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeVersions {
    pub recognition: ProtocolVersion,
    pub action: ProtocolVersion,
}

fn detect(node: &Map<String, Value>, field: &str, is_param_key: fn(&str) -> bool) -> ProtocolVersion {
    match node.get(field) {
        Some(Value::String(_)) => ProtocolVersion::V1,
        Some(_) => ProtocolVersion::V2,
        None if node.keys().any(|key| is_param_key(key)) => ProtocolVersion::V1,
        None => ProtocolVersion::V2,
    }
}

/// Classifies the recognition field of `node`.
pub fn detect_recognition_version(node: &Map<String, Value>) -> ProtocolVersion {
    detect(node, "recognition", RecognitionType::is_param_key)
}

/// Classifies the action field of `node`.
pub fn detect_action_version(node: &Map<String, Value>) -> ProtocolVersion {
    detect(node, "action", ActionType::is_param_key)
}

/// Classifies both fields of `node`.
pub fn detect_node_version(node: &Map<String, Value>) -> NodeVersions {
    NodeVersions {
        recognition: detect_recognition_version(node),
        action: detect_action_version(node),
    }
}

/// Maps any casing of a recognition type name to its canonical type.
pub fn normalize_recognition_type(name: &str) -> Result<RecognitionType, SchemaError> {
    RecognitionType::normalize(name)
}

/// Maps any casing of an action type name to its canonical type.
pub fn normalize_action_type(name: &str) -> Result<ActionType, SchemaError> {
    ActionType::normalize(name)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flat_params_mean_v1() {
        let node = object(json!({ "threshold": 0.5 }));
        assert_eq!(detect_recognition_version(&node), ProtocolVersion::V1);
        assert_eq!(detect_action_version(&node), ProtocolVersion::V2);
    }

    #[test]
    fn test_nested_object_means_v2() {
        let node = object(json!({ "recognition": { "type": "OCR", "param": {} } }));
        assert_eq!(detect_recognition_version(&node), ProtocolVersion::V2);
    }

    #[test]
    fn test_string_type_means_v1() {
        let node = object(json!({ "recognition": "OCR", "action": { "type": "Click" } }));
        let versions = detect_node_version(&node);
        assert_eq!(versions.recognition, ProtocolVersion::V1);
        assert_eq!(versions.action, ProtocolVersion::V2);
    }

    #[test]
    fn test_fields_detected_independently() {
        let node = object(json!({
            "recognition": { "type": "OCR", "param": { "expected": "a" } },
            "target": [0, 0, 1, 1],
        }));
        let versions = detect_node_version(&node);
        assert_eq!(versions.recognition, ProtocolVersion::V2);
        assert_eq!(versions.action, ProtocolVersion::V1);
    }

    #[test]
    fn test_empty_node_defaults_to_v2() {
        let versions = detect_node_version(&Map::new());
        assert_eq!(versions, NodeVersions::default());
    }

    #[test]
    fn test_normalize_type_names() {
        assert_eq!(normalize_recognition_type("ocr").unwrap().as_str(), "OCR");
        assert!(normalize_recognition_type("Ocrr").is_err());
        assert_eq!(normalize_action_type("swipe").unwrap(), ActionType::Swipe);
    }
}
