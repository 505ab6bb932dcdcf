//! Document node fields to graph node data.

use mpe_schema::{ActionType, FieldType, RecognitionType, is_other_field_key, match_single};
use serde_json::{Map, Value};

use crate::model::{Action, GraphNode, Recognition};
use crate::version::{NodeVersions, ProtocolVersion};
use crate::{Error, Result};

/// Connection fields, linked after every node exists.
pub const CONNECTION_KEYS: [&str; 3] = ["next", "on_error", "interrupt"];

/// Returns whether `key` is a connection field.
pub fn is_connection_key(key: &str) -> bool {
    CONNECTION_KEYS.contains(&key)
}

/// Applies one document field to `node`.
///
/// Returns `Ok(false)` when the field is not part of the protocol; the caller
/// keeps such fields verbatim in `extras`. Connection fields are consumed
/// without effect.
///
/// # Errors
///
/// Fails on unknown type names and on `recognition`/`action` values of an
/// unusable shape.
pub fn parse_field(
    node: &mut GraphNode,
    key: &str,
    value: &Value,
    versions: NodeVersions,
) -> Result<bool> {
    if is_connection_key(key) {
        return Ok(true);
    }

    let data = &mut node.data;
    match key {
        "recognition" => {
            match versions.recognition {
                ProtocolVersion::V1 => {
                    data.recognition.kind = RecognitionType::normalize(type_name(key, value)?)?;
                }
                ProtocolVersion::V2 => {
                    let (kind, param) = typed_object(key, value)?;
                    data.recognition = Recognition {
                        kind: kind
                            .map(RecognitionType::normalize)
                            .transpose()?
                            .unwrap_or(RecognitionType::NOOP),
                        param,
                    };
                }
            }
            return Ok(true);
        }
        "action" => {
            match versions.action {
                ProtocolVersion::V1 => {
                    data.action.kind = ActionType::normalize(type_name(key, value)?)?;
                }
                ProtocolVersion::V2 => {
                    let (kind, param) = typed_object(key, value)?;
                    data.action = Action {
                        kind: kind
                            .map(ActionType::normalize)
                            .transpose()?
                            .unwrap_or(ActionType::NOOP),
                        param,
                    };
                }
            }
            return Ok(true);
        }
        _ => {}
    }

    if versions.recognition == ProtocolVersion::V1 && RecognitionType::is_param_key(key) {
        data.recognition.param.insert(key.to_owned(), value.clone());
    } else if versions.action == ProtocolVersion::V1 && ActionType::is_param_key(key) {
        data.action.param.insert(key.to_owned(), value.clone());
    } else if is_other_field_key(key) {
        data.others.insert(key.to_owned(), value.clone());
    } else {
        return Ok(false);
    }
    Ok(true)
}

fn type_name<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::invalid_document(format!("`{key}` must be a type name, found {value}")))
}

/// Splits a `{type, param}` object; a missing `type` yields `None` and a
/// missing `param` an empty map.
fn typed_object<'a>(key: &str, value: &'a Value) -> Result<(Option<&'a str>, Map<String, Value>)> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::invalid_document(format!("`{key}` must be an object, found {value}")))?;

    let kind = match object.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.as_str()),
        Some(other) => {
            return Err(Error::invalid_document(format!(
                "`{key}.type` must be a string, found {other}"
            )));
        }
    };

    let param = match object.get("param") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(param)) => param.clone(),
        Some(other) => {
            return Err(Error::invalid_document(format!(
                "`{key}.param` must be an object, found {other}"
            )));
        }
    };

    Ok((kind, param))
}

/// Rewrites parameter values whose meaning changed between engine releases.
///
/// TemplateMatch `method: 1` (TM_SQDIFF_NORMED) became the inverted `10001`.
pub fn migrate_legacy(node: &mut GraphNode) {
    let recognition = &mut node.data.recognition;
    if recognition.kind != RecognitionType::TemplateMatch {
        return;
    }

    if let Some(method) = recognition.param.get_mut("method")
        && match_single(method, FieldType::Int).ok() == Some(Value::from(1))
    {
        *method = Value::from(10001);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{NodeId, NodeKind};
    use crate::version::detect_node_version;

    fn decode(value: Value) -> Result<GraphNode> {
        let object = value.as_object().cloned().unwrap();
        let versions = detect_node_version(&object);
        let mut node = GraphNode::new(NodeId::from("p_1"), NodeKind::Pipeline, "N");
        for (key, value) in &object {
            if !parse_field(&mut node, key, value, versions)? {
                node.data.extras.insert(key.clone(), value.clone());
            }
        }
        migrate_legacy(&mut node);
        Ok(node)
    }

    #[test]
    fn test_v2_fields() {
        let node = decode(json!({
            "recognition": { "type": "ocr", "param": { "expected": ["a"] } },
            "action": { "type": "click" },
            "timeout": 100,
            "next": ["B"],
            "custom": 1,
        }))
        .unwrap();

        assert_eq!(node.data.recognition.kind, RecognitionType::Ocr);
        assert_eq!(node.data.recognition.param["expected"], json!(["a"]));
        assert_eq!(node.data.action.kind, ActionType::Click);
        assert!(node.data.action.param.is_empty());
        assert_eq!(node.data.others["timeout"], json!(100));
        assert_eq!(node.data.extras.len(), 1);
        assert_eq!(node.data.extras["custom"], json!(1));
    }

    #[test]
    fn test_v2_missing_type_is_noop() {
        let node = decode(json!({ "recognition": { "param": { "roi": [0, 0, 1, 1] } } })).unwrap();
        assert_eq!(node.data.recognition.kind, RecognitionType::DirectHit);
        assert_eq!(node.data.recognition.param["roi"], json!([0, 0, 1, 1]));
    }

    #[test]
    fn test_v1_flat_fields() {
        let node = decode(json!({
            "recognition": "TemplateMatch",
            "template": "a.png",
            "action": "Click",
            "target": [1, 2, 3, 4],
            "post_delay": 0,
        }))
        .unwrap();

        assert_eq!(node.data.recognition.kind, RecognitionType::TemplateMatch);
        assert_eq!(node.data.recognition.param["template"], json!("a.png"));
        assert_eq!(node.data.action.param["target"], json!([1, 2, 3, 4]));
        assert_eq!(node.data.others["post_delay"], json!(0));
        assert!(node.data.extras.is_empty());
    }

    #[test]
    fn test_flat_keys_in_v2_node_are_extras() {
        let node = decode(json!({
            "recognition": { "type": "OCR", "param": {} },
            "action": { "type": "Click", "param": {} },
            "threshold": 0.5,
        }))
        .unwrap();
        assert_eq!(node.data.extras["threshold"], json!(0.5));
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let err = decode(json!({ "recognition": "Ocrr" })).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = decode(json!({ "action": { "type": 3 } })).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_legacy_template_method() {
        let node = decode(json!({
            "recognition": { "type": "TemplateMatch", "param": { "method": 1 } },
        }))
        .unwrap();
        assert_eq!(node.data.recognition.param["method"], json!(10001));

        let node = decode(json!({
            "recognition": { "type": "ColorMatch", "param": { "method": 1 } },
        }))
        .unwrap();
        assert_eq!(node.data.recognition.param["method"], json!(1));
    }
}
