//! Splitting a document into a pipeline file and a side-car metadata file.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{
    ANCHOR_KEY_PREFIX, CONFIG_MARK, CONFIG_MARKS, Document, EXTERNAL_KEY_PREFIX, FileConfig,
    MpeConfig, NodeConfig, config_marker, file_config_entry, is_config_key, parse_file_config,
    stub_key, stub_name,
};
use crate::{Result, TRACING_TARGET_DOCUMENT};

/// File name used when neither the caller nor the config names the file.
pub const DEFAULT_FILE_NAME: &str = "untitled";

fn read_node_config(key: &str, value: &Value) -> Option<NodeConfig> {
    let marker = value.as_object().and_then(config_marker)?;
    match serde_json::from_value(marker.clone()) {
        Ok(config) => Some(config),
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                key = %key,
                error = %err,
                "Ignoring unreadable node marker"
            );
            None
        }
    }
}

/// Splits `document` into a marker-free pipeline and its metadata.
pub fn split(document: &Document) -> (Document, MpeConfig) {
    let mut config = MpeConfig {
        file_config: parse_file_config(document),
        ..MpeConfig::default()
    };
    let filename = config.file_config.filename.clone();

    let mut pipeline = Document::new();
    let mut external_nodes = IndexMap::new();
    let mut anchor_nodes = IndexMap::new();

    for (key, value) in document {
        if is_config_key(key) {
            continue;
        }

        if let Some(rest) = key.strip_prefix(EXTERNAL_KEY_PREFIX) {
            let node_config = read_node_config(key, value).unwrap_or_default();
            external_nodes.insert(stub_name(rest, &filename), node_config);
            continue;
        }
        if let Some(rest) = key.strip_prefix(ANCHOR_KEY_PREFIX) {
            let node_config = read_node_config(key, value).unwrap_or_default();
            anchor_nodes.insert(stub_name(rest, &filename), node_config);
            continue;
        }

        let Value::Object(node) = value else {
            pipeline.insert(key.clone(), value.clone());
            continue;
        };

        if let Some(node_config) = read_node_config(key, value) {
            config.node_configs.insert(key.clone(), node_config);
        }
        let pure: Map<String, Value> = node
            .iter()
            .filter(|(field, _)| !CONFIG_MARKS.contains(&field.as_str()))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        pipeline.insert(key.clone(), Value::Object(pure));
    }

    config.external_nodes = (!external_nodes.is_empty()).then_some(external_nodes);
    config.anchor_nodes = (!anchor_nodes.is_empty()).then_some(anchor_nodes);

    tracing::debug!(
        target: TRACING_TARGET_DOCUMENT,
        node_count = pipeline.len(),
        node_config_count = config.node_configs.len(),
        "Split document"
    );
    (pipeline, config)
}

fn stub(node_config: &NodeConfig) -> Result<Value> {
    let mut object = Map::new();
    object.insert(CONFIG_MARK.to_owned(), serde_json::to_value(node_config)?);
    Ok(Value::Object(object))
}

/// Merges a pipeline and its metadata back into one document.
///
/// The file name is taken from `filename`, then from the config, then
/// [`DEFAULT_FILE_NAME`]. Nodes without metadata are placed at the origin.
///
/// # Errors
///
/// Fails when metadata cannot be serialized.
pub fn merge(pipeline: &Document, config: &MpeConfig, filename: Option<&str>) -> Result<Document> {
    let filename = filename
        .filter(|name| !name.is_empty())
        .or_else(|| Some(config.file_config.filename.as_str()).filter(|name| !name.is_empty()))
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_owned();

    let mut merged = Document::new();
    let file_config = FileConfig {
        filename: filename.clone(),
        ..config.file_config.clone()
    };
    let (key, entry) = file_config_entry(&file_config)?;
    merged.insert(key, entry);

    for (prefix, stubs) in [
        (EXTERNAL_KEY_PREFIX, &config.external_nodes),
        (ANCHOR_KEY_PREFIX, &config.anchor_nodes),
    ] {
        for (name, node_config) in stubs.iter().flatten() {
            merged.insert(stub_key(prefix, name, &filename), stub(node_config)?);
        }
    }

    for (key, value) in pipeline {
        if is_config_key(key)
            || key.starts_with(EXTERNAL_KEY_PREFIX)
            || key.starts_with(ANCHOR_KEY_PREFIX)
        {
            continue;
        }
        let Value::Object(node) = value else {
            merged.insert(key.clone(), value.clone());
            continue;
        };

        let mut node: Map<String, Value> = node
            .iter()
            .filter(|(field, _)| !CONFIG_MARKS.contains(&field.as_str()))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        let node_config = config.node_configs.get(key).copied().unwrap_or_default();
        node.insert(CONFIG_MARK.to_owned(), serde_json::to_value(node_config)?);
        merged.insert(key.clone(), Value::Object(node));
    }

    Ok(merged)
}

/// Returns the side-car file name for a pipeline file, e.g. `.a.mpe.json`.
pub fn config_file_name(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    let base = [".jsonc", ".json"]
        .iter()
        .find(|extension| lower.ends_with(*extension))
        .map_or(file_name, |extension| {
            &file_name[..file_name.len() - extension.len()]
        });
    format!(".{base}.mpe.json")
}

/// Returns the pipeline name a side-car file belongs to.
pub fn pipeline_file_name_from_config(config_file_name: &str) -> String {
    const SUFFIX: &str = ".mpe.json";

    let name = config_file_name.strip_prefix('.').unwrap_or(config_file_name);
    let lower = name.to_ascii_lowercase();
    match lower.strip_suffix(SUFFIX) {
        Some(_) => name[..name.len() - SUFFIX.len()].to_owned(),
        None => name.to_owned(),
    }
}
