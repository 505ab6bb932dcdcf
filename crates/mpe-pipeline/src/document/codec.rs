//! File-config entry reading and writing.

use serde_json::{Map, Value};

use super::{CONFIG_KEY_PREFIX, CONFIG_MARK, Document, FileConfig, config_marker, is_config_key};
use crate::{Result, TRACING_TARGET_DOCUMENT};

/// Reads the file config from the first file-config entry of `document`.
///
/// The payload is read through the first marker field present, falling back
/// to the entry itself. Returns an empty config when there is no entry or it
/// cannot be read.
pub fn parse_file_config(document: &Document) -> FileConfig {
    let Some((key, entry)) = document.iter().find(|(key, _)| is_config_key(key)) else {
        return FileConfig::default();
    };

    let payload = entry.as_object().and_then(config_marker).unwrap_or(entry);
    match serde_json::from_value(payload.clone()) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_DOCUMENT,
                key = %key,
                error = %err,
                "Ignoring unreadable file config"
            );
            FileConfig::default()
        }
    }
}

/// Builds the `$__mpe_config_<filename>` entry carrying `config`.
///
/// # Errors
///
/// Fails when `config` cannot be serialized.
pub fn file_config_entry(config: &FileConfig) -> Result<(String, Value)> {
    let mut marker = Map::new();
    marker.insert(CONFIG_MARK.to_owned(), serde_json::to_value(config)?);
    Ok((
        format!("{CONFIG_KEY_PREFIX}{}", config.filename),
        Value::Object(marker),
    ))
}
