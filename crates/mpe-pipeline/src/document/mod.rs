//! Pipeline documents and editor metadata.
//!
//! Editor metadata travels inside the document under reserved keys: one
//! file-config entry, an optional marker field per node, and marker-only stubs
//! for external and anchor nodes. Older editor releases used different
//! spellings, which are still read.

use serde_json::{Map, Value};

mod codec;
mod config;
mod jsonc;
mod splitter;

pub use codec::{file_config_entry, parse_file_config};
pub use config::{FileConfig, MpeConfig, NodeConfig, Viewport};
pub use jsonc::{parse_document, strip_jsonc, to_pretty_string};
pub use splitter::{config_file_name, merge, pipeline_file_name_from_config, split};

/// A pipeline document: node name to node object, in document order.
pub type Document = Map<String, Value>;

/// Marker field written by this tool.
pub const CONFIG_MARK: &str = "$__mpe_code";

/// Marker field names, in lookup priority order.
pub const CONFIG_MARKS: [&str; 3] = [CONFIG_MARK, "__mpe_code", "__yamaape"];

/// Prefix of the file-config key written by this tool.
pub const CONFIG_KEY_PREFIX: &str = "$__mpe_config_";

/// File-config key prefixes, in lookup priority order.
pub const CONFIG_KEY_PREFIXES: [&str; 3] = [CONFIG_KEY_PREFIX, "__mpe_config_", "__yamaape_config_"];

/// Prefix of external node stub keys.
pub const EXTERNAL_KEY_PREFIX: &str = "$__mpe_external_";

/// Prefix of anchor node stub keys.
pub const ANCHOR_KEY_PREFIX: &str = "$__mpe_anchor_";

/// Returns whether `key` holds the file config.
pub fn is_config_key(key: &str) -> bool {
    CONFIG_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Returns whether `key` is a node marker field.
pub fn is_marker_key(key: &str) -> bool {
    CONFIG_MARKS.contains(&key)
}

/// Returns the first non-null marker payload of `object`.
pub fn config_marker(object: &Map<String, Value>) -> Option<&Value> {
    CONFIG_MARKS
        .iter()
        .filter_map(|mark| object.get(*mark))
        .find(|value| !value.is_null())
}

/// Recovers a stub node name from the key remainder after its prefix.
///
/// Stub keys end in `_<filename>`. When `filename` is unknown or does not
/// match, the last underscore-delimited segment is dropped instead, which
/// truncates names containing underscores.
pub fn stub_name(rest: &str, filename: &str) -> String {
    if !filename.is_empty()
        && let Some(name) = rest
            .strip_suffix(filename)
            .and_then(|head| head.strip_suffix('_'))
    {
        return name.to_owned();
    }

    match rest.rsplit_once('_') {
        Some((name, _)) => name.to_owned(),
        None => rest.to_owned(),
    }
}

/// Builds a stub key for `name` under `prefix`.
pub fn stub_key(prefix: &str, name: &str, filename: &str) -> String {
    format!("{prefix}{name}_{filename}")
}
