//! Graph to document export.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::codec::{encode_node, encode_stub};
use crate::document::{
    ANCHOR_KEY_PREFIX, Document, EXTERNAL_KEY_PREFIX, FileConfig, file_config_entry, split,
    stub_key, to_pretty_string,
};
use crate::linker::NodeRef;
use crate::model::{GraphEdge, GraphNode, NodeId, NodeKind};
use crate::store::{GraphStore, Notification, Notifier};
use crate::{Error, ExportSettings, Result, TRACING_TARGET_EXPORT};

/// Writes the graph held by a [`GraphStore`] as a pipeline document.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    settings: ExportSettings,
}

impl Exporter {
    /// Creates an exporter with `settings`.
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Returns the export settings.
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Exports the graph as a document.
    ///
    /// Returns an empty document, after notifying, when the store reports a
    /// name collision or encoding fails. Dropped parameters are reported as
    /// [`Notification::TypeMismatch`].
    pub fn export(&self, store: &dyn GraphStore, notifier: &mut dyn Notifier) -> Document {
        if store.has_name_collision() {
            tracing::warn!(
                target: TRACING_TARGET_EXPORT,
                "Export blocked by duplicate node names"
            );
            notifier.notify(Notification::ExportBlocked);
            return Document::new();
        }

        match self.build(store, notifier) {
            Ok(document) => {
                let node_count = store.nodes().iter().filter(|node| node.is_pipeline()).count();
                tracing::info!(
                    target: TRACING_TARGET_EXPORT,
                    node_count,
                    key_count = document.len(),
                    "Exported document"
                );
                notifier.notify(Notification::ExportSucceeded { node_count });
                document
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_EXPORT,
                    error = %err,
                    "Export failed"
                );
                notifier.notify(Notification::ExportFailed {
                    reason: err.to_string(),
                });
                Document::new()
            }
        }
    }

    /// Exports the graph as document text indented with four spaces.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be serialized.
    pub fn export_string(&self, store: &dyn GraphStore, notifier: &mut dyn Notifier) -> Result<String> {
        to_pretty_string(&self.export(store, notifier))
    }

    /// Exports the graph as `(pipeline, side-car config)` texts.
    ///
    /// # Errors
    ///
    /// Fails when either part cannot be serialized.
    pub fn export_separated(
        &self,
        store: &dyn GraphStore,
        notifier: &mut dyn Notifier,
    ) -> Result<(String, String)> {
        let settings = ExportSettings {
            export_config: true,
            ..self.settings.clone()
        };
        let document = Exporter::new(settings).export(store, notifier);
        let (pipeline, config) = split(&document);
        Ok((to_pretty_string(&pipeline)?, to_pretty_string(&config)?))
    }

    fn build(&self, store: &dyn GraphStore, notifier: &mut dyn Notifier) -> Result<Document> {
        let file_config = store.file_config();
        let filename = file_config.filename.as_str();

        let order = store.node_order();
        let mut nodes: Vec<&GraphNode> = store.nodes().iter().collect();
        nodes.sort_by_key(|node| order.get(&node.id).copied().unwrap_or(usize::MAX));

        let mut document = Document::new();
        let mut source_keys: HashMap<&NodeId, String> = HashMap::new();

        for &node in &nodes {
            match node.kind {
                NodeKind::Pipeline => {
                    let key = file_config.qualify(node.label());
                    let encoded = encode_node(node, &self.settings)?;
                    for mismatch in encoded.mismatches {
                        notifier.notify(mismatch.into());
                    }
                    document.insert(key.clone(), Value::Object(encoded.fields));
                    source_keys.insert(&node.id, key);
                }
                NodeKind::External | NodeKind::Anchor if self.settings.export_config => {
                    let prefix = if node.kind == NodeKind::External {
                        EXTERNAL_KEY_PREFIX
                    } else {
                        ANCHOR_KEY_PREFIX
                    };
                    let key = stub_key(prefix, node.label(), filename);
                    document.insert(key, Value::Object(encode_stub(node)?));
                }
                _ => {}
            }
        }

        self.write_connections(store, &nodes, &source_keys, &mut document)?;

        if !self.settings.export_config {
            return Ok(document);
        }

        let config = FileConfig {
            version: Some(format!("v{}", self.settings.tool_version)),
            ..file_config.clone()
        };
        let (key, entry) = file_config_entry(&config)?;
        let mut with_config = Document::new();
        with_config.insert(key, entry);
        with_config.extend(document);
        Ok(with_config)
    }

    fn write_connections(
        &self,
        store: &dyn GraphStore,
        nodes: &[&GraphNode],
        source_keys: &HashMap<&NodeId, String>,
        document: &mut Document,
    ) -> Result<()> {
        let file_config = store.file_config();
        let by_id: HashMap<&NodeId, &GraphNode> = nodes.iter().map(|&node| (&node.id, node)).collect();
        let exported: HashSet<String> = source_keys.values().cloned().collect();

        let mut edges: Vec<&GraphEdge> = store.edges().iter().collect();
        edges.sort_by(|a, b| a.source.cmp(&b.source).then(a.label.cmp(&b.label)));

        for edge in edges {
            let Some(source_key) = source_keys.get(&edge.source) else {
                continue;
            };
            let Some(target) = by_id.get(&edge.target) else {
                tracing::debug!(
                    target: TRACING_TARGET_EXPORT,
                    edge = %edge.id,
                    "Skipping edge to a missing node"
                );
                continue;
            };

            let qualified = file_config.qualify(target.label());
            let name = if target.is_pipeline() && exported.contains(&qualified) {
                qualified
            } else {
                target.label().to_owned()
            };
            let reference = NodeRef {
                name,
                anchor: target.kind == NodeKind::Anchor || edge.is_anchor(),
                jump_back: edge.is_jump_back(),
            };

            let Some(Value::Object(source)) = document.get_mut(source_key) else {
                return Err(Error::invalid_document(format!(
                    "exported node '{source_key}' is not an object"
                )));
            };
            let field = edge.source_handle.document_key();
            let Value::Array(refs) = source
                .entry(field)
                .or_insert_with(|| Value::Array(Vec::new()))
            else {
                return Err(Error::invalid_document(format!(
                    "node '{source_key}' already has a non-array `{field}` field"
                )));
            };
            refs.push(reference.to_value(self.settings.attr_style));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mpe_schema::{ActionType, RecognitionType};
    use serde_json::json;

    use super::*;
    use crate::model::{EdgeAttributes, Position, SourceHandle};
    use crate::store::{MemoryGraphStore, MemoryNotifier};
    use crate::{AttrStyle, ProtocolVersion};

    fn pipeline(id: &str, label: &str) -> GraphNode {
        GraphNode::new(NodeId::from(id), NodeKind::Pipeline, label)
    }

    fn no_config() -> ExportSettings {
        ExportSettings::builder()
            .with_export_config(false)
            .build()
            .unwrap()
    }

    fn sample_store() -> MemoryGraphStore {
        let mut start = pipeline("p_1", "Start");
        start.data.recognition.kind = RecognitionType::Ocr;
        start.data.action.kind = ActionType::Click;
        let end = pipeline("p_2", "End");
        let anchor = GraphNode::new(NodeId::from("a_3"), NodeKind::Anchor, "Home")
            .with_position(Position::new(4.0, 5.0));
        let external = GraphNode::new(NodeId::from("e_4"), NodeKind::External, "Shared");
        let sticker = GraphNode::new(NodeId::from("s_5"), NodeKind::Sticker, "Note");

        let edges = vec![
            GraphEdge::new("p_1".into(), SourceHandle::Next, "e_4".into(), 3),
            GraphEdge::new("p_1".into(), SourceHandle::Next, "p_2".into(), 1),
            GraphEdge::new("p_1".into(), SourceHandle::JumpBack, "a_3".into(), 2),
            GraphEdge::new("p_1".into(), SourceHandle::OnError, "p_2".into(), 1),
            GraphEdge::new("e_4".into(), SourceHandle::Next, "p_2".into(), 1),
        ];

        let mut store = MemoryGraphStore::default();
        store.replace(vec![start, end, anchor, external, sticker], edges, true);
        store.file_config.filename = "main".into();
        store
    }

    #[test]
    fn test_connections_ordered_by_label() {
        let store = sample_store();
        let mut notifier = MemoryNotifier::default();
        let document = Exporter::new(no_config()).export(&store, &mut notifier);

        assert_eq!(
            document["Start"]["next"],
            json!(["End", "[Anchor][JumpBack]Home", "Shared"])
        );
        assert_eq!(document["Start"]["on_error"], json!(["End"]));
        assert_eq!(document["End"], json!({}));
        assert_eq!(document.len(), 2);
        assert_eq!(
            notifier.notifications,
            vec![Notification::ExportSucceeded { node_count: 2 }]
        );
    }

    #[test]
    fn test_object_style_attributes() {
        let store = sample_store();
        let settings = ExportSettings::builder()
            .with_export_config(false)
            .with_attr_style(AttrStyle::Object)
            .build()
            .unwrap();
        let document = Exporter::new(settings).export(&store, &mut MemoryNotifier::default());
        assert_eq!(
            document["Start"]["next"][1],
            json!({"name": "Home", "anchor": true, "jump_back": true})
        );
    }

    #[test]
    fn test_metadata_entries() {
        let mut store = sample_store();
        store.file_config.prefix = Some("m".into());
        let settings = ExportSettings::builder()
            .with_tool_version("1.2.3")
            .build()
            .unwrap();
        let document = Exporter::new(settings).export(&store, &mut MemoryNotifier::default());

        let keys: Vec<&str> = document.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "$__mpe_config_main",
                "m_Start",
                "m_End",
                "$__mpe_anchor_Home_main",
                "$__mpe_external_Shared_main",
            ]
        );
        assert_eq!(
            document["$__mpe_config_main"]["$__mpe_code"],
            json!({"filename": "main", "version": "v1.2.3", "prefix": "m"})
        );
        assert_eq!(document["m_Start"]["next"][0], json!("m_End"));
        assert_eq!(
            document["$__mpe_anchor_Home_main"],
            json!({"$__mpe_code": {"position": {"x": 4, "y": 5}}})
        );
    }

    #[test]
    fn test_edge_attribute_marks_jump_back() {
        let edges = vec![
            GraphEdge::new("p_1".into(), SourceHandle::Next, "p_2".into(), 1).with_attributes(
                EdgeAttributes {
                    jump_back: true,
                    anchor: false,
                },
            ),
        ];
        let store = MemoryGraphStore::new(vec![pipeline("p_1", "A"), pipeline("p_2", "B")], edges);
        let document = Exporter::new(no_config()).export(&store, &mut MemoryNotifier::default());
        assert_eq!(document["A"]["next"], json!(["[JumpBack]B"]));
    }

    #[test]
    fn test_collision_blocks_export() {
        let mut store = sample_store();
        store.name_collision = true;
        let mut notifier = MemoryNotifier::default();
        let document = Exporter::default().export(&store, &mut notifier);
        assert!(document.is_empty());
        assert_eq!(notifier.notifications, vec![Notification::ExportBlocked]);
    }

    #[test]
    fn test_type_mismatch_notified() {
        let mut node = pipeline("p_1", "A");
        node.data.others.insert("timeout".into(), json!("soon"));
        let store = MemoryGraphStore::new(vec![node], Vec::new());
        let mut notifier = MemoryNotifier::default();
        let document = Exporter::new(no_config()).export(&store, &mut notifier);

        assert_eq!(document["A"], json!({}));
        assert!(matches!(
            &notifier.notifications[0],
            Notification::TypeMismatch { key, .. } if key == "timeout"
        ));
    }

    #[test]
    fn test_pretty_and_separated_output() {
        let store = sample_store();
        let exporter = Exporter::new(
            ExportSettings::builder()
                .with_protocol_version(ProtocolVersion::V1)
                .build()
                .unwrap(),
        );
        let text = exporter.export_string(&store, &mut MemoryNotifier::default()).unwrap();
        assert!(text.contains("\n    \"$__mpe_config_main\": {"));

        let (pipeline, config) = exporter
            .export_separated(&store, &mut MemoryNotifier::default())
            .unwrap();
        let pipeline: Value = serde_json::from_str(&pipeline).unwrap();
        let config: Value = serde_json::from_str(&config).unwrap();
        assert_eq!(pipeline["Start"]["recognition"], json!("OCR"));
        assert!(pipeline["Start"].get("$__mpe_code").is_none());
        assert_eq!(config["file_config"]["filename"], json!("main"));
        assert!(config["node_configs"]["Start"]["position"].is_object());
    }

    #[test]
    fn test_node_order_respected() {
        let mut store = MemoryGraphStore::new(
            vec![pipeline("p_1", "First"), pipeline("p_2", "Second")],
            Vec::new(),
        );
        store.node_order = HashMap::from([(NodeId::from("p_2"), 0)]);
        let document = Exporter::new(no_config()).export(&store, &mut MemoryNotifier::default());
        let keys: Vec<&str> = document.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Second", "First"]);
    }
}
