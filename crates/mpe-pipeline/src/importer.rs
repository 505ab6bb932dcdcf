//! Document to graph import.

use serde_json::{Map, Value};

use crate::codec::{migrate_legacy, parse_field};
use crate::document::{
    ANCHOR_KEY_PREFIX, Document, EXTERNAL_KEY_PREFIX, FileConfig, MpeConfig, NodeConfig,
    config_marker, is_config_key, is_marker_key, merge, parse_document, parse_file_config,
    stub_name,
};
use crate::linker::{NameIndex, NodeRef, link_refs};
use crate::model::{GraphEdge, GraphNode, IdAllocator, NodeId, NodeKind, SourceHandle};
use crate::store::{GraphStore, LayoutEngine, Notification, Notifier};
use crate::version::detect_node_version;
use crate::{Error, Result, TRACING_TARGET_IMPORT};

/// A fully built graph, ready to be committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub file_config: FileConfig,
    /// Whether any node carried position metadata.
    pub has_positions: bool,
}

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub has_positions: bool,
}

/// A node created in the first pass, waiting for its connections.
struct Pending<'a> {
    key: &'a str,
    id: NodeId,
    object: &'a Map<String, Value>,
}

/// Builds graphs from pipeline documents.
///
/// Owns the [`IdAllocator`] of the session, so ids stay unique across
/// consecutive imports until [`IdAllocator::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    ids: IdAllocator,
}

impl Importer {
    /// Creates an importer allocating ids from `ids`.
    pub fn new(ids: IdAllocator) -> Self {
        Self { ids }
    }

    /// Returns the id allocator.
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Returns the id allocator for resetting or offsetting.
    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// Imports document text into `store`.
    ///
    /// A side-car config, when given, is merged into the document first. The
    /// store is only touched after the whole document is built; on failure a
    /// single [`Notification::ImportFailed`] is sent and the store is left as
    /// it was. Nodes are laid out by `layout` when none carried a position,
    /// otherwise the store is asked to fit the view.
    ///
    /// # Errors
    ///
    /// Fails on malformed text, unknown type names and invalid references.
    pub fn import(
        &mut self,
        text: &str,
        sidecar: Option<&MpeConfig>,
        store: &mut dyn GraphStore,
        layout: &mut dyn LayoutEngine,
        notifier: &mut dyn Notifier,
    ) -> Result<ImportSummary> {
        let built = parse_document(text).and_then(|document| {
            let document = match sidecar {
                Some(config) => merge(&document, config, None)?,
                None => document,
            };
            self.build(&document)
        });

        let graph = match built {
            Ok(graph) => graph,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_IMPORT,
                    error = %err,
                    "Import failed"
                );
                notifier.notify(Notification::ImportFailed {
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let summary = ImportSummary {
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
            has_positions: graph.has_positions,
        };

        store.replace(graph.nodes, graph.edges, graph.has_positions);
        store.set_file_config(graph.file_config);
        if !graph.has_positions {
            layout.auto_layout(store);
        }

        tracing::info!(
            target: TRACING_TARGET_IMPORT,
            node_count = summary.node_count,
            edge_count = summary.edge_count,
            has_positions = summary.has_positions,
            "Imported document"
        );
        notifier.notify(Notification::ImportSucceeded {
            node_count: summary.node_count,
            edge_count: summary.edge_count,
        });
        Ok(summary)
    }

    /// Builds the graph for `document` without committing it.
    ///
    /// # Errors
    ///
    /// Fails on non-object nodes, unknown type names and invalid references.
    pub fn build(&mut self, document: &Document) -> Result<ImportedGraph> {
        let file_config = parse_file_config(document);
        let mut graph = ImportedGraph::default();
        let mut index = NameIndex::default();
        let mut pending = Vec::new();

        for (key, value) in document {
            if is_config_key(key) {
                continue;
            }
            let object = value
                .as_object()
                .ok_or_else(|| Error::invalid_document(format!("node '{key}' must be an object")))?;

            let (kind, label) = if let Some(rest) = key.strip_prefix(EXTERNAL_KEY_PREFIX) {
                (NodeKind::External, stub_name(rest, &file_config.filename))
            } else if let Some(rest) = key.strip_prefix(ANCHOR_KEY_PREFIX) {
                (NodeKind::Anchor, stub_name(rest, &file_config.filename))
            } else {
                (NodeKind::Pipeline, file_config.unqualify(key).to_owned())
            };

            let id = self.ids.allocate(kind);
            let mut node = GraphNode::new(id.clone(), kind, label.clone());
            let versions = detect_node_version(object);

            if let Some(marker) = config_marker(object) {
                match serde_json::from_value::<NodeConfig>(marker.clone()) {
                    Ok(config) => {
                        node.position = config.position;
                        node.handle_direction = config.handle_direction;
                        graph.has_positions = true;
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: TRACING_TARGET_IMPORT,
                            key = %key,
                            error = %err,
                            "Ignoring unreadable node marker"
                        );
                    }
                }
            }

            for (field, value) in object {
                if is_marker_key(field) {
                    continue;
                }
                if !parse_field(&mut node, field, value, versions)? {
                    node.data.extras.insert(field.clone(), value.clone());
                }
            }
            migrate_legacy(&mut node);

            match kind {
                NodeKind::Anchor | NodeKind::External => index.insert(label, id.clone()),
                _ => index.insert(key.clone(), id.clone()),
            }

            tracing::trace!(
                target: TRACING_TARGET_IMPORT,
                key = %key,
                id = %id,
                kind = %kind,
                "Created node"
            );
            graph.nodes.push(node);
            pending.push(Pending { key, id, object });
        }

        for node in &pending {
            let mut next = connection_refs(node, "next")?;
            for mut reference in connection_refs(node, "interrupt")? {
                reference.jump_back = true;
                next.push(reference);
            }
            let on_error = connection_refs(node, "on_error")?;

            for (handle, refs) in [(SourceHandle::Next, next), (SourceHandle::OnError, on_error)] {
                if refs.is_empty() {
                    continue;
                }
                let linked = link_refs(&node.id, refs, handle, &index, &mut self.ids);
                graph.edges.extend(linked.edges);
                graph.nodes.extend(linked.nodes);
                index.extend(linked.index_additions);
            }
        }

        graph.file_config = file_config;
        Ok(graph)
    }
}

fn connection_refs(node: &Pending<'_>, field: &str) -> Result<Vec<NodeRef>> {
    match node.object.get(field) {
        Some(value) => NodeRef::parse_list(value).map_err(|err| match err {
            Error::InvalidReference { reference, reason } => Error::InvalidReference {
                reference,
                reason: format!("{reason} (in `{field}` of '{}')", node.key),
            },
            other => other,
        }),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use mpe_schema::{ActionType, RecognitionType};
    use serde_json::json;

    use super::*;
    use crate::model::{HandleDirection, Position};
    use crate::store::{MemoryGraphStore, MemoryNotifier, NoopLayout};
    use crate::document::split;
    use crate::{ExportSettings, Exporter, ProtocolVersion};

    #[derive(Default)]
    struct CountingLayout {
        calls: usize,
    }

    impl LayoutEngine for CountingLayout {
        fn auto_layout(&mut self, _store: &mut dyn GraphStore) {
            self.calls += 1;
        }
    }

    fn import(text: &str) -> (MemoryGraphStore, MemoryNotifier, Result<ImportSummary>) {
        let mut store = MemoryGraphStore::default();
        let mut notifier = MemoryNotifier::default();
        let result = Importer::default().import(text, None, &mut store, &mut NoopLayout, &mut notifier);
        (store, notifier, result)
    }

    fn find<'a>(store: &'a MemoryGraphStore, label: &str) -> &'a GraphNode {
        store
            .nodes
            .iter()
            .find(|node| node.label() == label)
            .unwrap()
    }

    fn no_config() -> ExportSettings {
        ExportSettings::builder()
            .with_export_config(false)
            .build()
            .unwrap()
    }

    const ROUND_TRIP: &str = r#"{
        "Start": {
            "recognition": { "type": "OCR", "param": { "expected": ["Start"], "roi": [0, 0, 100, 100] } },
            "action": { "type": "Click", "param": { "target": true } },
            "timeout": 3000,
            "next": ["Confirm", "[JumpBack]Back"],
            "on_error": ["Retry"]
        },
        "Confirm": {
            "recognition": { "type": "TemplateMatch", "param": { "template": ["ok.png"], "threshold": [0.8] } },
            "focus": { "start": "confirming" },
            "next": ["[Anchor]Home", "Elsewhere"]
        },
        "Back": {
            "action": { "type": "Swipe", "param": { "begin": [0, 0, 10, 10], "duration": 300 } }
        },
        "Retry": {}
    }"#;

    #[test]
    fn test_round_trip_v2() {
        let (store, notifier, result) = import(ROUND_TRIP);
        let summary = result.unwrap();
        assert_eq!(summary.node_count, 6);
        assert_eq!(summary.edge_count, 5);
        assert!(!summary.has_positions);
        assert!(matches!(
            notifier.notifications[0],
            Notification::ImportSucceeded { node_count: 6, edge_count: 5 }
        ));

        let exported = Exporter::new(no_config()).export(&store, &mut MemoryNotifier::default());
        let original = parse_document(ROUND_TRIP).unwrap();
        assert_eq!(exported, original);
    }

    #[test]
    fn test_placeholders_created() {
        let (store, _, result) = import(ROUND_TRIP);
        result.unwrap();

        let home = find(&store, "Home");
        assert_eq!(home.kind, NodeKind::Anchor);
        assert_eq!(home.id.as_str(), "a_5");
        let elsewhere = find(&store, "Elsewhere");
        assert_eq!(elsewhere.kind, NodeKind::External);

        let jump = store
            .edges
            .iter()
            .find(|edge| edge.target == find(&store, "Back").id)
            .unwrap();
        assert_eq!(jump.label, 2);
        assert!(jump.is_jump_back());
    }

    #[test]
    fn test_v1_normalized_to_v2() {
        let text = r#"{
            "A": { "recognition": "ocr", "expected": "Hi", "action": "click", "target": [1, 2, 3, 4], "next": "B" },
            "B": { "threshold": "0.9", "template": "b.png", "recognition": "TemplateMatch", "method": 1 }
        }"#;
        let (store, _, result) = import(text);
        result.unwrap();

        let a = find(&store, "A");
        assert_eq!(a.data.recognition.kind, RecognitionType::Ocr);
        assert_eq!(a.data.action.kind, ActionType::Click);

        let exported = Exporter::new(no_config()).export(&store, &mut MemoryNotifier::default());
        assert_eq!(
            exported["A"],
            json!({
                "recognition": { "type": "OCR", "param": { "expected": "Hi" } },
                "action": { "type": "Click", "param": { "target": [1, 2, 3, 4] } },
                "next": ["B"],
            })
        );
        assert_eq!(
            exported["B"]["recognition"],
            json!({ "type": "TemplateMatch", "param": { "threshold": 0.9, "template": "b.png", "method": 10001 } })
        );
    }

    #[test]
    fn test_v2_exported_as_v1() {
        let (store, _, result) = import(ROUND_TRIP);
        result.unwrap();
        let settings = ExportSettings::builder()
            .with_export_config(false)
            .with_protocol_version(ProtocolVersion::V1)
            .build()
            .unwrap();
        let exported = Exporter::new(settings).export(&store, &mut MemoryNotifier::default());
        assert_eq!(exported["Start"]["recognition"], json!("OCR"));
        assert_eq!(exported["Start"]["expected"], json!(["Start"]));
        assert_eq!(exported["Start"]["target"], json!(true));
    }

    #[test]
    fn test_interrupt_becomes_jump_back() {
        let text = r#"{ "A": { "next": ["B"], "interrupt": ["C"] }, "B": {}, "C": {} }"#;
        let (store, _, result) = import(text);
        result.unwrap();

        let exported = Exporter::new(no_config()).export(&store, &mut MemoryNotifier::default());
        assert_eq!(exported["A"], json!({ "next": ["B", "[JumpBack]C"] }));
    }

    #[test]
    fn test_metadata_restores_positions_and_names() {
        let text = r#"{
            "$__mpe_config_main": { "$__mpe_code": { "filename": "main", "prefix": "m" } },
            "$__mpe_external_Shared_Node_main": { "$__mpe_code": { "position": { "x": 9, "y": 9 } } },
            "m_Start": {
                "next": ["Shared_Node", "m_End"],
                "$__mpe_code": { "position": { "x": 10, "y": 20 }, "handleDirection": "top-bottom" }
            },
            "m_End": { "__yamaape": { "position": { "x": 30, "y": 40 } } }
        }"#;
        let mut store = MemoryGraphStore::default();
        let mut layout = CountingLayout::default();
        let summary = Importer::default()
            .import(text, None, &mut store, &mut layout, &mut MemoryNotifier::default())
            .unwrap();

        assert!(summary.has_positions);
        assert!(store.fit_view);
        assert_eq!(layout.calls, 0);
        assert_eq!(store.file_config.prefix(), Some("m"));
        assert_eq!(store.nodes.len(), 3);

        let start = find(&store, "Start");
        assert_eq!(start.position, Position::new(10.0, 20.0));
        assert_eq!(start.handle_direction, Some(HandleDirection::TopBottom));
        assert_eq!(find(&store, "End").position, Position::new(30.0, 40.0));
        assert_eq!(find(&store, "Shared_Node").kind, NodeKind::External);

        let exported = Exporter::new(ExportSettings::default()).export(&store, &mut MemoryNotifier::default());
        let original = parse_document(text).unwrap();
        assert_eq!(exported["m_Start"], original["m_Start"]);
        assert_eq!(
            exported["$__mpe_external_Shared_Node_main"],
            original["$__mpe_external_Shared_Node_main"]
        );
    }

    #[test]
    fn test_layout_called_without_positions() {
        let mut store = MemoryGraphStore::default();
        let mut layout = CountingLayout::default();
        Importer::default()
            .import(r#"{ "A": {} }"#, None, &mut store, &mut layout, &mut MemoryNotifier::default())
            .unwrap();
        assert_eq!(layout.calls, 1);
        assert!(!store.fit_view);
    }

    #[test]
    fn test_sidecar_merged_before_import() {
        let text = r#"{
            "$__mpe_config_main": { "$__mpe_code": { "filename": "main" } },
            "A": { "next": ["B"], "$__mpe_code": { "position": { "x": 1, "y": 2 } } },
            "B": { "$__mpe_code": { "position": { "x": 3, "y": 4 } } }
        }"#;
        let (pipeline, config) = split(&parse_document(text).unwrap());
        let pipeline_text = serde_json::to_string(&pipeline).unwrap();

        let mut store = MemoryGraphStore::default();
        Importer::default()
            .import(
                &pipeline_text,
                Some(&config),
                &mut store,
                &mut NoopLayout,
                &mut MemoryNotifier::default(),
            )
            .unwrap();
        assert_eq!(find(&store, "B").position, Position::new(3.0, 4.0));
        assert_eq!(store.file_config.filename, "main");
    }

    #[test]
    fn test_failure_leaves_store_untouched() {
        let mut store = MemoryGraphStore::default();
        store.set_file_config(FileConfig {
            filename: "kept".into(),
            ..FileConfig::default()
        });
        let before = store.clone();

        for text in [
            r#"{ "A": { "recognition": "Ocrr" } }"#,
            r#"{ "A": { "next": [42] } }"#,
            r#"{ "A": 1 }"#,
            r#"{ "A": "#,
        ] {
            let mut notifier = MemoryNotifier::default();
            let result = Importer::default().import(text, None, &mut store, &mut NoopLayout, &mut notifier);
            assert!(result.is_err(), "{text}");
            assert_eq!(store, before);
            assert_eq!(notifier.notifications.len(), 1);
            assert!(matches!(notifier.notifications[0], Notification::ImportFailed { .. }));
        }
    }

    #[test]
    fn test_reference_error_names_node() {
        let (_, _, result) = import(r#"{ "A": { "on_error": [true] } }"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("on_error"), "{message}");
        assert!(message.contains("'A'"), "{message}");
    }

    #[test]
    fn test_ids_continue_across_imports() {
        let mut importer = Importer::new(IdAllocator::starting_at(100));
        let graph = importer.build(&parse_document(r#"{ "A": {} }"#).unwrap()).unwrap();
        assert_eq!(graph.nodes[0].id.as_str(), "p_100");
        let graph = importer.build(&parse_document(r#"{ "A": {} }"#).unwrap()).unwrap();
        assert_eq!(graph.nodes[0].id.as_str(), "p_101");

        importer.ids_mut().reset();
        assert_eq!(importer.ids().peek(), 1);
    }
}
