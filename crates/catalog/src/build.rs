//! Configuration construction: parse, link, prune.

use settings::{Language, Settings};

use crate::document::{GroupDoc, GroupItemDoc, LayersDocument};
use crate::ids::{IdAlloc, ItemId, LayerId};
use crate::layer::{Layer, LayerDefaults, LayerSet};
use crate::tree::{Context, Group, Item, ItemArena};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    UnsupportedStatisticsType { kind: String },
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::UnsupportedStatisticsType { kind } => {
                write!(f, "unsupported statistics type: {kind}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// The in-memory layer-configuration tree.
///
/// `contexts` and `layers` are the transitive closure of what the root group
/// references: everything else in the source document is discarded during
/// construction and never serialized back.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub items: ItemArena,
    pub root: ItemId,
    /// Reachable contexts, in discovery order (document order, then
    /// synthesized placeholders in creation order).
    pub contexts: Vec<ItemId>,
    pub layers: LayerSet,
}

impl Configuration {
    pub fn from_document(doc: &LayersDocument, settings: &Settings) -> Result<Self, BuildError> {
        let defaults = LayerDefaults::from_settings(settings);
        Self::build(doc, &settings.languages, &defaults)
    }

    /// Construction against one immutable raw document, in four steps:
    /// layers, contexts, the group tree, then pruning of everything the tree
    /// does not reach. Only an unsupported statistics type fails the build;
    /// dangling references degrade to placeholders or silent drops.
    pub fn build(
        doc: &LayersDocument,
        languages: &[Language],
        defaults: &LayerDefaults,
    ) -> Result<Self, BuildError> {
        let mut layer_ids = IdAlloc::new();
        let mut layers = LayerSet::new();
        for layer_doc in &doc.layers {
            layers.push(Layer::from_doc(
                layer_doc,
                LayerId(layer_ids.allocate()),
                defaults,
                languages,
            )?);
        }

        let mut item_ids = IdAlloc::new();
        let mut arena = ItemArena::new();
        let mut contexts: Vec<ItemId> = Vec::with_capacity(doc.contexts.len());
        for context_doc in &doc.contexts {
            let id = ItemId(item_ids.allocate());
            arena.insert(Item::Context(Context::from_doc(
                context_doc,
                id,
                &layers,
                languages,
            )));
            contexts.push(id);
        }

        let root = build_group(
            &doc.group,
            None,
            &mut arena,
            &mut item_ids,
            &mut contexts,
            languages,
        );

        // Prune: contexts the tree does not reach, then layers no kept
        // context references.
        let contexts: Vec<ItemId> = contexts
            .into_iter()
            .filter(|id| arena.find_by_id(root, *id).is_some())
            .collect();
        layers.retain(|layer| {
            contexts
                .iter()
                .any(|id| arena.context(*id).is_some_and(|c| c.layers.contains(&layer.id)))
        });

        Ok(Self {
            items: arena,
            root,
            contexts,
            layers,
        })
    }

    pub fn root_group(&self) -> Option<&Group> {
        self.items.group(self.root)
    }

    pub fn context(&self, id: ItemId) -> Option<&Context> {
        self.items.context(id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter().filter_map(|id| self.items.context(*id))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }
}

/// Recursively attach one raw group node. Context references resolve against
/// everything built so far; a reference nothing matches synthesizes a
/// placeholder so the tree always renders.
fn build_group(
    doc: &GroupDoc,
    parent: Option<ItemId>,
    arena: &mut ItemArena,
    ids: &mut IdAlloc,
    contexts: &mut Vec<ItemId>,
    languages: &[Language],
) -> ItemId {
    let id = ItemId(ids.allocate());
    arena.insert(Item::Group(Group::from_doc(doc, id, parent, languages)));

    let mut children = Vec::with_capacity(doc.items.len());
    for item in &doc.items {
        match item {
            GroupItemDoc::Context(doc_id) => {
                let existing = contexts.iter().copied().find(|cid| {
                    arena
                        .context(*cid)
                        .is_some_and(|c| c.original_id.as_ref() == Some(doc_id))
                });
                let child = match existing {
                    Some(context_id) => context_id,
                    None => {
                        let dummy_id = ItemId(ids.allocate());
                        arena.insert(Item::Context(Context::dummy(
                            dummy_id,
                            doc_id.clone(),
                            languages,
                        )));
                        contexts.push(dummy_id);
                        dummy_id
                    }
                };
                arena.set_parent(child, Some(id));
                children.push(child);
            }
            GroupItemDoc::Group(group_doc) => {
                children.push(build_group(group_doc, Some(id), arena, ids, contexts, languages));
            }
        }
    }

    if let Some(group) = arena.group_mut(id) {
        group.items = children;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocId;
    use crate::labels::LocalizedLabel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn langs() -> Vec<Language> {
        vec![Language::new("en", "English"), Language::new("nl", "Nederlands")]
    }

    fn defaults() -> LayerDefaults {
        LayerDefaults {
            server_urls: vec!["https://example.org/geoserver/wms".to_string()],
            image_format: "image/png8".to_string(),
        }
    }

    fn build(doc: serde_json::Value) -> Configuration {
        let doc: LayersDocument = serde_json::from_value(doc).unwrap();
        Configuration::build(&doc, &langs(), &defaults()).unwrap()
    }

    #[test]
    fn one_layer_one_context_one_item() {
        let config = build(json!({
            "layers": [{ "id": 10, "wmsName": "ws:forest" }],
            "contexts": [{
                "id": "forest",
                "labels": [{ "language": "en", "label": "Forest" }],
                "layers": [10]
            }],
            "group": {
                "exclusive": false,
                "items": [{ "context": "forest" }]
            }
        }));

        assert_eq!(config.layers.len(), 1);
        assert_eq!(config.contexts.len(), 1);
        let root = config.root_group().unwrap();
        assert_eq!(root.items.len(), 1);
        let context = config.context(root.items[0]).unwrap();
        assert_eq!(context.layers, vec![LayerId(0)]);
        assert_eq!(context.parent, Some(config.root));
    }

    #[test]
    fn context_and_group_ids_share_one_counter() {
        let config = build(json!({
            "layers": [],
            "contexts": [{ "id": "a" }, { "id": "b" }],
            "group": {
                "items": [
                    { "context": "a" },
                    { "group": { "items": [{ "context": "b" }] } }
                ]
            }
        }));

        // Contexts first (0, 1), then the root (2) and the nested group (3).
        assert_eq!(config.contexts, vec![ItemId(0), ItemId(1)]);
        assert_eq!(config.root, ItemId(2));
        let root = config.root_group().unwrap();
        assert_eq!(root.items, vec![ItemId(0), ItemId(3)]);
        let nested = config.items.group(ItemId(3)).unwrap();
        assert_eq!(nested.items, vec![ItemId(1)]);
        assert_eq!(nested.parent, Some(config.root));
    }

    #[test]
    fn dangling_context_reference_synthesizes_a_dummy() {
        let config = build(json!({
            "layers": [],
            "contexts": [],
            "group": { "items": [{ "context": 99 }] }
        }));

        assert_eq!(config.contexts.len(), 1);
        let context = config.contexts().next().unwrap();
        assert!(context.layers.is_empty());
        assert_eq!(context.original_id, Some(DocId::from(99u32)));
        assert_eq!(context.labels[0], LocalizedLabel::new("en", "99"));
        assert_eq!(context.parent, Some(config.root));
    }

    #[test]
    fn numeric_zero_is_a_valid_context_reference() {
        let config = build(json!({
            "layers": [],
            "contexts": [{ "id": 0, "labels": [{ "language": "en", "label": "Zero" }] }],
            "group": { "items": [{ "context": 0 }] }
        }));

        assert_eq!(config.contexts.len(), 1);
        let context = config.contexts().next().unwrap();
        assert_eq!(context.labels[0], LocalizedLabel::new("en", "Zero"));
    }

    #[test]
    fn dangling_layer_reference_is_dropped_silently() {
        let config = build(json!({
            "layers": [{ "id": 1 }],
            "contexts": [{ "id": "c", "layers": [1, 42] }],
            "group": { "items": [{ "context": "c" }] }
        }));

        let context = config.contexts().next().unwrap();
        assert_eq!(context.layers, vec![LayerId(0)]);
    }

    #[test]
    fn unreachable_contexts_and_layers_are_pruned() {
        let config = build(json!({
            "layers": [{ "id": 1 }, { "id": 2 }],
            "contexts": [
                { "id": "kept", "layers": [1] },
                { "id": "orphan", "layers": [2] }
            ],
            "group": { "items": [{ "context": "kept" }] }
        }));

        assert_eq!(config.contexts.len(), 1);
        assert_eq!(config.contexts().next().unwrap().original_id, Some(DocId::from("kept")));
        assert_eq!(config.layers.len(), 1);
        // The kept layer keeps its original session id.
        assert_eq!(config.layers.ids(), vec![LayerId(0)]);
    }

    #[test]
    fn pruning_keeps_layer_ids_stable() {
        let config = build(json!({
            "layers": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
            "contexts": [
                { "id": "c1", "layers": ["c"] },
                { "id": "unused", "layers": ["a", "b"] }
            ],
            "group": { "items": [{ "context": "c1" }] }
        }));

        // "c" was built third, so it keeps id 2 even though it is now the
        // only layer left.
        assert_eq!(config.layers.ids(), vec![LayerId(2)]);
        let context = config.contexts().next().unwrap();
        assert_eq!(context.layers, vec![LayerId(2)]);
    }

    #[test]
    fn nothing_is_pruned_when_everything_is_reachable() {
        let config = build(json!({
            "layers": [{ "id": 1 }, { "id": 2 }],
            "contexts": [
                { "id": "a", "layers": [1] },
                { "id": "b", "layers": [2, 1] }
            ],
            "group": {
                "items": [
                    { "context": "a" },
                    { "group": { "items": [{ "context": "b" }] } }
                ]
            }
        }));

        assert_eq!(config.contexts.len(), 2);
        assert_eq!(config.layers.len(), 2);
    }

    #[test]
    fn shared_context_is_attached_at_each_occurrence_but_listed_once() {
        let config = build(json!({
            "layers": [],
            "contexts": [{ "id": "shared" }],
            "group": {
                "items": [
                    { "context": "shared" },
                    { "group": { "items": [{ "context": "shared" }] } }
                ]
            }
        }));

        assert_eq!(config.contexts.len(), 1);
        let shared = config.contexts().next().unwrap();
        // Flattened tree order still sees both occurrences.
        assert_eq!(config.items.contexts_under(config.root), vec![shared.id, shared.id]);
        // The last attachment wins the parent back-reference.
        let root = config.root_group().unwrap();
        let nested = root.items[1];
        assert_eq!(shared.parent, Some(nested));
    }

    #[test]
    fn a_repeated_missing_reference_reuses_the_synthesized_dummy() {
        let config = build(json!({
            "layers": [],
            "contexts": [],
            "group": {
                "items": [{ "context": "ghost" }, { "context": "ghost" }]
            }
        }));

        assert_eq!(config.contexts.len(), 1);
        let root = config.root_group().unwrap();
        assert_eq!(root.items[0], root.items[1]);
    }

    #[test]
    fn unsupported_statistics_type_aborts_the_build() {
        let doc: LayersDocument = serde_json::from_value(json!({
            "layers": [{ "id": 1, "statistics": [{ "type": "foo" }] }],
            "contexts": [],
            "group": {}
        }))
        .unwrap();
        let err = Configuration::build(&doc, &langs(), &defaults()).unwrap_err();
        assert_eq!(err, BuildError::UnsupportedStatisticsType { kind: "foo".to_string() });
    }
}
