//! Inverse projection: the in-memory tree back to the minimal document.
//!
//! Three explicit typed projections (layer, context, group) enumerate exactly
//! which fields survive persistence; session-local ids and derived state
//! never leave the process except as tree back-references. The tree itself is
//! never mutated here.

use crate::build::Configuration;
use crate::document::{
    ContextDoc, DocId, GroupDoc, GroupItemDoc, LayerDoc, LayersDocument, SCHEMA_REF,
    StatisticsAttributeDoc, StatisticsDoc,
};
use crate::ids::{ItemId, LayerId};
use crate::labels::LocalizedLabel;
use crate::layer::{Layer, LayerKind, Statistics, value_is_empty};
use crate::tree::{Context, Group, Item, ItemArena};

/// Serialize the reachable tree to the persisted JSON document.
///
/// `layers_rank` is the desired export order for layers (the UI's current
/// display order); layers absent from the rank are dropped defensively.
pub fn serialize(config: &Configuration, layers_rank: &[LayerId]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&to_document(config, layers_rank))
}

/// The projection behind [`serialize`], kept separate so callers can inspect
/// or pretty-print the document.
pub fn to_document(config: &Configuration, layers_rank: &[LayerId]) -> LayersDocument {
    // Gather from the tree, not from the kept lists: entities detached since
    // construction must not be persisted.
    let contexts_in_tree = config.items.contexts_under(config.root);
    let layers_in_tree = config.items.layers_under(config.root);

    let mut layers = Vec::with_capacity(layers_rank.len());
    for id in layers_rank {
        if !layers_in_tree.contains(id) {
            continue;
        }
        if let Some(layer) = config.layers.get(*id) {
            layers.push(project_layer(layer));
        }
    }

    let contexts = contexts_in_tree
        .iter()
        .filter_map(|id| config.items.context(*id))
        .map(project_context)
        .collect();

    LayersDocument {
        schema: Some(SCHEMA_REF.to_string()),
        layers,
        contexts,
        group: project_root(config),
    }
}

fn project_layer(layer: &Layer) -> LayerDoc {
    let mut doc = LayerDoc {
        id: Some(DocId::from(layer.id.0)),
        kind: Some(layer.kind.tag().to_string()),
        visible: Some(layer.visible),
        source_link: layer.source_link.clone().filter(|s| !s.is_empty()),
        source_label: layer.source_label.clone().filter(|s| !s.is_empty()),
        ..LayerDoc::default()
    };

    if let LayerKind::Wms(wms) = &layer.kind {
        doc.server_urls = (!wms.server_urls.is_empty()).then(|| wms.server_urls.clone());
        doc.name = wms.name.clone();
        doc.image_format = Some(wms.image_format.clone());
        doc.legend = wms.legend.clone().filter(|v| !value_is_empty(v));
        // Styles a document never localized carry no label in any language;
        // they are not worth persisting.
        let styles: Vec<LocalizedLabel> = wms
            .styles
            .iter()
            .filter(|s| !s.label.is_empty())
            .cloned()
            .collect();
        doc.styles = (!styles.is_empty()).then_some(styles);
        let times: Vec<String> = wms.times.iter().map(|t| t.iso8601.clone()).collect();
        doc.times = (!times.is_empty()).then_some(times);
        doc.statistics = wms
            .statistics
            .as_ref()
            .map(|list| list.iter().map(project_statistics).collect());
        doc.download_links = wms.download_links.clone();
    }

    doc
}

fn project_statistics(statistics: &Statistics) -> StatisticsDoc {
    match statistics {
        Statistics::Url { labels, url } => StatisticsDoc {
            kind: "url".to_string(),
            labels: labels.clone(),
            url: url.clone(),
            attributes: None,
        },
        Statistics::Attributes { labels, attributes } => StatisticsDoc {
            kind: "attributes".to_string(),
            labels: labels.clone(),
            url: None,
            attributes: attributes.as_ref().map(|attrs| {
                attrs
                    .iter()
                    .map(|a| StatisticsAttributeDoc {
                        attribute: a.attribute.clone(),
                        labels: Some(a.labels.clone()),
                    })
                    .collect()
            }),
        },
    }
}

fn project_context(context: &Context) -> ContextDoc {
    ContextDoc {
        id: Some(DocId::from(context.id.0)),
        active: context.active,
        labels: context.labels.clone(),
        layers: (!context.layers.is_empty())
            .then(|| context.layers.iter().map(|l| DocId::from(l.0)).collect()),
        info_file: context.info_file.clone().filter(|s| !s.is_empty()),
        inline_legend_url: context.inline_legend_url.clone().filter(|s| !s.is_empty()),
    }
}

fn project_group(arena: &ItemArena, group: &Group) -> GroupDoc {
    GroupDoc {
        info_file: group.info_file.clone().filter(|s| !s.is_empty()),
        labels: group.labels.clone(),
        exclusive: group.exclusive,
        allow_disable_all: group.allow_disable_all,
        items: project_items(arena, &group.items),
    }
}

fn project_items(arena: &ItemArena, items: &[ItemId]) -> Vec<GroupItemDoc> {
    items
        .iter()
        .filter_map(|id| match arena.get(*id)? {
            Item::Group(group) => Some(GroupItemDoc::Group(project_group(arena, group))),
            Item::Context(context) => Some(GroupItemDoc::Context(DocId::from(context.id.0))),
        })
        .collect()
}

/// The root keeps only `exclusive` and `items`; label-like attributes are
/// meaningless on it.
fn project_root(config: &Configuration) -> GroupDoc {
    let Some(root) = config.root_group() else {
        return GroupDoc::default();
    };
    GroupDoc {
        exclusive: root.exclusive,
        items: project_items(&config.items, &root.items),
        ..GroupDoc::default()
    }
}
