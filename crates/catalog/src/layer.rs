use serde_json::Value;
use settings::{Language, Settings};

use crate::build::BuildError;
use crate::document::{DocId, LayerDoc, StatisticsAttributeDoc, StatisticsDoc};
use crate::ids::LayerId;
use crate::labels::{LocalizedLabel, localize};

pub const DEFAULT_IMAGE_FORMAT: &str = "image/png8";

/// Defaults applied to layers that omit the corresponding attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerDefaults {
    pub server_urls: Vec<String>,
    pub image_format: String,
}

impl LayerDefaults {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server_urls: settings.map.default_geo_server_urls.clone(),
            image_format: DEFAULT_IMAGE_FORMAT.to_string(),
        }
    }
}

/// One map layer and its rendering/metadata attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    /// Identity as given in the source document; only used to resolve
    /// references during construction, never persisted.
    pub original_id: Option<DocId>,
    pub kind: LayerKind,
    pub visible: bool,
    pub source_link: Option<String>,
    pub source_label: Option<String>,
}

/// Layer type dispatch. Only WMS layers carry rendering attributes; any
/// other tag is accepted and keeps the common attributes only.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Wms(WmsAttrs),
    Other(String),
}

impl LayerKind {
    pub fn tag(&self) -> &str {
        match self {
            LayerKind::Wms(_) => "wms",
            LayerKind::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WmsAttrs {
    pub server_urls: Vec<String>,
    pub name: Option<String>,
    /// Always fully populated across the configured languages; entries a
    /// document never localized carry an empty label.
    pub styles: Vec<LocalizedLabel>,
    pub image_format: String,
    pub legend: Option<Value>,
    pub times: Vec<LayerTime>,
    pub statistics: Option<Vec<Statistics>>,
    pub download_links: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerTime {
    pub iso8601: String,
    // Mirrors the raw string until real formatting lands.
    pub human_readable: String,
}

/// Per-layer statistics source.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistics {
    Url {
        labels: Option<Value>,
        url: Option<String>,
    },
    Attributes {
        labels: Option<Value>,
        attributes: Option<Vec<StatisticsAttribute>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsAttribute {
    pub attribute: Option<String>,
    pub labels: Value,
}

impl Statistics {
    /// Dispatch on the document's `type` tag. Anything but `url` or
    /// `attributes` aborts the whole configuration build.
    pub fn from_doc(doc: &StatisticsDoc) -> Result<Self, BuildError> {
        match doc.kind.as_str() {
            "url" => Ok(Statistics::Url {
                labels: doc.labels.clone(),
                url: doc.url.clone(),
            }),
            "attributes" => Ok(Statistics::Attributes {
                labels: doc.labels.clone(),
                attributes: doc
                    .attributes
                    .as_ref()
                    .map(|attrs| attrs.iter().map(StatisticsAttribute::from_doc).collect()),
            }),
            other => Err(BuildError::UnsupportedStatisticsType {
                kind: other.to_string(),
            }),
        }
    }
}

impl StatisticsAttribute {
    fn from_doc(doc: &StatisticsAttributeDoc) -> Self {
        // An attribute without labels is labelled by its own name.
        let labels = match &doc.labels {
            Some(value) if !value.is_null() => value.clone(),
            _ => doc
                .attribute
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        };
        Self {
            attribute: doc.attribute.clone(),
            labels,
        }
    }
}

impl Layer {
    pub fn from_doc(
        doc: &LayerDoc,
        id: LayerId,
        defaults: &LayerDefaults,
        languages: &[Language],
    ) -> Result<Self, BuildError> {
        let kind = match doc.kind.as_deref() {
            Some(tag) if !tag.is_empty() && tag != "wms" => LayerKind::Other(tag.to_string()),
            _ => LayerKind::Wms(WmsAttrs::from_doc(doc, defaults, languages)?),
        };

        Ok(Self {
            id,
            original_id: doc.id.clone(),
            kind,
            // Visible unless the document explicitly says false.
            visible: doc.visible.unwrap_or(true),
            source_link: doc.source_link.clone().filter(|s| !s.is_empty()),
            source_label: doc.source_label.clone().filter(|s| !s.is_empty()),
        })
    }

    /// True when the layer can contribute to a legend: an explicit legend
    /// image, or at least one localized style label.
    pub fn has_legend(&self) -> bool {
        match &self.kind {
            LayerKind::Wms(wms) => {
                wms.legend.is_some() || wms.styles.iter().any(|s| !s.label.is_empty())
            }
            LayerKind::Other(_) => false,
        }
    }
}

impl WmsAttrs {
    fn from_doc(
        doc: &LayerDoc,
        defaults: &LayerDefaults,
        languages: &[Language],
    ) -> Result<Self, BuildError> {
        let server_urls = match &doc.server_urls {
            Some(urls) if !urls.is_empty() => urls.clone(),
            _ => defaults.server_urls.clone(),
        };
        let name = doc
            .wms_name
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| doc.name.clone().filter(|s| !s.is_empty()));
        let image_format = doc
            .image_format
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.image_format.clone());
        let styles = localize(doc.styles.as_deref().unwrap_or(&[]), "", languages);
        let times = doc
            .times
            .iter()
            .flatten()
            .map(|iso| LayerTime {
                iso8601: iso.clone(),
                human_readable: iso.clone(),
            })
            .collect();
        let statistics = doc
            .statistics
            .as_ref()
            .map(|list| list.iter().map(Statistics::from_doc).collect())
            .transpose()?;

        Ok(Self {
            server_urls,
            name,
            styles,
            image_format,
            legend: doc.legend.clone().filter(|v| !value_is_empty(v)),
            times,
            statistics,
            download_links: doc.download_links.clone(),
        })
    }
}

/// "Empty" in the persisted sense: absent, null, or an empty string.
pub(crate) fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// The layers kept by a configuration, in document order, addressable by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSet {
    layers: Vec<Layer>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Layer) -> bool) {
        self.layers.retain(keep);
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn find_by_original(&self, id: &DocId) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| l.original_id.as_ref() == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Kept-layer ids in document order; the default export ranking.
    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
