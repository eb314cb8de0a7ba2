//! Wire format for the layer-configuration document.
//!
//! The same top-level shape (`{$schema, layers, contexts, group}`) is read on
//! load and written on save, but the two directions are asymmetric: input may
//! carry extra or stale fields that construction ignores, while output keeps
//! only what the in-memory model preserves. Serialization back to this shape
//! lives in [`crate::serialize`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::labels::LocalizedLabel;

/// Schema marker written into every saved document.
pub const SCHEMA_REF: &str = "../../layersJsonSchema_v2.json";

/// An entity identifier as it appears in the document: string or number.
///
/// Numeric `0` is a valid, present id. Numbers and strings never compare
/// equal, so `10` and `"10"` are distinct identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocId::Number(n) => write!(f, "{n}"),
            DocId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId::Number(id.into())
    }
}

impl From<i64> for DocId {
    fn from(id: i64) -> Self {
        DocId::Number(id.into())
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        DocId::Text(id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayersDocument {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub layers: Vec<LayerDoc>,
    #[serde(default)]
    pub contexts: Vec<ContextDoc>,
    #[serde(default)]
    pub group: GroupDoc,
}

impl LayersDocument {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_urls: Option<Vec<String>>,
    // Legacy input alias for the layer name; never written back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wms_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Vec<LocalizedLabel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Vec<StatisticsDoc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_links: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
}

/// A statistics entry as found in the document.
///
/// The `type` tag stays a plain string here: dispatch into the closed
/// [`crate::layer::Statistics`] enum happens at model construction, where an
/// unknown tag becomes the one fatal build error instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsDoc {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<StatisticsAttributeDoc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsAttributeDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocId>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LocalizedLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<DocId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_legend_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LocalizedLabel>,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_disable_all: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<GroupItemDoc>,
}

/// One child entry of a group: `{"context": <id>}` or `{"group": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupItemDoc {
    Context(DocId),
    Group(GroupDoc),
}
