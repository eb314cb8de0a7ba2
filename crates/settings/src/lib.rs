//! Static application settings.
//!
//! The settings document is read-only at runtime: it names the configured
//! languages, the map defaults applied to layers that do not carry their own,
//! and the backend API endpoints. It is deployed next to the application and
//! never written back.

use serde::{Deserialize, Serialize};

/// One configured display language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl Language {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Map defaults, applied to layers that omit the corresponding attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bing_maps_key: Option<String>,
    #[serde(default)]
    pub map_center_lon_lat: [f64; 2],
    #[serde(default)]
    pub map_zoom: u32,
    #[serde(default, rename = "defaultGeoServerURLs")]
    pub default_geo_server_urls: Vec<String>,
}

/// Backend endpoints for the layer-configuration API, relative to `base_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoints {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub login_url: String,
    #[serde(default)]
    pub get_layers_config_url: String,
    #[serde(default)]
    pub save_layers_config_url: String,
    // The backend key is misspelled; kept as-is for wire compatibility.
    #[serde(default, rename = "getLayersConfigHisoryUrl")]
    pub get_layers_config_history_url: String,
    #[serde(default)]
    pub restore_version_url: String,
}

impl ApiEndpoints {
    /// Absolute URL for an endpoint path (plain concatenation, as the backend
    /// expects `base_url` to carry its trailing slash).
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Feedback-form settings (consumed by the UI only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSettings {
    #[serde(default)]
    pub feedback_url: String,
    #[serde(default)]
    pub feedback_categories: Vec<String>,
}

/// WFS attribute-search settings (consumed by the UI only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WfsSearchSettings {
    #[serde(default)]
    pub layers_to_query: Vec<String>,
    #[serde(default)]
    pub attributes_to_filter: Vec<String>,
    #[serde(default, rename = "baseURL")]
    pub base_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub layers_config_api: ApiEndpoints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_api: Option<FeedbackSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "wfsSearchConfig")]
    pub wfs_search: Option<WfsSearchSettings>,
}

impl Settings {
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(raw).map_err(|e| SettingsError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Parse(msg) => write!(f, "invalid settings document: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}
