//! Backend transport for the layer-configuration document.
//!
//! Thin request/response plumbing around the four backend operations: fetch
//! the current document, save a serialized one, list saved versions, restore
//! one. Errors are propagated opaquely; interpreting them is the caller's
//! business.

use std::sync::Arc;

use catalog::{BuildError, Configuration, LayerId, LayersDocument};
use serde::Deserialize;
use settings::{ApiEndpoints, Settings};
use tracing::{debug, info};

/// Supplies the auth token the protected endpoints expect.
///
/// Token retrieval and refresh live with the caller; the transport only asks
/// at request time.
pub trait TokenSource: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// A fixed token, for tools and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn current_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// No credentials; protected endpoints will answer with an auth status.
#[derive(Debug, Clone, Default)]
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn current_token(&self) -> Option<String> {
        None
    }
}

/// One saved configuration version, as listed by the history endpoint.
/// Unknown descriptor fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug)]
pub enum TransportError {
    Http(reqwest::Error),
    Status { code: u16 },
    Decode(serde_json::Error),
    Build(BuildError),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Http(err) => write!(f, "request failed: {err}"),
            TransportError::Status { code } => write!(f, "backend answered with status {code}"),
            TransportError::Decode(err) => write!(f, "invalid response document: {err}"),
            TransportError::Build(err) => write!(f, "{err}"),
            TransportError::Serialize(err) => write!(f, "could not serialize configuration: {err}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Http(err) => Some(err),
            TransportError::Decode(err) | TransportError::Serialize(err) => Some(err),
            TransportError::Build(err) => Some(err),
            TransportError::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err)
    }
}

/// Client for the layer-configuration API.
pub struct LayersApi {
    http: reqwest::Client,
    endpoints: ApiEndpoints,
    token: Arc<dyn TokenSource>,
}

impl LayersApi {
    pub fn new(endpoints: ApiEndpoints, token: Arc<dyn TokenSource>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoints, token)
    }

    pub fn with_client(
        http: reqwest::Client,
        endpoints: ApiEndpoints,
        token: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            endpoints,
            token,
        }
    }

    /// Download and parse the current configuration document.
    pub async fn fetch_document(&self) -> Result<LayersDocument, TransportError> {
        let url = self.endpoints.join(&self.endpoints.get_layers_config_url);
        debug!("fetching layer configuration from {url}");
        let response = check_status(self.http.get(&url).send().await?)?;
        let raw = response.text().await?;
        LayersDocument::from_json_str(&raw).map_err(TransportError::Decode)
    }

    /// Fetch and build in one step.
    pub async fn fetch_configuration(
        &self,
        settings: &Settings,
    ) -> Result<Configuration, TransportError> {
        let doc = self.fetch_document().await?;
        Configuration::from_document(&doc, settings).map_err(TransportError::Build)
    }

    /// Persist an already-serialized configuration document.
    pub async fn save_document(&self, body: String) -> Result<(), TransportError> {
        let url = self.endpoints.join(&self.endpoints.save_layers_config_url);
        let request = self
            .authorized(self.http.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        check_status(request.send().await?)?;
        info!("layer configuration saved");
        Ok(())
    }

    /// Serialize and persist a configuration with the given export order.
    pub async fn save_configuration(
        &self,
        config: &Configuration,
        layers_rank: &[LayerId],
    ) -> Result<(), TransportError> {
        let body = catalog::serialize(config, layers_rank).map_err(TransportError::Serialize)?;
        self.save_document(body).await
    }

    /// List the saved configuration versions.
    pub async fn fetch_history(&self) -> Result<Vec<ConfigVersion>, TransportError> {
        let url = self
            .endpoints
            .join(&self.endpoints.get_layers_config_history_url);
        let response = check_status(self.authorized(self.http.get(&url)).send().await?)?;
        let raw = response.text().await?;
        serde_json::from_str(&raw).map_err(TransportError::Decode)
    }

    /// Ask the backend to restore a saved version.
    pub async fn restore_version(&self, version: &str) -> Result<(), TransportError> {
        let url = self.endpoints.join(&self.endpoints.restore_version_url);
        let request = self
            .authorized(self.http.get(&url))
            .query(&[("version", version)]);
        check_status(request.send().await?)?;
        info!("restored configuration version {version}");
        Ok(())
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // The backend expects the raw token, no scheme prefix.
        match self.token.current_token() {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, token),
            None => builder,
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::Status {
            code: status.as_u16(),
        })
    }
}
