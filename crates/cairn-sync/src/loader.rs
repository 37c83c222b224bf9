//! Document loader dispatch and the remote fetcher client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use cairn_core::{defaults, DocumentChunk, DocumentLoader, Error, Resource, ResourceKind, Result};

/// Default fetcher service endpoint.
pub const DEFAULT_LOADER_URL: &str = defaults::LOADER_BASE_URL;

/// Maps each resource kind to the loader that fetches it.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<ResourceKind, Arc<dyn DocumentLoader>>,
}

impl LoaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader for a kind, replacing any previous one.
    pub fn register(mut self, kind: ResourceKind, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loaders.insert(kind, loader);
        self
    }

    /// Register one loader for every kind.
    pub fn register_all(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        for kind in ResourceKind::ALL {
            self.loaders.insert(kind, loader.clone());
        }
        self
    }

    /// Look up the loader for a kind.
    pub fn get(&self, kind: ResourceKind) -> Result<Arc<dyn DocumentLoader>> {
        self.loaders
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::Loader(format!("No loader registered for kind: {}", kind)))
    }

    /// Registry backed by one [`HttpLoader`] for all kinds.
    pub fn http(base_url: String) -> Self {
        Self::new().register_all(Arc::new(HttpLoader::with_config(base_url)))
    }

    /// Registry built from environment variables.
    pub fn from_env() -> Self {
        Self::new().register_all(Arc::new(HttpLoader::from_env()))
    }
}

/// One chunk as returned by the fetcher service.
///
/// The content hash is computed locally, never trusted from the wire.
#[derive(Debug, Deserialize)]
struct LoadedChunk {
    path: String,
    content: String,
    #[serde(default)]
    metadata: JsonValue,
}

/// Client for the remote fetcher service.
///
/// The fetcher crawls, clones, or transcribes the source behind a
/// resource and returns pre-chunked documents. One endpoint per kind:
/// `POST {base}/v1/load/{kind}` with the resource parameters as body.
#[derive(Clone)]
pub struct HttpLoader {
    client: Client,
    base_url: String,
}

impl HttpLoader {
    /// Create a new loader client with default settings.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_LOADER_URL.to_string())
    }

    /// Create a new loader client with a custom base URL.
    pub fn with_config(base_url: String) -> Self {
        let timeout = std::env::var("LOADER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::LOADER_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("LOADER_BASE_URL").unwrap_or_else(|_| DEFAULT_LOADER_URL.to_string());
        Self::with_config(base_url)
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load(&self, resource: &Resource) -> Result<Vec<DocumentChunk>> {
        let url = format!("{}/v1/load/{}", self.base_url, resource.kind);

        let response = self
            .client
            .post(&url)
            .json(&resource.spec)
            .send()
            .await
            .map_err(|e| Error::Loader(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Loader(format!(
                "Fetcher returned {}: {}",
                status, body
            )));
        }

        let loaded: Vec<LoadedChunk> = response
            .json()
            .await
            .map_err(|e| Error::Loader(format!("Failed to parse response: {}", e)))?;

        debug!(
            subsystem = "sync",
            component = "http_loader",
            resource_id = %resource.id,
            kind = %resource.kind,
            chunk_count = loaded.len(),
            "Fetched resource content"
        );

        Ok(loaded
            .into_iter()
            .map(|c| DocumentChunk::new(c.path, c.content).with_metadata(c.metadata))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopLoader;

    #[async_trait]
    impl DocumentLoader for NoopLoader {
        async fn load(&self, _resource: &Resource) -> Result<Vec<DocumentChunk>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = LoaderRegistry::new().register(ResourceKind::Website, Arc::new(NoopLoader));

        assert!(registry.get(ResourceKind::Website).is_ok());
        let err = registry.get(ResourceKind::Video).err().expect("unregistered");
        assert!(err.to_string().contains("video"));
    }

    #[test]
    fn test_register_all_covers_every_kind() {
        let registry = LoaderRegistry::new().register_all(Arc::new(NoopLoader));
        for kind in ResourceKind::ALL {
            assert!(registry.get(kind).is_ok());
        }
    }
}
