//! HTTP vector index backend.
//!
//! Speaks the Weaviate-style object REST API: objects are created under
//! a caller-chosen id with a flat property map, and embedding happens
//! server-side on write. The engine never sees a vector.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};
use uuid::Uuid;

use async_trait::async_trait;
use cairn_core::{defaults, Error, Result, VectorIndex};

/// Default vector index endpoint.
pub const DEFAULT_VECTOR_URL: &str = defaults::VECTOR_BASE_URL;

/// Default object class chunks are stored under.
pub const DEFAULT_VECTOR_CLASS: &str = defaults::VECTOR_INDEX;

/// Default property name carrying the embeddable text.
pub const DEFAULT_TEXT_KEY: &str = defaults::VECTOR_TEXT_KEY;

/// HTTP vector index backend.
#[derive(Clone)]
pub struct HttpVectorIndex {
    client: Client,
    base_url: String,
    class: String,
    text_key: String,
}

impl HttpVectorIndex {
    /// Create a new backend with default settings.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_VECTOR_URL.to_string(),
            DEFAULT_VECTOR_CLASS.to_string(),
            DEFAULT_TEXT_KEY.to_string(),
        )
    }

    /// Create a new backend with custom configuration.
    pub fn with_config(base_url: String, class: String, text_key: String) -> Self {
        let timeout = std::env::var("VECTOR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::VECTOR_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            class,
            text_key,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("VECTOR_BASE_URL").unwrap_or_else(|_| DEFAULT_VECTOR_URL.to_string());
        let class =
            std::env::var("VECTOR_INDEX").unwrap_or_else(|_| DEFAULT_VECTOR_CLASS.to_string());
        let text_key =
            std::env::var("VECTOR_TEXT_KEY").unwrap_or_else(|_| DEFAULT_TEXT_KEY.to_string());

        Self::with_config(base_url, class, text_key)
    }

    /// The object class this backend writes to.
    pub fn class(&self) -> &str {
        &self.class
    }

    fn object_url(&self, id: Uuid) -> String {
        format!("{}/v1/objects/{}/{}", self.base_url, self.class, id)
    }

    /// Flatten display metadata and the text into one property map.
    ///
    /// Non-object metadata (including null) contributes nothing. The
    /// text always wins a key collision with metadata.
    fn properties(&self, text: &str, metadata: &JsonValue) -> Map<String, JsonValue> {
        let mut properties = match metadata {
            JsonValue::Object(map) => map.clone(),
            _ => Map::new(),
        };
        properties.insert(self.text_key.clone(), JsonValue::String(text.to_string()));
        properties
    }
}

impl Default for HttpVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(&self, id: Uuid, text: &str, metadata: &JsonValue) -> Result<()> {
        let body = json!({
            "class": self.class,
            "id": id,
            "properties": self.properties(text, metadata),
        });

        let response = self
            .client
            .post(format!("{}/v1/objects", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::VectorIndex(format!("Request failed: {}", e)))?;

        // The create endpoint refuses an already-stored id with 422;
        // replace the object in place instead.
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            debug!(
                subsystem = "vector",
                id = %id,
                "Object already stored, replacing"
            );
            let response = self
                .client
                .put(self.object_url(id))
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::VectorIndex(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::VectorIndex(format!(
                    "Vector index returned {} on replace: {}",
                    status, body
                )));
            }
            return Ok(());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorIndex(format!(
                "Vector index returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.object_url(id))
            .send()
            .await
            .map_err(|e| Error::VectorIndex(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // Absent objects are fine; the goal state is "not stored".
            warn!(
                subsystem = "vector",
                id = %id,
                "Deleted object was not in the index"
            );
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorIndex(format!(
                "Vector index returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let response = self
            .client
            .head(self.object_url(id))
            .send()
            .await
            .map_err(|e| Error::VectorIndex(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(Error::VectorIndex(format!(
                "Vector index returned {}",
                status
            )));
        }
        Ok(true)
    }
}
