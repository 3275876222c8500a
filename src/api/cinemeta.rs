//! IMDB ID -> title name lookup
//!
//! Ktuvit's search can't be addressed by IMDB ID, so a name is needed first.
//! The default lookup uses Stremio's public Cinemeta addon (no API key).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{KtuvitError, Result};

/// Maps an IMDB ID to a display name
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// `Ok(None)` when the service knows nothing usable about the ID
    async fn name_for(&self, imdb_id: &str) -> Result<Option<String>>;
}

/// Cinemeta addon client
pub struct CinemetaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    name: Option<String>,
}

impl CinemetaClient {
    pub fn new() -> Self {
        Self::with_base_url("https://v3-cinemeta.strem.io")
    }

    /// Create with custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn fetch_name(&self, kind: &str, imdb_id: &str) -> Result<Option<String>> {
        let url = format!("{}/meta/{}/{}.json", self.base_url, kind, imdb_id);
        debug!(%url, "cinemeta lookup");

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(KtuvitError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let parsed: MetaResponse = serde_json::from_str(&body)?;
        Ok(parsed
            .meta
            .and_then(|m| m.name)
            .filter(|n| !n.trim().is_empty()))
    }
}

impl Default for CinemetaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameLookup for CinemetaClient {
    async fn name_for(&self, imdb_id: &str) -> Result<Option<String>> {
        // Movie first, then series
        if let Some(name) = self.fetch_name("movie", imdb_id).await? {
            return Ok(Some(name));
        }
        self.fetch_name("series", imdb_id).await
    }
}
