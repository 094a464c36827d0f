//! Deezer-compatible music search over HTTP
//!
//! `GET {endpoint}?q=<query>&limit=<n>` answering
//! `{"data":[{"title","artist":{"name"},"preview","link"}]}`.

use super::{ResultItem, SearchError, SearchProvider};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Track>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Track {
    title: String,
    artist: Artist,
    #[serde(default)]
    preview: Option<String>,
    link: String,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

impl From<Track> for ResultItem {
    fn from(track: Track) -> Self {
        Self {
            title: track.title,
            artist: track.artist.name,
            // The API sends "" for tracks without a preview
            preview_url: track.preview.filter(|url| !url.is_empty()),
            link: track.link,
        }
    }
}

/// Parses a search response body into result items
///
/// # Errors
///
/// Returns [`SearchError::Json`] for undecodable bodies and
/// [`SearchError::Api`] when the body carries an error object.
pub fn parse_search_response(body: &str, limit: usize) -> Result<Vec<ResultItem>, SearchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Json(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(SearchError::Api(format!("{}: {}", error.kind, error.message)));
    }

    Ok(response
        .data
        .into_iter()
        .take(limit)
        .map(ResultItem::from)
        .collect())
}

/// HTTP search provider for Deezer-style endpoints
pub struct DeezerSearch {
    client: HttpClient,
    endpoint: String,
    limit: usize,
}

impl DeezerSearch {
    /// Creates a provider for `endpoint` returning at most `limit` results
    #[must_use]
    pub fn new(endpoint: impl Into<String>, limit: usize, timeout: Duration) -> Self {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            client,
            endpoint: endpoint.into(),
            limit,
        }
    }
}

#[async_trait]
impl SearchProvider for DeezerSearch {
    async fn search(&self, query: &str) -> Result<Vec<ResultItem>, SearchError> {
        debug!(query, "Searching tracks");
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, "Search endpoint returned an error status");
            return Err(SearchError::Api(format!("HTTP {status}")));
        }

        parse_search_response(&body, self.limit)
    }
}
