//! Music search: result records, the provider seam and the glue that
//! stores results per chat and resolves button presses.

pub mod deezer;

pub use deezer::DeezerSearch;

use crate::session::{CallbackToken, Generation, NotFound, SessionResultStore};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// A single search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    /// Track title
    pub title: String,
    /// Artist shown under the title
    pub artist: String,
    /// Short audio preview, when the provider has one
    pub preview_url: Option<String>,
    /// Canonical page of the track
    pub link: String,
}

/// Errors produced by search providers.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query is blank.
    #[error("Search query is empty")]
    EmptyQuery,
    /// Error during network communication.
    #[error("Network error: {0}")]
    Network(String),
    /// The provider answered with an error.
    #[error("API error: {0}")]
    Api(String),
    /// The response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(String),
}

/// Source of search results
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns results for `query` in display order
    async fn search(&self, query: &str) -> Result<Vec<ResultItem>, SearchError>;
}

/// Result store keyed by Telegram chat id
pub type SearchResultStore = SessionResultStore<i64, ResultItem>;

/// Outcome of a search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results were stored under `generation`
    Results {
        /// Generation to embed in the buttons
        generation: Generation,
        /// Stored results, in button order
        items: Vec<ResultItem>,
    },
    /// The provider returned nothing; the previous results stay active
    NoResults,
}

/// Outcome of a button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The token resolved to an item
    Item(ResultItem),
    /// The token did not resolve
    Invalid(NotFound),
}

/// Connects a [`SearchProvider`] to a [`SearchResultStore`]
#[derive(Clone)]
pub struct SearchSession {
    provider: Arc<dyn SearchProvider>,
    store: Arc<SearchResultStore>,
}

impl SearchSession {
    /// Creates the glue over a provider and a store
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>, store: Arc<SearchResultStore>) -> Self {
        Self { provider, store }
    }

    /// Runs a search for the chat and stores non-empty results
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyQuery`] for blank input without calling
    /// the provider, or the provider's error.
    pub async fn search(&self, chat_id: i64, query: &str) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let items = self.provider.search(query).await?;
        if items.is_empty() {
            debug!(chat_id, "Search returned no results");
            return Ok(SearchOutcome::NoResults);
        }

        let generation = self.store.put(chat_id, items.clone());
        info!(chat_id, %generation, count = items.len(), "Search results stored");
        Ok(SearchOutcome::Results { generation, items })
    }

    /// Resolves a pressed button against the chat's results
    #[must_use]
    pub fn select(&self, chat_id: i64, token: CallbackToken) -> Selection {
        match self.store.resolve_token(&chat_id, token) {
            Ok(item) => Selection::Item(item),
            Err(reason) => {
                debug!(chat_id, %reason, "Selection did not resolve");
                Selection::Invalid(reason)
            }
        }
    }
}
