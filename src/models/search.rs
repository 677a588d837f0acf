//! Search request and response models.

use serde::{Deserialize, Serialize};

use super::SearchResult;
use crate::utils::{validate_query, ValidationError};

/// A validated search query
///
/// Always trimmed and never empty; the only way to build one is through
/// [`SearchQuery::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Trim and validate raw user input
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_query(raw).map(|q| Self(q.to_string()))
    }

    /// The trimmed query text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One page of search results as returned by the index
///
/// `results` and `total_pages` must be present. A missing `page` echo is read
/// as page 1; the session clamps it into range either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Results on this page
    pub results: Vec<SearchResult>,

    /// Page number echoed by the server
    #[serde(default = "default_page")]
    pub page: u32,

    /// Total number of pages for the query
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

impl SearchPage {
    /// Create a page of results
    pub fn new(results: Vec<SearchResult>, page: u32, total_pages: u32) -> Self {
        Self {
            results,
            page,
            total_pages,
        }
    }

    /// An empty single-page response
    pub fn empty() -> Self {
        Self::new(Vec::new(), 1, 1)
    }

    /// Whether this page carries no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
