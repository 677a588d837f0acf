//! Network boundary to the remote search index and classifier.
//!
//! The [`Backend`] trait is the seam between the interaction engine and the
//! remote services. [`HttpBackend`] talks to the real HTTP API; [`MockBackend`]
//! returns scripted responses and can hold calls open so tests decide the order
//! in which requests settle.
//!
//! # Endpoints
//!
//! - `GET {base}/search/?query={q}&page={n}` → `{results, page, total_pages}`
//! - `POST {base}/classify/` with `{text}` → `{prediction, probabilities}` or `{error}`
//! - `GET {base}/sample/{category}/` → `{sample}`

mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::{Gate, MockBackend};

use crate::models::{ClassificationResult, SampleText, SearchPage, SearchQuery};
use crate::utils::ValidationError;
use async_trait::async_trait;

/// Remote services consumed by the session
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Fetch one page of search results
    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchPage, BackendError>;

    /// Classify a piece of text
    async fn classify(&self, text: &str) -> Result<ClassificationResult, BackendError>;

    /// Fetch sample text for a category
    async fn sample(&self, category: &str) -> Result<SampleText, BackendError>;
}

/// Errors that can occur when talking to the backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not settle within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Successful status but the body reports an error
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// Input refused before sending
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl BackendError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::Timeout => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return BackendError::Timeout;
        }
        if let Some(status) = err.status() {
            return BackendError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            return BackendError::Parse(err.to_string());
        }
        BackendError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Parse(format!("JSON: {}", err))
    }
}
