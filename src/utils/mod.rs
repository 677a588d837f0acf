//! Utility modules supporting the session and the backend.
//!
//! - [`highlight`]: split text into spans matching a query's terms
//! - [`compute_page_window`]: compact page sequence for a pager, with [`PageInfo`] and [`Pager`]
//! - [`HttpClient`]: shared reqwest client with timeouts
//! - [`RetryConfig`] and [`with_retry`]: per-attempt timeout plus exponential backoff
//! - [`validate_query`], [`validate_text`] and friends: input checks run before any request
//!
//! # Highlighting
//!
//! ```rust
//! use scholar_lens::utils::highlight;
//!
//! let marked: Vec<&str> = highlight("Deep learning for climate policy", "climate LEARNING")
//!     .filter(|span| span.matched)
//!     .map(|span| span.text)
//!     .collect();
//! assert_eq!(marked, vec!["learning", "climate"]);
//! ```
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use scholar_lens::client::{Backend, HttpBackend};
//! use scholar_lens::models::SearchQuery;
//! use scholar_lens::utils::{with_retry, RetryConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HttpBackend::new("http://localhost:8000")?;
//! let query = SearchQuery::parse("climate policy")?;
//! let page = with_retry(RetryConfig::default().max_attempts(3), || backend.search(&query, 1)).await?;
//! # Ok(())
//! # }
//! ```

mod highlight;
mod http;
mod pagination;
mod retry;
mod validate;

pub use highlight::{highlight, Highlighter, Highlights, Span, Spans};
pub use http::{HttpClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
pub use pagination::{compute_page_window, PageError, PageInfo, PageToken, Pager, DEFAULT_PAGE_RADIUS};
pub use retry::{with_retry, RetryConfig};
pub use validate::{
    validate_base_url, validate_category, validate_page, validate_query, validate_text,
    ValidationError,
};
