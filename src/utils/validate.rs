//! Input validation for queries, classifier text, page numbers, and endpoints.
//!
//! Everything here runs before a request is issued. A validation failure means
//! no network call is made and no loading state is entered.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Text to classify is empty")]
    EmptyText,

    #[error("Invalid page number: {0}")]
    InvalidPage(u32),

    #[error("Invalid sample category: {0}")]
    InvalidCategory(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Trim a search query, rejecting empty or whitespace-only input
pub fn validate_query(raw: &str) -> Result<&str, ValidationError> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(query)
}

/// Reject empty or whitespace-only classifier input
///
/// The text itself is sent untrimmed; only its emptiness is checked.
pub fn validate_text(raw: &str) -> Result<&str, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(raw)
}

/// Page numbers are one-based
pub fn validate_page(page: u32) -> Result<u32, ValidationError> {
    if page == 0 {
        return Err(ValidationError::InvalidPage(page));
    }
    Ok(page)
}

/// Sample categories become a single path segment
pub fn validate_category(raw: &str) -> Result<&str, ValidationError> {
    let category = raw.trim();
    if category.is_empty() || category.contains('/') || category.contains("..") {
        return Err(ValidationError::InvalidCategory(raw.to_string()));
    }
    Ok(category)
}

/// Validate the API base URL
///
/// Only HTTP(S) URLs with a host are accepted. The trailing slash is dropped so
/// endpoint paths can be appended directly.
pub fn validate_base_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("empty URL".to_string()));
    }

    let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::InvalidUrl(format!(
                "invalid scheme: {}",
                other
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl("missing host".to_string()));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ValidationError::InvalidUrl(
            "base URL must not carry a query or fragment".to_string(),
        ));
    }

    Ok(url.trim_end_matches('/').to_string())
}
