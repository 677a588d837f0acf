//! Core data models for publications, search pages, and classifications.

mod classification;
mod publication;
mod search;

pub use classification::{ClassificationResult, ClassifyRequest, SampleText, TextStats};
pub use publication::{Author, SearchResult, SearchResultBuilder};
pub use search::{SearchPage, SearchQuery};
