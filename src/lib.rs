//! # Scholar Lens
//!
//! Client-side interaction engine for a publication search index and a text
//! classifier, plus a terminal front end.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Wire and domain types (SearchResult, SearchPage, ClassificationResult, etc.)
//! - [`client`]: The [`Backend`] trait with HTTP and mock implementations
//! - [`session`]: Session state machine, request orchestration, and debounce
//! - [`utils`]: Highlighting, pagination, retry, validation, and HTTP helpers
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering of session state

pub mod client;
pub mod config;
pub mod models;
pub mod session;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use client::{Backend, BackendError, HttpBackend};
pub use session::{Session, SessionSettings, SessionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
