//! Observable session state and its reducer.
//!
//! [`SessionState::reduce`] is the only way state changes. It is pure: the
//! same state and event always produce the same next state, and it performs no
//! I/O. Settlements are checked against the section's latest token here as
//! well, so a stale settlement is a no-op even when fed in directly.

use serde::Serialize;

use super::orchestrator::{Outcome, RequestToken};
use crate::client::BackendError;
use crate::models::{ClassificationResult, SearchPage, SearchQuery, SearchResult, TextStats};
use crate::utils::PageInfo;

/// Banner shown when a search fails for any reason
pub const SEARCH_FAILURE_MESSAGE: &str = "Failed to fetch results. Please try again.";

/// Message carried by the classification result when classification fails
pub const CLASSIFY_FAILURE_MESSAGE: &str = "Failed to classify text";

/// Lifecycle of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

/// Events accepted by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The search box text changed
    QueryChanged(String),
    /// The classifier input changed
    TextChanged(String),
    /// A new search for `query` was issued at page 1
    Submit { query: SearchQuery, token: RequestToken },
    /// The submitted query was re-issued at `page`
    PageChange { page: u32, token: RequestToken },
    /// A classification was issued
    ClassifyIssued { token: RequestToken },
    /// A request settled
    ResponseSettled { token: RequestToken, outcome: Outcome },
    /// Return everything to its initial values
    Reset,
    /// Return only the classifier to its initial values
    ClearClassifier,
}

/// Search box, results, and pager position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    query: String,
    submitted: Option<SearchQuery>,
    results: Vec<SearchResult>,
    page: PageInfo,
    requested_page: Option<u32>,
    phase: Phase,
    error: Option<String>,
    last_token: Option<RequestToken>,
}

impl SearchState {
    /// Current search box text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Query the displayed (or loading) results belong to
    pub fn submitted(&self) -> Option<&SearchQuery> {
        self.submitted.as_ref()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Page of the displayed results
    pub fn page(&self) -> PageInfo {
        self.page
    }

    /// Page of the in-flight search, if any
    pub fn requested_page(&self) -> Option<u32> {
        self.requested_page
    }

    /// Position that page navigation moves from
    ///
    /// While a page change is loading this is the requested page, so paging
    /// again builds on the latest click rather than on the page on screen.
    pub fn navigation(&self) -> PageInfo {
        match self.requested_page {
            Some(page) => PageInfo::from_response(page, self.page.total()),
            None => self.page,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn begin(&mut self, query: SearchQuery, page: u32, token: RequestToken) {
        self.submitted = Some(query);
        self.requested_page = Some(page);
        self.phase = Phase::Loading;
        self.error = None;
        self.last_token = Some(token);
    }

    fn settle(&mut self, token: RequestToken, result: Result<SearchPage, BackendError>) {
        if self.last_token != Some(token) {
            return;
        }
        self.requested_page = None;
        match result {
            Ok(page) => {
                self.page = PageInfo::from_response(page.page, page.total_pages);
                self.results = page.results;
                self.phase = Phase::Success;
                self.error = None;
            }
            Err(_) => {
                self.results.clear();
                self.phase = Phase::Failure;
                self.error = Some(SEARCH_FAILURE_MESSAGE.to_string());
            }
        }
    }
}

/// Classifier input and latest result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierState {
    text: String,
    result: Option<ClassificationResult>,
    phase: Phase,
    last_token: Option<RequestToken>,
}

impl ClassifierState {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Character and word counts of the input
    pub fn stats(&self) -> TextStats {
        TextStats::of(&self.text)
    }

    fn settle(&mut self, token: RequestToken, result: Result<ClassificationResult, BackendError>) {
        if self.last_token != Some(token) {
            return;
        }
        match result {
            Ok(result) => {
                self.result = Some(result);
                self.phase = Phase::Success;
            }
            Err(_) => {
                self.result = Some(ClassificationResult::failed(CLASSIFY_FAILURE_MESSAGE));
                self.phase = Phase::Failure;
            }
        }
    }
}

/// Everything the presentational layer reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    search: SearchState,
    classifier: ClassifierState,
}

impl SessionState {
    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn classifier(&self) -> &ClassifierState {
        &self.classifier
    }

    /// Whether a settlement carrying `token` would be applied
    pub fn accepts(&self, token: RequestToken) -> bool {
        self.search.last_token == Some(token) || self.classifier.last_token == Some(token)
    }

    /// Apply one event
    pub fn reduce(mut self, event: Event) -> Self {
        match event {
            Event::QueryChanged(query) => self.search.query = query,
            Event::TextChanged(text) => self.classifier.text = text,
            Event::Submit { query, token } => self.search.begin(query, 1, token),
            Event::PageChange { page, token } => {
                if let Some(query) = self.search.submitted.clone() {
                    self.search.begin(query, page, token);
                }
            }
            Event::ClassifyIssued { token } => {
                self.classifier.result = None;
                self.classifier.phase = Phase::Loading;
                self.classifier.last_token = Some(token);
            }
            Event::ResponseSettled { token, outcome } => match outcome {
                Outcome::Search(result) => self.search.settle(token, result),
                Outcome::Classify(result) => self.classifier.settle(token, result),
            },
            Event::Reset => return Self::default(),
            Event::ClearClassifier => self.classifier = ClassifierState::default(),
        }
        self
    }
}
