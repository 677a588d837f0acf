//! Mock backend for testing purposes.
//!
//! Responses are scripted per endpoint. [`MockBackend::hold_search`] and
//! [`MockBackend::hold_classify`] return a [`Gate`]: the matching call stays
//! in flight until the gate is released (or dropped), which lets tests settle
//! requests out of order.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

use crate::client::{Backend, BackendError};
use crate::models::{ClassificationResult, SampleText, SearchPage, SearchQuery, SearchResult};

/// Keeps one held call in flight until released
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Let the held call settle
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Debug, Default)]
struct MockState {
    search_default: Option<Result<SearchPage, BackendError>>,
    search_by_page: HashMap<u32, Result<SearchPage, BackendError>>,
    classification: Option<Result<ClassificationResult, BackendError>>,
    classify_by_text: HashMap<String, Result<ClassificationResult, BackendError>>,
    samples: HashMap<String, String>,

    search_gates: HashMap<u32, VecDeque<oneshot::Receiver<()>>>,
    classify_gates: VecDeque<oneshot::Receiver<()>>,

    search_calls: Vec<(String, u32)>,
    classify_calls: Vec<String>,
    sample_calls: Vec<String>,
}

/// A mock backend that returns predefined responses.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Respond to every search with this page unless a page-specific response exists.
    pub fn set_search_response(&self, page: SearchPage) {
        self.state().search_default = Some(Ok(page));
    }

    /// Respond to searches for `page` with this response.
    pub fn respond_to_page(&self, page: u32, response: SearchPage) {
        self.state().search_by_page.insert(page, Ok(response));
    }

    /// Fail every search.
    pub fn fail_search(&self, error: BackendError) {
        let mut state = self.state();
        state.search_default = Some(Err(error));
        state.search_by_page.clear();
    }

    /// Respond to every classification with this result.
    pub fn set_classification(&self, result: ClassificationResult) {
        self.state().classification = Some(Ok(result));
    }

    /// Respond to classifications of exactly `text` with this result.
    pub fn respond_to_text(&self, text: &str, result: ClassificationResult) {
        self.state()
            .classify_by_text
            .insert(text.to_string(), Ok(result));
    }

    /// Fail every classification.
    pub fn fail_classify(&self, error: BackendError) {
        self.state().classification = Some(Err(error));
    }

    /// Register sample text for a category.
    pub fn set_sample(&self, category: &str, sample: &str) {
        self.state()
            .samples
            .insert(category.to_string(), sample.to_string());
    }

    /// Hold the next search call for `page` until the gate is released.
    pub fn hold_search(&self, page: u32) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.state().search_gates.entry(page).or_default().push_back(rx);
        Gate(tx)
    }

    /// Hold the next classify call until the gate is released.
    pub fn hold_classify(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.state().classify_gates.push_back(rx);
        Gate(tx)
    }

    /// Searches received so far, as `(query, page)`.
    pub fn search_calls(&self) -> Vec<(String, u32)> {
        self.state().search_calls.clone()
    }

    /// Texts received by the classifier so far.
    pub fn classify_calls(&self) -> Vec<String> {
        self.state().classify_calls.clone()
    }

    /// Sample categories requested so far.
    pub fn sample_calls(&self) -> Vec<String> {
        self.state().sample_calls.clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchPage, BackendError> {
        let (gate, response) = {
            let mut state = self.state();
            state.search_calls.push((query.to_string(), page));
            let gate = state
                .search_gates
                .get_mut(&page)
                .and_then(VecDeque::pop_front);
            let response = state
                .search_by_page
                .get(&page)
                .or(state.search_default.as_ref())
                .cloned()
                .unwrap_or_else(|| Ok(SearchPage::new(Vec::new(), page, 1)));
            (gate, response)
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, BackendError> {
        let (gate, response) = {
            let mut state = self.state();
            state.classify_calls.push(text.to_string());
            let gate = state.classify_gates.pop_front();
            let response = state
                .classify_by_text
                .get(text)
                .or(state.classification.as_ref())
                .cloned()
                .unwrap_or_else(|| Ok(ClassificationResult::default()));
            (gate, response)
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }

    async fn sample(&self, category: &str) -> Result<SampleText, BackendError> {
        let mut state = self.state();
        state.sample_calls.push(category.to_string());
        state
            .samples
            .get(category)
            .map(|sample| SampleText {
                sample: sample.clone(),
            })
            .ok_or_else(|| BackendError::Status {
                status: 404,
                message: format!("No sample for category {}", category),
            })
    }
}

/// Helper function to create a search result for testing.
pub fn make_result(title: &str) -> SearchResult {
    SearchResult::new(
        title.to_string(),
        format!(
            "http://example.com/{}",
            title.to_lowercase().replace(' ', "-")
        ),
    )
}
