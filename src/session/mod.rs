//! Interactive search and classification session.
//!
//! A [`Session`] owns the [`SessionState`] and is its only writer. User actions
//! are applied immediately; request settlements and debounce expiries arrive
//! on a single queue and are applied one at a time through
//! [`Session::next_update`] or [`Session::drain_pending`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scholar_lens::client::HttpBackend;
//! use scholar_lens::session::{Session, SessionSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::new("http://localhost:8000")?);
//! let mut session = Session::new(backend, SessionSettings::default());
//!
//! session.set_query("climate policy");
//! session.submit()?;
//! session.next_update().await;
//!
//! for result in session.state().search().results() {
//!     println!("{}", result.title);
//! }
//! # Ok(())
//! # }
//! ```

mod debounce;
mod orchestrator;
mod state;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use orchestrator::{Orchestrator, Outcome, RequestKind, RequestToken, Settlement, Signal};
pub use state::{
    ClassifierState, Event, Phase, SearchState, SessionState, CLASSIFY_FAILURE_MESSAGE,
    SEARCH_FAILURE_MESSAGE,
};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::client::{Backend, BackendError};
use crate::config::Config;
use crate::models::SearchQuery;
use crate::utils::{validate_text, Pager, RetryConfig, ValidationError, DEFAULT_PAGE_RADIUS};

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Quiet period before auto-classification
    pub debounce: Duration,
    /// Pages shown on each side of the current page
    pub page_radius: u32,
    /// Retry policy for backend calls
    pub retry: RetryConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_radius: DEFAULT_PAGE_RADIUS,
            retry: RetryConfig::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.classifier.debounce(),
            page_radius: config.search.page_radius,
            retry: config.retry_config(),
        }
    }
}

/// What changed after a queued signal was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// A search settled and the search section changed
    Search,
    /// A classification settled and the classifier section changed
    Classify,
    /// The debounce expired and a classification was issued
    AutoClassify,
    /// A superseded settlement was dropped
    Stale(RequestKind),
    /// A debounce expiry that was cancelled after it fired
    Ignored,
}

impl Update {
    /// Whether state changed and a re-render is due
    pub fn is_visible(&self) -> bool {
        matches!(self, Update::Search | Update::Classify | Update::AutoClassify)
    }
}

/// Drives one interactive session
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    orchestrator: Orchestrator,
    debouncer: Debouncer,
    debounce_epoch: u64,
    settings: SessionSettings,
    sender: UnboundedSender<Signal>,
    signals: UnboundedReceiver<Signal>,
}

impl Session {
    /// Create a session; requires a running tokio runtime once actions are taken
    pub fn new(backend: Arc<dyn Backend>, settings: SessionSettings) -> Self {
        let (sender, signals) = mpsc::unbounded_channel();
        Self {
            state: SessionState::default(),
            orchestrator: Orchestrator::new(backend, settings.retry, sender.clone()),
            debouncer: Debouncer::new(),
            debounce_epoch: 0,
            settings,
            sender,
            signals,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Pager for the displayed results
    pub fn pager(&self) -> Pager {
        Pager::new(self.state.search().page(), self.settings.page_radius)
    }

    /// Whether a request is in flight or an auto-classification is armed
    pub fn is_busy(&self) -> bool {
        self.state.search().loading() || self.state.classifier().loading() || self.debouncer.is_pending()
    }

    fn apply(&mut self, event: Event) {
        self.state = std::mem::take(&mut self.state).reduce(event);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.apply(Event::QueryChanged(query.into()));
    }

    /// Search for the current query from page 1
    ///
    /// A blank query is rejected and leaves state untouched.
    pub fn submit(&mut self) -> Result<(), ValidationError> {
        let query = SearchQuery::parse(self.state.search().query())?;
        let token = self.orchestrator.search(query.as_str(), 1)?;
        self.apply(Event::Submit { query, token });
        Ok(())
    }

    /// Re-issue the submitted query at `target`
    ///
    /// Returns false when `target` is out of range, is the page already shown
    /// or loading, or no query has been submitted yet.
    pub fn go_to_page(&mut self, target: u32) -> bool {
        if !self.state.search().navigation().can_go_to(target) {
            tracing::debug!("Ignoring navigation to page {}", target);
            return false;
        }
        let Some(query) = self.state.search().submitted() else {
            return false;
        };

        match self.orchestrator.search(query.as_str(), target) {
            Ok(token) => {
                self.apply(Event::PageChange { page: target, token });
                true
            }
            Err(e) => {
                tracing::debug!("Page change rejected: {}", e);
                false
            }
        }
    }

    pub fn next_page(&mut self) -> bool {
        match self.state.search().navigation().next() {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.state.search().navigation().previous() {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    /// Replace the classifier input and (re)arm auto-classification
    ///
    /// Blank input cancels any pending auto-classification instead.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        let classifiable = validate_text(&text).is_ok();
        self.apply(Event::TextChanged(text));

        if classifiable {
            self.debounce_epoch += 1;
            let epoch = self.debounce_epoch;
            let sender = self.sender.clone();
            self.debouncer.arm(
                move || {
                    let _ = sender.send(Signal::DebounceElapsed(epoch));
                },
                self.settings.debounce,
            );
        } else {
            self.cancel_debounce();
        }
    }

    /// Classify the current input without waiting for the debounce
    pub fn classify_now(&mut self) -> Result<(), ValidationError> {
        self.cancel_debounce();
        self.issue_classification()
    }

    /// Fetch sample text for `category` into the classifier input
    ///
    /// On failure the error is logged and state is left untouched.
    pub async fn load_sample(&mut self, category: &str) -> Result<(), BackendError> {
        let sample = self.orchestrator.sample(category).await?;
        self.set_text(sample.sample);
        Ok(())
    }

    /// Clear the classifier input and result
    pub fn clear_classifier(&mut self) {
        self.cancel_debounce();
        self.orchestrator.supersede(RequestKind::Classify);
        self.apply(Event::ClearClassifier);
    }

    /// Return the whole session to its initial state
    pub fn reset(&mut self) {
        self.cancel_debounce();
        self.orchestrator.supersede(RequestKind::Search);
        self.orchestrator.supersede(RequestKind::Classify);
        self.apply(Event::Reset);
    }

    /// Wait for the next queued signal and apply it
    ///
    /// Cancel safe: a signal is only taken off the queue once it is applied.
    pub async fn next_update(&mut self) -> Option<Update> {
        let signal = self.signals.recv().await?;
        Some(self.handle(signal))
    }

    /// Apply every signal already queued, without waiting
    pub fn drain_pending(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(signal) = self.signals.try_recv() {
            updates.push(self.handle(signal));
        }
        updates
    }

    fn handle(&mut self, signal: Signal) -> Update {
        match signal {
            Signal::Settled(Settlement { token, outcome }) => {
                let kind = outcome.kind();
                if !self.orchestrator.is_latest(token, kind) || !self.state.accepts(token) {
                    tracing::debug!(?token, "Discarding stale {} response", kind);
                    return Update::Stale(kind);
                }
                tracing::debug!(?token, ok = outcome.is_ok(), "Applying {} response", kind);
                self.apply(Event::ResponseSettled { token, outcome });
                match kind {
                    RequestKind::Search => Update::Search,
                    RequestKind::Classify => Update::Classify,
                }
            }
            Signal::DebounceElapsed(epoch) if epoch == self.debounce_epoch => {
                self.debounce_epoch += 1;
                match self.issue_classification() {
                    Ok(()) => Update::AutoClassify,
                    Err(_) => Update::Ignored,
                }
            }
            Signal::DebounceElapsed(_) => Update::Ignored,
        }
    }

    fn issue_classification(&mut self) -> Result<(), ValidationError> {
        let token = self.orchestrator.classify(self.state.classifier().text())?;
        self.apply(Event::ClassifyIssued { token });
        Ok(())
    }

    fn cancel_debounce(&mut self) {
        self.debouncer.cancel();
        self.debounce_epoch += 1;
    }
}
