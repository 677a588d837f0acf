//! Issues backend calls and tags their settlements.
//!
//! Every search or classification gets a fresh [`RequestToken`]. The
//! orchestrator remembers the latest token per [`RequestKind`]; a settlement
//! whose token is no longer the latest is stale and must not touch state.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::client::{Backend, BackendError};
use crate::models::{ClassificationResult, SampleText, SearchPage, SearchQuery};
use crate::utils::{validate_category, validate_page, validate_text, with_retry, RetryConfig, ValidationError};

/// Identity of one issued request
///
/// Tokens only come from the orchestrator and strictly increase in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub(super) u64);

/// Which section a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Search,
    Classify,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Search => f.write_str("search"),
            RequestKind::Classify => f.write_str("classify"),
        }
    }
}

/// Result of one logical request, retries included
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Search(Result<SearchPage, BackendError>),
    Classify(Result<ClassificationResult, BackendError>),
}

impl Outcome {
    pub fn kind(&self) -> RequestKind {
        match self {
            Outcome::Search(_) => RequestKind::Search,
            Outcome::Classify(_) => RequestKind::Classify,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Outcome::Search(result) => result.is_ok(),
            Outcome::Classify(result) => result.is_ok(),
        }
    }
}

/// A finished request as posted back to the session queue
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub token: RequestToken,
    pub outcome: Outcome,
}

/// Messages delivered to the session queue
#[derive(Debug)]
pub enum Signal {
    Settled(Settlement),
    /// The auto-classify delay armed under this epoch elapsed
    DebounceElapsed(u64),
}

#[derive(Debug, Default)]
struct TokenMint {
    last: u64,
}

impl TokenMint {
    fn mint(&mut self) -> RequestToken {
        self.last += 1;
        RequestToken(self.last)
    }
}

/// Spawns backend calls and tracks which ones still matter
#[derive(Debug)]
pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    retry: RetryConfig,
    mint: TokenMint,
    latest_search: Option<RequestToken>,
    latest_classify: Option<RequestToken>,
    signals: UnboundedSender<Signal>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>, retry: RetryConfig, signals: UnboundedSender<Signal>) -> Self {
        Self {
            backend,
            retry,
            mint: TokenMint::default(),
            latest_search: None,
            latest_classify: None,
            signals,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Issue a search for `query` at `page`
    ///
    /// Nothing is issued and no token is minted when validation fails.
    pub fn search(&mut self, query: &str, page: u32) -> Result<RequestToken, ValidationError> {
        let query = SearchQuery::parse(query)?;
        let page = validate_page(page)?;

        let token = self.mint.mint();
        self.latest_search = Some(token);
        tracing::debug!(token = token.0, page, "Issuing search for {:?}", query.as_str());

        let backend = Arc::clone(&self.backend);
        let retry = self.retry;
        let signals = self.signals.clone();
        tokio::spawn(async move {
            let result = with_retry(retry, || backend.search(&query, page)).await;
            if let Err(e) = &result {
                tracing::warn!(token = token.0, "Search for {:?} failed: {}", query.as_str(), e);
            }
            let _ = signals.send(Signal::Settled(Settlement {
                token,
                outcome: Outcome::Search(result),
            }));
        });

        Ok(token)
    }

    /// Issue a classification of `text`
    pub fn classify(&mut self, text: &str) -> Result<RequestToken, ValidationError> {
        let text = validate_text(text)?.to_string();

        let token = self.mint.mint();
        self.latest_classify = Some(token);
        tracing::debug!(token = token.0, chars = text.chars().count(), "Issuing classification");

        let backend = Arc::clone(&self.backend);
        let retry = self.retry;
        let signals = self.signals.clone();
        tokio::spawn(async move {
            let result = with_retry(retry, || backend.classify(&text)).await;
            if let Err(e) = &result {
                tracing::warn!(token = token.0, "Classification failed: {}", e);
            }
            let _ = signals.send(Signal::Settled(Settlement {
                token,
                outcome: Outcome::Classify(result),
            }));
        });

        Ok(token)
    }

    /// Fetch sample text for a category
    ///
    /// Samples are awaited directly and carry no token.
    pub async fn sample(&self, category: &str) -> Result<SampleText, BackendError> {
        let category = validate_category(category)?;
        with_retry(self.retry, || self.backend.sample(category))
            .await
            .inspect_err(|e| tracing::error!("Error fetching sample for {}: {}", category, e))
    }

    /// Whether `token` is the most recent request of `kind`
    pub fn is_latest(&self, token: RequestToken, kind: RequestKind) -> bool {
        self.latest(kind) == Some(token)
    }

    /// Latest issued token of `kind`, if not superseded
    pub fn latest(&self, kind: RequestKind) -> Option<RequestToken> {
        match kind {
            RequestKind::Search => self.latest_search,
            RequestKind::Classify => self.latest_classify,
        }
    }

    /// Forget the latest request of `kind`, making any in-flight one stale
    pub fn supersede(&mut self, kind: RequestKind) {
        let slot = match kind {
            RequestKind::Search => &mut self.latest_search,
            RequestKind::Classify => &mut self.latest_classify,
        };
        if let Some(token) = slot.take() {
            tracing::debug!(token = token.0, "Superseded in-flight {}", kind);
        }
    }
}
