//! Integration tests for Scholar Lens
//!
//! These tests drive a full [`Session`] against the scripted mock backend and
//! against the HTTP backend talking to a mock server.

use mockito::Matcher;
use scholar_lens::client::mock::{make_result, MockBackend};
use scholar_lens::client::{BackendError, HttpBackend};
use scholar_lens::models::{ClassificationResult, SearchPage};
use scholar_lens::session::{
    Phase, RequestKind, Session, SessionSettings, Update, CLASSIFY_FAILURE_MESSAGE,
    SEARCH_FAILURE_MESSAGE,
};
use scholar_lens::utils::{PageToken, RetryConfig, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_test::{assert_err, assert_ok};

fn settings() -> SessionSettings {
    SessionSettings {
        retry: RetryConfig::no_retry(),
        ..Default::default()
    }
}

fn mock_session() -> (Arc<MockBackend>, Session) {
    let backend = Arc::new(MockBackend::new());
    let session = Session::new(backend.clone(), settings());
    (backend, session)
}

fn business() -> ClassificationResult {
    ClassificationResult::new(
        "business",
        [
            ("business".to_string(), 0.85),
            ("health".to_string(), 0.05),
            ("politics".to_string(), 0.10),
        ]
        .into_iter()
        .collect(),
    )
}

#[tokio::test]
async fn test_climate_policy_end_to_end_over_http() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", Matcher::Regex(r"^/search/".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "climate policy".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"results": [{"title": "Climate Policy Review", "link": "https://example.com/review", "authors": [], "year": 2021, "snippet": "Carbon pricing and climate policy.", "score": 0.91}], "page": 1, "total_pages": 3}"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", Matcher::Regex(r"^/search/".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "climate policy".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"results": [{"title": "Policy Instruments", "link": "https://example.com/2", "authors": []}], "page": 2, "total_pages": 3}"#,
        )
        .create_async()
        .await;

    let backend = Arc::new(assert_ok!(HttpBackend::new(&server.url())));
    let mut session = Session::new(backend, settings());

    session.set_query("climate policy");
    assert_ok!(session.submit());
    assert!(session.state().search().loading());

    assert_eq!(session.next_update().await, Some(Update::Search));
    let search = session.state().search();
    assert_eq!(search.phase(), Phase::Success);
    assert!(!search.loading());
    assert_eq!(search.results().len(), 1);
    assert_eq!(search.results()[0].title, "Climate Policy Review");
    assert_eq!(search.page().current(), 1);
    assert_eq!(search.page().total(), 3);

    let pager = session.pager();
    assert_eq!(
        pager.window,
        vec![PageToken::Page(1), PageToken::Page(2), PageToken::Page(3)]
    );
    assert!(!pager.previous_enabled);
    assert!(pager.next_enabled);

    assert!(session.next_page());
    assert_eq!(session.next_update().await, Some(Update::Search));
    assert_eq!(session.state().search().page().current(), 2);
    assert_eq!(session.state().search().results()[0].title, "Policy Instruments");

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_older_page_settling_late_is_discarded() {
    let (backend, mut session) = mock_session();
    backend.set_search_response(SearchPage::new(vec![make_result("Page one")], 1, 3));
    backend.respond_to_page(2, SearchPage::new(vec![make_result("Page two")], 2, 3));

    session.set_query("q");
    assert_ok!(session.submit());
    assert_eq!(session.next_update().await, Some(Update::Search));

    // R1 for page 1 is held, R2 for page 2 settles first
    let gate = backend.hold_search(1);
    assert_ok!(session.submit());
    assert!(session.next_page());

    assert_eq!(session.next_update().await, Some(Update::Search));
    assert_eq!(session.state().search().page().current(), 2);

    gate.release();
    assert_eq!(
        session.next_update().await,
        Some(Update::Stale(RequestKind::Search))
    );
    assert_eq!(session.state().search().page().current(), 2);
    assert_eq!(session.state().search().results()[0].title, "Page two");
    assert!(!session.state().search().loading());
}

#[tokio::test]
async fn test_blank_query_never_reaches_backend() {
    let (backend, mut session) = mock_session();
    let before = session.state().clone();

    for query in ["", "   ", "\t\n"] {
        session.set_query(query);
        assert_eq!(session.submit(), Err(ValidationError::EmptyQuery));
    }

    tokio::task::yield_now().await;
    assert!(session.drain_pending().is_empty());
    assert!(backend.search_calls().is_empty());
    assert_eq!(session.state().search().phase(), before.search().phase());
    assert!(session.state().search().results().is_empty());
}

#[tokio::test]
async fn test_search_failure_shows_banner() {
    let (backend, mut session) = mock_session();
    backend.fail_search(BackendError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    });

    session.set_query("q");
    assert_ok!(session.submit());
    assert_eq!(session.next_update().await, Some(Update::Search));

    let search = session.state().search();
    assert_eq!(search.phase(), Phase::Failure);
    assert!(!search.loading());
    assert_eq!(search.error(), Some(SEARCH_FAILURE_MESSAGE));
    assert!(search.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auto_classify_after_pause() {
    let (backend, mut session) = mock_session();
    backend.set_classification(business());
    let start = Instant::now();

    session.set_text("Stocks");
    sleep(Duration::from_millis(300)).await;
    session.set_text("Stocks fell sharply");
    assert!(session.is_busy());

    assert_eq!(session.next_update().await, Some(Update::AutoClassify));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1100));
    assert!(elapsed < Duration::from_millis(1110));
    assert!(session.state().classifier().loading());

    assert_eq!(session.next_update().await, Some(Update::Classify));
    assert_eq!(session.state().classifier().phase(), Phase::Success);
    assert_eq!(session.state().classifier().result(), Some(&business()));
    assert_eq!(backend.classify_calls(), vec!["Stocks fell sharply".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_classify_now_cancels_pending_auto_classify() {
    let (backend, mut session) = mock_session();
    backend.set_classification(business());

    session.set_text("Parliament passed the bill");
    assert_ok!(session.classify_now());
    assert_eq!(session.next_update().await, Some(Update::Classify));

    sleep(Duration::from_secs(2)).await;
    assert!(session.drain_pending().is_empty());
    assert_eq!(backend.classify_calls().len(), 1);
    assert!(!session.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_blank_text_cancels_pending_auto_classify() {
    let (backend, mut session) = mock_session();

    session.set_text("some text");
    session.set_text("   ");
    assert_err!(session.classify_now());

    sleep(Duration::from_secs(2)).await;
    assert!(session.drain_pending().is_empty());
    assert!(backend.classify_calls().is_empty());
    assert_eq!(session.state().classifier().phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_sample_text_triggers_auto_classify() {
    let (backend, mut session) = mock_session();
    backend.set_sample("health", "A new vaccine trial shows promise.");

    assert_ok!(session.load_sample("health").await);
    assert_eq!(
        session.state().classifier().text(),
        "A new vaccine trial shows promise."
    );
    assert_eq!(session.state().classifier().stats().words, 6);

    assert_eq!(session.next_update().await, Some(Update::AutoClassify));
    assert_eq!(session.next_update().await, Some(Update::Classify));
    assert_eq!(
        backend.classify_calls(),
        vec!["A new vaccine trial shows promise.".to_string()]
    );
}

#[tokio::test]
async fn test_older_classification_settling_late_is_discarded() {
    let (backend, mut session) = mock_session();
    let health = ClassificationResult::new(
        "health",
        [("business".to_string(), 0.2), ("health".to_string(), 0.8)]
            .into_iter()
            .collect(),
    );
    backend.respond_to_text("Hospital wait times grow", health.clone());
    backend.respond_to_text("Stocks fell sharply", business());

    // A is held, the retyped B settles first
    let gate = backend.hold_classify();
    session.set_text("Hospital wait times grow");
    assert_ok!(session.classify_now());
    session.set_text("Stocks fell sharply");
    assert_ok!(session.classify_now());

    assert_eq!(session.next_update().await, Some(Update::Classify));
    assert_eq!(session.state().classifier().result(), Some(&business()));

    gate.release();
    assert_eq!(
        session.next_update().await,
        Some(Update::Stale(RequestKind::Classify))
    );
    assert_eq!(session.state().classifier().phase(), Phase::Success);
    assert_eq!(session.state().classifier().result(), Some(&business()));
    assert_eq!(
        backend.classify_calls(),
        vec![
            "Hospital wait times grow".to_string(),
            "Stocks fell sharply".to_string()
        ]
    );
}

#[tokio::test]
async fn test_malformed_success_bodies_fail_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _search = server
        .mock("GET", Matcher::Regex(r"^/search/".to_string()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"unexpected": true}"#)
        .create_async()
        .await;
    let _classify = server
        .mock("POST", "/classify/")
        .with_status(200)
        .with_body(r#"{"label": "business"}"#)
        .create_async()
        .await;

    let backend = Arc::new(assert_ok!(HttpBackend::new(&server.url())));
    let mut session = Session::new(backend, settings());

    session.set_query("climate policy");
    assert_ok!(session.submit());
    assert_eq!(session.next_update().await, Some(Update::Search));
    assert_eq!(session.state().search().phase(), Phase::Failure);
    assert_eq!(session.state().search().error(), Some(SEARCH_FAILURE_MESSAGE));

    session.set_text("Stocks fell sharply");
    assert_ok!(session.classify_now());
    assert_eq!(session.next_update().await, Some(Update::Classify));
    let classifier = session.state().classifier();
    assert_eq!(classifier.phase(), Phase::Failure);
    assert_eq!(
        classifier.result().and_then(|r| r.error_message.as_deref()),
        Some(CLASSIFY_FAILURE_MESSAGE)
    );
}

#[tokio::test]
async fn test_reset_discards_in_flight_requests() {
    let (backend, mut session) = mock_session();
    let search_gate = backend.hold_search(1);
    let classify_gate = backend.hold_classify();

    session.set_query("q");
    assert_ok!(session.submit());
    session.set_text("text");
    assert_ok!(session.classify_now());

    session.reset();
    assert_eq!(session.state(), &Default::default());

    search_gate.release();
    classify_gate.release();
    let mut updates = vec![
        session.next_update().await.unwrap(),
        session.next_update().await.unwrap(),
    ];
    updates.sort_by_key(|u| format!("{:?}", u));
    assert_eq!(
        updates,
        vec![
            Update::Stale(RequestKind::Classify),
            Update::Stale(RequestKind::Search)
        ]
    );
    assert_eq!(session.state(), &Default::default());
}

#[tokio::test]
async fn test_classification_error_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/classify/")
        .with_status(200)
        .with_body(r#"{"error": "Text is required"}"#)
        .create_async()
        .await;

    let backend = Arc::new(assert_ok!(HttpBackend::new(&server.url())));
    let mut session = Session::new(backend, settings());

    session.set_text("Something to classify");
    assert_ok!(session.classify_now());
    assert_eq!(session.next_update().await, Some(Update::Classify));

    let classifier = session.state().classifier();
    assert_eq!(classifier.phase(), Phase::Failure);
    let result = classifier.result().unwrap();
    assert_eq!(result.error_message.as_deref(), Some(CLASSIFY_FAILURE_MESSAGE));
    assert!(result.probabilities.is_empty());
}

#[tokio::test]
async fn test_search_and_classify_are_independent() {
    let (backend, mut session) = mock_session();
    backend.set_classification(business());
    let gate = backend.hold_search(1);

    session.set_query("q");
    assert_ok!(session.submit());
    session.set_text("text");
    assert_ok!(session.classify_now());

    // classification settles while the search is still held
    assert_eq!(session.next_update().await, Some(Update::Classify));
    assert!(session.state().search().loading());

    gate.release();
    assert_eq!(session.next_update().await, Some(Update::Search));
    assert_eq!(session.state().search().phase(), Phase::Success);
    assert_eq!(session.state().classifier().phase(), Phase::Success);
}
