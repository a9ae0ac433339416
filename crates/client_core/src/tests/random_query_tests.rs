use super::*;
use std::time::Duration;

use shared::protocol::NO_TABLES_SENTINEL;

use crate::{
    test_support::{BackendCall, Harness, ScriptedBackend, ViewEvent},
    view::AffordanceState,
};

fn answering(query: &str, error: Option<&str>) -> ScriptedBackend {
    ScriptedBackend {
        random: RandomQuery {
            query: query.to_string(),
            error: error.map(str::to_string),
        },
        ..ScriptedBackend::default()
    }
}

#[tokio::test]
async fn suggestion_fills_and_focuses_the_input() {
    let harness = Harness::new(ScriptedBackend::default());

    let outcome = harness.core.random_query.generate().await;
    assert!(matches!(outcome, RandomQueryOutcome::Populated(_)));
    assert_eq!(harness.view.current_query(), "How many users signed up last week?");

    let events = harness.view.events();
    let filled = events
        .iter()
        .position(|e| matches!(e, ViewEvent::QueryText(_)))
        .expect("filled");
    let focused = events
        .iter()
        .position(|e| *e == ViewEvent::Focused)
        .expect("focused");
    assert!(filled < focused);
    assert_eq!(
        harness.view.affordance(&Affordance::RandomQueryButton),
        Some(AffordanceState::Ready)
    );
}

#[tokio::test]
async fn empty_database_sentinel_is_not_an_error() {
    let harness = Harness::new(answering("", Some(NO_TABLES_SENTINEL)));

    let outcome = harness.core.random_query.generate().await;
    assert!(matches!(outcome, RandomQueryOutcome::Populated(ref r) if r.is_no_tables_sentinel()));
    assert!(harness.view.errors().is_empty());
}

#[tokio::test]
async fn other_reported_errors_are_shown() {
    let harness = Harness::new(answering(
        "Show all rows",
        Some("Failed to generate query with LLM"),
    ));

    harness.core.random_query.generate().await;
    assert_eq!(harness.view.current_query(), "Show all rows");
    assert_eq!(
        harness.view.errors(),
        vec!["Failed to generate query with LLM".to_string()]
    );
}

#[tokio::test]
async fn transport_failure_is_shown() {
    let harness = Harness::new(ScriptedBackend {
        random_error: Some("connection refused".to_string()),
        ..ScriptedBackend::default()
    });

    let outcome = harness.core.random_query.generate().await;
    assert_eq!(
        outcome,
        RandomQueryOutcome::Failed("connection refused".to_string())
    );
    assert_eq!(harness.view.errors(), vec!["connection refused".to_string()]);
    assert!(!harness.core.flights().is_busy(&OperationKey::RandomQuery));
}

#[tokio::test(start_paused = true)]
async fn repeated_clicks_while_running_are_dropped() {
    let harness = Harness::new(ScriptedBackend {
        latency: Duration::from_millis(300),
        ..ScriptedBackend::default()
    });
    let random = harness.core.random_query.clone();
    let first = tokio::spawn(async move { random.generate().await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        harness.core.random_query.generate().await,
        RandomQueryOutcome::Dropped
    );
    assert!(matches!(
        first.await.expect("join"),
        RandomQueryOutcome::Populated(_)
    ));
    assert_eq!(harness.backend.count(|c| *c == BackendCall::RandomQuery), 1);
}

#[tokio::test]
async fn follow_up_populates_without_surfacing_errors() {
    let harness = Harness::new(answering("Top 5 users", Some("LLM quota exceeded")));

    harness
        .core
        .random_query
        .continue_best_effort()
        .await
        .expect("follow-up");
    assert_eq!(harness.view.current_query(), "Top 5 users");
    assert!(harness.view.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn follow_up_yields_to_a_running_click() {
    let harness = Harness::new(ScriptedBackend {
        latency: Duration::from_millis(300),
        ..ScriptedBackend::default()
    });
    let random = harness.core.random_query.clone();
    let click = tokio::spawn(async move { random.generate().await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    harness
        .core
        .random_query
        .continue_best_effort()
        .await
        .expect("follow-up");
    click.await.expect("join");

    assert_eq!(harness.backend.count(|c| *c == BackendCall::RandomQuery), 1);
}
