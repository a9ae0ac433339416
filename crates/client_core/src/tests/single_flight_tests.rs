use super::*;
use std::time::Duration;

#[test]
fn second_enter_for_same_key_is_refused_until_release() {
    let flights = SingleFlight::new();

    let first = flights.try_enter(OperationKey::Query);
    let second = flights.try_enter(OperationKey::Query);
    assert!(first.is_some());
    assert!(second.is_none());
    assert!(flights.is_busy(&OperationKey::Query));

    drop(first);
    assert!(!flights.is_busy(&OperationKey::Query));
    assert!(flights.try_enter(OperationKey::Query).is_some());
}

#[test]
fn distinct_keys_are_independent() {
    let flights = SingleFlight::new();
    let users = OperationKey::GenerateData(TableName::new("users"));
    let orders = OperationKey::GenerateData(TableName::new("orders"));

    let _users = flights.try_enter(users.clone()).expect("users");
    let _orders = flights.try_enter(orders.clone()).expect("orders");
    let _remove = flights
        .try_enter(OperationKey::RemoveTable(TableName::new("users")))
        .expect("remove is a different kind");

    let mut busy = flights.busy_keys();
    busy.sort_by_key(|key| key.to_string());
    assert_eq!(busy.len(), 3);
    assert_eq!(busy[0], orders);
    assert_eq!(busy[1], users);
}

#[test]
fn key_display_includes_subject() {
    assert_eq!(OperationKey::Upload.to_string(), "upload");
    assert_eq!(
        OperationKey::RemoveTable(TableName::new("users")).to_string(),
        "remove_table:users"
    );
}

#[tokio::test]
async fn concurrent_enters_admit_exactly_one() {
    let flights = SingleFlight::new();
    let a = flights.clone();
    let b = flights.clone();

    let (first, second) = tokio::join!(
        async move { a.try_enter(OperationKey::Upload) },
        async move { b.try_enter(OperationKey::Upload) },
    );
    assert_eq!(
        usize::from(first.is_some()) + usize::from(second.is_some()),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn run_releases_on_completion_and_skips_when_busy() {
    let flights = SingleFlight::new();
    let inner = flights.clone();

    let slow = tokio::spawn(async move {
        inner
            .run(OperationKey::Query, async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "done"
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let skipped = flights.run(OperationKey::Query, async { "second" }).await;
    assert_eq!(skipped, None);

    assert_eq!(slow.await.expect("join"), Some("done"));
    assert!(!flights.is_busy(&OperationKey::Query));
}

#[tokio::test]
async fn guard_releases_when_operation_fails() {
    let flights = SingleFlight::new();

    let outcome: Option<Result<(), &str>> = flights
        .run(OperationKey::Upload, async { Err("boom") })
        .await;
    assert_eq!(outcome, Some(Err("boom")));
    assert!(!flights.is_busy(&OperationKey::Upload));
}

#[tokio::test(start_paused = true)]
async fn burst_of_runs_per_table_admits_one_each() {
    let flights = SingleFlight::new();
    let runs = ["users", "users", "orders", "users", "orders"].map(|table| {
        let flights = flights.clone();
        async move {
            flights
                .run(OperationKey::GenerateData(TableName::new(table)), async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    table
                })
                .await
        }
    });

    let mut finished: Vec<_> = futures::future::join_all(runs)
        .await
        .into_iter()
        .flatten()
        .collect();
    finished.sort_unstable();
    assert_eq!(finished, vec!["orders", "users"]);
    assert!(flights.busy_keys().is_empty());
}
