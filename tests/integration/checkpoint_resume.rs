//! End-to-end checkpointed consumption across simulated process restarts.

use std::sync::{Arc, Mutex};

use chrono::DateTime;
use futures_util::{stream, StreamExt};
use tempfile::TempDir;

use aegis_cli::checkpoint::{
    CheckpointValue, CheckpointedStream, CursorStore, PersistMode, ResourceKind, SearchError,
};
use aegis_cli::client::EventStream;
use aegis_cli::query::FileEventQuery;
use aegis_cli::{AlertEvent, AlertState, FileEvent, Severity};

fn alert(id: &str, seconds: i64) -> AlertEvent {
    AlertEvent {
        id: id.to_string(),
        created_at: DateTime::from_timestamp(seconds, 0).unwrap(),
        name: "integration".to_string(),
        severity: Severity::Moderate,
        state: AlertState::Open,
        actor: Some("jo@example.com".to_string()),
        rule_id: None,
    }
}

fn alert_run(
    store: &CursorStore,
    name: &str,
    events: Vec<AlertEvent>,
) -> CheckpointedStream<AlertEvent> {
    let inner: EventStream<AlertEvent> = Box::pin(stream::iter(events.into_iter().map(Ok)));
    CheckpointedStream::new(
        inner,
        store.clone(),
        name,
        Box::new(|e: &AlertEvent| Ok(e.id.clone())),
        |e| e.created_at,
        PersistMode::HighWaterMark,
    )
}

async fn collect_ids(
    mut s: CheckpointedStream<AlertEvent>,
) -> Result<Vec<String>, SearchError> {
    let mut ids = Vec::new();
    while let Some(item) = s.next().await {
        ids.push(item?.id);
    }
    Ok(ids)
}

/// Three consecutive polls over a growing upstream: every event is
/// delivered exactly once even though the lower-bound filter re-returns
/// the boundary timestamp each time.
#[tokio::test]
async fn test_repeated_polls_deliver_each_event_once() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);

    let mut upstream = vec![alert("a1", 100), alert("a2", 200), alert("a3", 200)];

    // Poll 1 sees everything.
    let first = collect_ids(alert_run(&store, "poll", upstream.clone()))
        .await
        .unwrap();
    assert_eq!(first, vec!["a1", "a2", "a3"]);

    // Two more events arrive, one at the boundary timestamp.
    upstream.push(alert("a4", 200));
    upstream.push(alert("a5", 300));

    // Poll 2 queries from the stored high-water mark.
    let from = CheckpointValue::parse_timestamp(&store.get("poll").unwrap().unwrap()).unwrap();
    let window: Vec<AlertEvent> = upstream
        .iter()
        .filter(|e| e.created_at >= from)
        .cloned()
        .collect();
    let second = collect_ids(alert_run(&store, "poll", window)).await.unwrap();
    assert_eq!(second, vec!["a4", "a5"]);

    // Poll 3 with nothing new delivers nothing.
    let from = CheckpointValue::parse_timestamp(&store.get("poll").unwrap().unwrap()).unwrap();
    let window: Vec<AlertEvent> = upstream
        .iter()
        .filter(|e| e.created_at >= from)
        .cloned()
        .collect();
    let third = collect_ids(alert_run(&store, "poll", window)).await.unwrap();
    assert!(third.is_empty());
}

/// Checkpoints are scoped per credential and per resource kind: the same
/// name under a different scope is untouched.
#[tokio::test]
async fn test_checkpoints_are_scoped_by_credential_and_resource() {
    let dir = TempDir::new().unwrap();
    let store_a = CursorStore::new(dir.path(), "client-a", ResourceKind::Alert);
    let store_b = CursorStore::new(dir.path(), "client-b", ResourceKind::Alert);

    collect_ids(alert_run(&store_a, "shared-name", vec![alert("a1", 100)]))
        .await
        .unwrap();

    assert!(store_a.get("shared-name").unwrap().is_some());
    assert!(store_b.get("shared-name").unwrap().is_none());
}

/// A file event search resumed from a query-state checkpoint continues
/// from the persisted page token, not from the fresh query's filters.
#[tokio::test]
async fn test_file_event_resume_restores_the_stored_query() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::FileEvent);

    let event = FileEvent {
        event_id: "fe-1".to_string(),
        timestamp: DateTime::from_timestamp(100, 0).unwrap(),
        event_action: "file-shared".to_string(),
        file_name: Some("plan.docx".to_string()),
        file_path: None,
        sha256: None,
        user: Some("jo@example.com".to_string()),
    };

    // Run 1: the shared query advances its token mid-consumption, and
    // the snapshot persisted with the event carries that token.
    let mut original = FileEventQuery::new();
    original.user = Some("jo@example.com".to_string());
    let shared = Arc::new(Mutex::new(original.clone()));
    shared.lock().unwrap().page_token = Some("tok-17".to_string());

    let inner: EventStream<FileEvent> = Box::pin(stream::iter(vec![Ok(event.clone())]));
    let snapshot_source = shared.clone();
    let mut run = CheckpointedStream::new(
        inner,
        store.clone(),
        "export",
        Box::new(|e: &FileEvent| Ok(e.event_id.clone())),
        |e| e.timestamp,
        PersistMode::QueryState(Box::new(move || {
            serde_json::to_string(&*snapshot_source.lock().unwrap())
        })),
    );
    assert_eq!(run.next().await.unwrap().unwrap().event_id, "fe-1");
    drop(run);

    // Run 2: the stored query supersedes a fresh one wholesale.
    let mut fresh = FileEventQuery::new();
    fresh.user = Some("someone-else@example.com".to_string());
    let (resumed, was_stored) = FileEventQuery::resume_or_new(&store, "export", fresh).unwrap();
    assert!(was_stored);
    assert_eq!(resumed.page_token.as_deref(), Some("tok-17"));
    assert_eq!(resumed.user.as_deref(), Some("jo@example.com"));

    // And the seen-set still guards the boundary event.
    assert_eq!(store.get_items("export").unwrap(), vec!["fe-1"]);
}
