//! HTTP transport tests against a live node server on a local port

use pulse::client::{fetch_all_counts, track_visit, HttpTransport, ReadinessPoller, Transport};
use pulse::config::ProcessConfig;
use pulse::models::Month;
use pulse::process::{Message, ProcessId, ProcessNode};
use pulse::storage::{SqliteStorage, Storage};
use std::sync::Arc;

/// Start a node on an ephemeral port and return its base URL
async fn start_node() -> String {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    let node = Arc::new(ProcessNode::new(
        Arc::new(storage),
        &ProcessConfig::default(),
    ));
    let app = pulse::api::create_api_router(node);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_spawn_track_and_fetch_over_http() {
    let base_url = start_node().await;
    let transport = Arc::new(HttpTransport::new(&base_url, Some("owner-1".to_string())));

    let mut poller = ReadinessPoller::new(transport.clone(), 20);
    let outcome = poller.spawn_and_initialize("http-site").await.unwrap();
    assert!(outcome.is_ready());

    track_visit(transport.as_ref(), &outcome.process_id, Month::August, "/")
        .await
        .unwrap();
    track_visit(transport.as_ref(), &outcome.process_id, Month::August, "/faq")
        .await
        .unwrap();

    let reply = transport
        .dry_run(&outcome.process_id, Message::get_all_counts())
        .await
        .unwrap();
    assert_eq!(reply.messages[0].target, "owner-1");

    let counts = fetch_all_counts(transport.as_ref(), &outcome.process_id)
        .await
        .unwrap();
    assert_eq!(counts.all_time_count, 2);
    assert_eq!(counts.monthly_counts["August"], 2);
    assert_eq!(counts.page_counts["/faq"], 1);

    let processes = transport.processes().await.unwrap();
    assert_eq!(processes.len(), 1);
    assert_eq!(processes[0].label, "http-site");
    assert_eq!(processes[0].owner.as_deref(), Some("owner-1"));
}

#[tokio::test]
async fn test_error_status_becomes_error() {
    let base_url = start_node().await;
    let transport = HttpTransport::new(&base_url, None);

    let err = transport
        .dry_run(&ProcessId::from("missing"), Message::get_all_counts())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404"));

    assert!(fetch_all_counts(&transport, &ProcessId::from("missing"))
        .await
        .is_none());
}

#[tokio::test]
async fn test_unreachable_node_is_no_data() {
    // Nothing listens on the discard port
    let transport = HttpTransport::new("http://127.0.0.1:9", None);

    assert!(transport.spawn("site").await.is_err());
    assert!(fetch_all_counts(&transport, &ProcessId::from("any"))
        .await
        .is_none());
}
