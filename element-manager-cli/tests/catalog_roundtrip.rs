//! HttpStore against the mock catalog served on an ephemeral port.

use axum::{extract::State, response::Json, routing::get, Router};
use element_manager_cli::mock_api::{self, seed_catalog};
use element_manager_cli::HttpStore;
use element_manager_core::{
    ElementManager, ElementRef, MemoryStore, NoticeKind, RecordingNotifier, StoreError, StoreOp,
    ValidationProfile,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn serve_mock(store: Arc<MemoryStore>) -> String {
    let (addr, _handle) = mock_api::spawn(store, "127.0.0.1:0").await.unwrap();
    format!("http://{}/objects", addr)
}

fn manager_for(base_url: &str) -> (ElementManager, Arc<RecordingNotifier>) {
    let store = HttpStore::new(base_url, Duration::from_secs(5)).unwrap();
    let notifier = Arc::new(RecordingNotifier::new(true));
    let manager = ElementManager::new(
        Arc::new(store),
        notifier.clone(),
        ValidationProfile::PriceOnly,
    );
    (manager, notifier)
}

#[tokio::test]
async fn test_load_create_edit_delete() {
    let store = Arc::new(MemoryStore::new(seed_catalog()));
    let base_url = serve_mock(store.clone()).await;
    let (mut manager, notifier) = manager_for(&base_url);

    manager.load().await;
    assert_eq!(manager.elements().len(), 7);
    assert_eq!(manager.state().next_local_id(), 8);
    assert!(notifier.notices().await.is_empty());

    manager.set_draft_name("Apple iPad Air");
    manager.set_draft_field("price", json!(519.99));
    manager.save_draft().await;
    let created = manager.elements().last().unwrap().clone();
    assert_eq!(created.local_id, Some(8));
    assert!(!created.id.is_empty());
    assert!(store.get(&created.id).await.is_some());
    assert!(!manager.state().is_remote_owned(&created));

    assert!(manager.view(&ElementRef::Remote("4".into())));
    manager
        .session_mut()
        .set_attribute("price", json!(349.0))
        .unwrap();
    manager.commit().await.unwrap();
    assert!(!manager.session().is_open());
    assert_eq!(
        store.get("4").await.unwrap().data.get("price"),
        &json!(349.0)
    );

    manager.delete(&ElementRef::Remote("3".into())).await;
    assert!(store.get("3").await.is_none());
    assert_eq!(manager.elements().len(), 7);

    assert_eq!(
        notifier.kinds().await,
        vec![NoticeKind::Success, NoticeKind::Success, NoticeKind::Success]
    );
}

#[tokio::test]
async fn test_non_persisting_catalog_forgets_creates() {
    let store = Arc::new(MemoryStore::non_persisting(seed_catalog()));
    let base_url = serve_mock(store.clone()).await;
    let (mut manager, _notifier) = manager_for(&base_url);

    manager.load().await;
    manager
        .create(element_manager_core::Element::new(
            "Transient",
            vec![("price", json!(10))].into_iter().collect(),
        ))
        .await;
    assert_eq!(manager.elements().len(), 8);

    manager.load().await;
    assert_eq!(manager.elements().len(), 7);
    assert!(manager.elements().iter().all(|e| e.name != "Transient"));
    assert_eq!(store.count(StoreOp::Create).await, 1);
}

#[tokio::test]
async fn test_non_list_response_is_ignored() {
    let serve_array = Arc::new(AtomicBool::new(true));
    let app = Router::new()
        .route(
            "/objects",
            get(|State(flag): State<Arc<AtomicBool>>| async move {
                let body: Value = if flag.swap(false, Ordering::SeqCst) {
                    json!([{"id": "1", "name": "Google Pixel 6 Pro", "data": {"price": 499}}])
                } else {
                    json!({"error": "maintenance"})
                };
                Json(body)
            }),
        )
        .with_state(serve_array);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut manager, notifier) = manager_for(&format!("http://{}/objects", addr));
    manager.load().await;
    let before = manager.state().clone();
    assert_eq!(before.elements().len(), 1);

    manager.load().await;
    assert_eq!(manager.state(), &before);
    assert!(notifier.notices().await.is_empty());
}

#[tokio::test]
async fn test_undecodable_list_item_reports_error() {
    let app = Router::new().route(
        "/objects",
        get(|| async {
            Json(json!([
                {"id": "1", "name": "Google Pixel 6 Pro", "data": {"price": 499}},
                {"id": "2", "name": "Broken", "data": []}
            ]))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut manager, notifier) = manager_for(&format!("http://{}/objects", addr));
    let notices = manager.load().await;

    assert!(manager.elements().is_empty());
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert!(notices[0].message.contains("undecodable response"));
    assert_eq!(notifier.notices().await, notices);
}

#[tokio::test]
async fn test_unreachable_catalog_reports_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (mut manager, notifier) = manager_for(&format!("http://{}/objects", addr));
    manager.load().await;

    assert!(manager.elements().is_empty());
    let notices = notifier.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert!(notices[0].message.starts_with("Failed to load elements"));
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let store = Arc::new(MemoryStore::new(seed_catalog()));
    let base_url = serve_mock(store.clone()).await;
    let (mut manager, notifier) = manager_for(&base_url);
    manager.load().await;

    store
        .fail_next(
            StoreOp::Create,
            StoreError::Status {
                status: 503,
                body: "unavailable".into(),
            },
        )
        .await;
    manager.set_draft_name("Apple Watch");
    manager.set_draft_field("price", json!(399));
    manager.save_draft().await;

    assert_eq!(manager.elements().len(), 7);
    assert_eq!(manager.draft().name, "Apple Watch");
    let notices = notifier.notices().await;
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("HTTP 503"));
    assert!(notices[0].message.contains("unavailable"));
}

#[tokio::test]
async fn test_delete_unknown_remote_id_reports_not_found() {
    let store = Arc::new(MemoryStore::new(seed_catalog()));
    let base_url = serve_mock(store.clone()).await;
    let (mut manager, notifier) = manager_for(&base_url);
    manager.load().await;

    // removed behind the client's back
    store
        .fail_next(
            StoreOp::Delete,
            StoreError::Status {
                status: 404,
                body: "Object with id = 5 was not found.".into(),
            },
        )
        .await;
    manager.delete(&ElementRef::Remote("5".into())).await;

    assert!(manager.elements().iter().any(|e| e.id == "5"));
    assert_eq!(notifier.kinds().await, vec![NoticeKind::Error]);
    assert!(notifier.notices().await[0].message.contains("HTTP 404"));
}
