// Remote-first behavior of the event store against a mocked backend.
use chrono::Utc;
use mockito::{Matcher, Server, ServerGuard};
use moodjournal::client::RemoteClient;
use moodjournal::context::TestContext;
use moodjournal::model::{Event, EventFilter, EventPatch, EventStatus};
use moodjournal::storage::LocalStorage;
use moodjournal::store::EventStore;
use std::sync::Arc;
use std::time::Duration;

const SESSION: &str = "s1";

fn numbered(n: usize) -> Vec<Event> {
    (1..=n)
        .map(|i| {
            let mut e = Event::from_dialog(&format!("local event {}", i), Utc::now());
            e.id = i.to_string();
            e
        })
        .collect()
}

/// Matches `p` whether or not the query string is part of the matched path.
fn path(p: &str) -> Matcher {
    Matcher::Regex(format!(r"^{}(\?.*)?$", p))
}

fn session_query() -> Matcher {
    Matcher::UrlEncoded("session_id".into(), SESSION.into())
}

fn store_against(url: &str, local: &[Event]) -> (Arc<TestContext>, EventStore) {
    let ctx = Arc::new(TestContext::new());
    let storage = LocalStorage::new(ctx.clone());
    storage.save(local).unwrap();
    let client = RemoteClient::new(url, SESSION, true, Duration::from_secs(2)).unwrap();
    (ctx, EventStore::new(storage, Some(client)))
}

async fn mock_store(local: &[Event]) -> (ServerGuard, Arc<TestContext>, EventStore) {
    let server = Server::new_async().await;
    let (ctx, store) = store_against(&format!("{}/api", server.url()), local);
    (server, ctx, store)
}

#[tokio::test]
async fn test_server_error_on_status_update_falls_back_to_local() {
    let (mut server, _ctx, store) = mock_store(&numbered(3)).await;
    let mock = server
        .mock("PUT", path("/api/events/2"))
        .match_query(session_query())
        .with_status(500)
        .create_async()
        .await;

    store
        .update_status("2", EventStatus::Confirmed)
        .await
        .expect("remote failure must not surface");

    mock.assert_async().await;
    let local = store.storage().load().unwrap();
    assert_eq!(local[1].status, EventStatus::Confirmed);
    assert_eq!(local[0].status, EventStatus::Pending);
}

#[tokio::test]
async fn test_unreachable_backend_falls_back_to_local() {
    let (_ctx, store) = store_against("http://127.0.0.1:1/api", &numbered(3));

    let page = store.list(&EventFilter::default(), 1, 10).await.unwrap();
    assert_eq!(page.total, 3);

    store.delete("1").await.unwrap();
    let ids: Vec<String> = store
        .storage()
        .load()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["2", "3"]);
}

#[tokio::test]
async fn test_silent_backend_times_out_and_falls_back_to_local() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let ctx = Arc::new(TestContext::new());
    let storage = LocalStorage::new(ctx.clone());
    storage.save(&numbered(2)).unwrap();
    let client = RemoteClient::new(
        &format!("http://{}/api", addr),
        SESSION,
        true,
        Duration::from_millis(300),
    )
    .unwrap();
    let store = EventStore::new(storage, Some(client));

    let started = std::time::Instant::now();
    store
        .update_status("2", EventStatus::Confirmed)
        .await
        .expect("a timed out call must not surface");

    assert!(started.elapsed() < Duration::from_secs(5));
    let local = store.storage().load().unwrap();
    assert_eq!(local[1].status, EventStatus::Confirmed);
    assert_eq!(local[0].status, EventStatus::Pending);
    silent.abort();
}

#[tokio::test]
async fn test_remote_list_is_filtered_and_paged() {
    let (mut server, _ctx, store) = mock_store(&[]).await;
    let body = serde_json::json!({
        "events": [
            {"id": 1, "primaryType": "emotional", "title": "a", "status": "confirmed"},
            {"id": 2, "primaryType": "cognitive", "title": "b", "status": "pending"},
            {"id": 3, "primaryType": "emotional", "title": "c", "status": "confirmed"},
            {"id": "4", "title": "d", "status": "confirmed"}
        ]
    });
    let mock = server
        .mock("GET", path("/api/events"))
        .match_query(session_query())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(2)
        .create_async()
        .await;

    let confirmed = store
        .list(&EventFilter::by_status(EventStatus::Confirmed), 1, 2)
        .await
        .unwrap();
    assert_eq!(confirmed.total, 3);
    let ids: Vec<&str> = confirmed.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);

    let found = store.get("4").await.unwrap().expect("remote record");
    assert_eq!(found.title, "d");
    assert_eq!(found.primary_type, None);

    mock.assert_async().await;
    assert!(store.storage().load().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_remote_body_falls_back_to_local() {
    let (mut server, _ctx, store) = mock_store(&numbered(2)).await;
    let _mock = server
        .mock("GET", path("/api/events"))
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let page = store.list(&EventFilter::default(), 1, 10).await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_remote_update_success_leaves_local_untouched() {
    let local = numbered(2);
    let (mut server, _ctx, store) = mock_store(&local).await;
    let mock = server
        .mock("PUT", path("/api/events/1"))
        .match_query(session_query())
        .match_body(Matcher::JsonString(r#"{"title":"x"}"#.to_string()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    store
        .update(
            "1",
            EventPatch {
                title: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(store.storage().load().unwrap(), local);
}

#[tokio::test]
async fn test_remote_delete_success_leaves_local_untouched() {
    let local = numbered(2);
    let (mut server, _ctx, store) = mock_store(&local).await;
    let mock = server
        .mock("DELETE", path("/api/events/2"))
        .match_query(session_query())
        .with_status(204)
        .create_async()
        .await;

    store.delete("2").await.unwrap();

    mock.assert_async().await;
    assert_eq!(store.storage().load().unwrap(), local);
}

#[tokio::test]
async fn test_remote_not_found_on_delete_falls_back_to_local() {
    let (mut server, _ctx, store) = mock_store(&numbered(2)).await;
    let _mock = server
        .mock("DELETE", path("/api/events/2"))
        .with_status(404)
        .create_async()
        .await;

    store.delete("2").await.unwrap();

    let local = store.storage().load().unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].id, "1");
}

#[tokio::test]
async fn test_extraction_stays_local_with_remote_attached() {
    let (server, _ctx, store) = mock_store(&[]).await;

    let event = store.extract_from_dialog("I argued with my sister").unwrap();

    assert!(store.is_remote());
    assert_eq!(store.storage().load().unwrap(), vec![event]);
    drop(server);
}
