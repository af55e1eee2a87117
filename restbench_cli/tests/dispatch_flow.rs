use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use restbench_cli::{
    ClientError, DispatchError, DispatchRequest, Dispatcher, HistoryBrowser, HistoryClient,
    LogStatus,
};
use restbench_common::{HttpVerb, LogEntryPatch, NewLogEntry, PageRequest};
use restbench_server::{
    build_router,
    config::{CorsPolicy, DatabaseConfig},
    AppState, Config, MemoryStore, Store,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_history_server() -> String {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        max_connections: 1,
        cors: CorsPolicy::Permissive,
        static_dir: None,
    };
    spawn(build_router(AppState::new(config, Store::Memory(MemoryStore::new())))).await
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let token = headers
        .get("x-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(json!({ "method": method.as_str(), "token": token, "body": body }))
}

/// A target API for dispatched requests
async fn spawn_target() -> String {
    let router = Router::new()
        .route("/echo", any(echo))
        .route("/text", get(|| async { "plain response" }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "message": "nope" }))) }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }),
        );
    spawn(router).await
}

fn request(method: HttpVerb, url: String, headers: &str, body: &str) -> DispatchRequest {
    DispatchRequest {
        method,
        url,
        headers: headers.to_string(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn test_dispatch_records_history() {
    let history_url = spawn_history_server().await;
    let target = spawn_target().await;
    let history = HistoryClient::new(&history_url).unwrap();
    let dispatcher = Dispatcher::new(history.clone()).unwrap();

    let outcome = dispatcher
        .dispatch(&request(
            HttpVerb::Post,
            format!("{}/echo", target),
            r#"{"X-Token": "abc"}"#,
            r#"{"title": "foo", "userId": 1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(outcome.response.status, 200);
    assert_eq!(outcome.response.data["method"], "POST");
    assert_eq!(outcome.response.data["token"], "abc");
    assert_eq!(outcome.response.data["body"], json!({"title": "foo", "userId": 1}));
    assert!(outcome.failure.is_none());

    let LogStatus::Recorded(id) = outcome.log else {
        panic!("expected the request to be recorded, got {:?}", outcome.log);
    };

    let entry = history.get(id).await.unwrap();
    assert_eq!(entry.method, "POST");
    assert_eq!(entry.url, format!("{}/echo", target));
    assert_eq!(entry.headers, json!({"X-Token": "abc"}));
    assert_eq!(entry.body, Some(json!({"title": "foo", "userId": 1})));
    assert_eq!(entry.response, outcome.response.data);
    assert_eq!(entry.status_code, 200);
}

#[tokio::test]
async fn test_get_dispatch_logs_null_body_and_keeps_error_statuses() {
    let history_url = spawn_history_server().await;
    let target = spawn_target().await;
    let history = HistoryClient::new(&history_url).unwrap();
    let dispatcher = Dispatcher::new(history.clone()).unwrap();

    let outcome = dispatcher
        .dispatch(&request(HttpVerb::Get, format!("{}/missing", target), "{}", "{ignored"))
        .await
        .unwrap();

    assert_eq!(outcome.response.status, 404);
    assert_eq!(outcome.response.data, json!({"message": "nope"}));

    let LogStatus::Recorded(id) = outcome.log else {
        panic!("expected the request to be recorded");
    };
    let entry = history.get(id).await.unwrap();
    assert_eq!(entry.body, None);
    assert_eq!(entry.status_code, 404);
}

#[tokio::test]
async fn test_text_response_is_kept_as_string() {
    let history_url = spawn_history_server().await;
    let target = spawn_target().await;
    let dispatcher = Dispatcher::new(HistoryClient::new(&history_url).unwrap()).unwrap();

    let outcome = dispatcher
        .dispatch(&request(HttpVerb::Get, format!("{}/text", target), "{}", ""))
        .await
        .unwrap();

    assert_eq!(outcome.response.status, 200);
    assert_eq!(outcome.response.data, json!("plain response"));
    assert!(matches!(outcome.log, LogStatus::Recorded(_)));
}

#[tokio::test]
async fn test_network_failure_shows_failed_response_and_skips_logging() {
    let history_url = spawn_history_server().await;
    let history = HistoryClient::new(&history_url).unwrap();
    let dispatcher = Dispatcher::new(history.clone()).unwrap();

    let outcome = dispatcher
        .dispatch(&request(HttpVerb::Get, "http://127.0.0.1:1/".to_string(), "{}", ""))
        .await
        .unwrap();

    assert_eq!(outcome.response.status, 500);
    assert_eq!(outcome.response.data, json!("Request failed"));
    assert_eq!(outcome.log, LogStatus::Skipped);
    assert!(matches!(outcome.failure, Some(DispatchError::Network(_))));

    let page = history.list(PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_invalid_body_is_not_sent() {
    let history_url = spawn_history_server().await;
    let target = spawn_target().await;
    let history = HistoryClient::new(&history_url).unwrap();
    let dispatcher = Dispatcher::new(history.clone()).unwrap();

    let outcome = dispatcher
        .dispatch(&request(HttpVerb::Put, format!("{}/echo", target), "{}", "{broken"))
        .await
        .unwrap();

    assert_eq!(outcome.response.status, 500);
    assert!(matches!(outcome.failure, Some(DispatchError::InvalidBody(_))));
    assert_eq!(history.list(PageRequest::default()).await.unwrap().total, 0);
}

#[tokio::test]
async fn test_history_failure_still_shows_response() {
    let broken_history = spawn(Router::new().route(
        "/history",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "database is down" })),
            )
        }),
    ))
    .await;
    let target = spawn_target().await;
    let dispatcher = Dispatcher::new(HistoryClient::new(&broken_history).unwrap()).unwrap();

    let outcome = dispatcher
        .dispatch(&request(HttpVerb::Delete, format!("{}/echo", target), "{}", ""))
        .await
        .unwrap();

    assert_eq!(outcome.response.status, 200);
    assert_eq!(outcome.response.data["method"], "DELETE");
    let LogStatus::Failed(message) = outcome.log else {
        panic!("expected a logging failure");
    };
    assert!(message.contains("database is down"));
}

#[tokio::test]
async fn test_second_dispatch_while_busy_is_rejected() {
    let history_url = spawn_history_server().await;
    let target = spawn_target().await;
    let dispatcher = Dispatcher::new(HistoryClient::new(&history_url).unwrap()).unwrap();

    let slow = request(HttpVerb::Get, format!("{}/slow", target), "{}", "");
    let fast = request(HttpVerb::Get, format!("{}/text", target), "{}", "");

    let (first, second) = tokio::join!(dispatcher.dispatch(&slow), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        dispatcher.dispatch(&fast).await
    });

    assert_eq!(first.unwrap().response.status, 200);
    assert!(matches!(second, Err(DispatchError::Busy)));
    assert!(!dispatcher.is_busy());

    // Free again once the first dispatch finished
    assert!(dispatcher.dispatch(&fast).await.is_ok());
}

#[tokio::test]
async fn test_browser_pages_through_history() {
    let history_url = spawn_history_server().await;
    let client = HistoryClient::new(&history_url).unwrap();

    for i in 0..15 {
        client
            .create(&NewLogEntry::new("GET", format!("http://target/{}", i), 200))
            .await
            .unwrap();
    }

    let mut browser = HistoryBrowser::new(10);
    assert_eq!(browser.load_page(&client).await.unwrap(), 10);
    assert!(browser.has_more());
    assert_eq!(browser.total(), Some(15));

    // Already loaded, nothing fetched
    assert_eq!(browser.load_page(&client).await.unwrap(), 0);

    assert!(browser.on_scroll(9));
    assert_eq!(browser.load_page(&client).await.unwrap(), 5);
    assert!(!browser.has_more());
    assert!(!browser.on_scroll(14));

    let ids: HashSet<i64> = browser.entries().iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), 15);
    assert_eq!(browser.entries()[0].url, "http://target/14");
    assert_eq!(browser.entries()[14].url, "http://target/0");
}

#[tokio::test]
async fn test_browser_keeps_page_pending_after_error() {
    let client = HistoryClient::new("http://127.0.0.1:1").unwrap();
    let mut browser = HistoryBrowser::new(10);

    assert!(browser.load_page(&client).await.is_err());
    assert!(browser.needs_load());
    assert_eq!(browser.page(), 1);
    assert!(browser.entries().is_empty());
}

#[tokio::test]
async fn test_client_crud() {
    let history_url = spawn_history_server().await;
    let client = HistoryClient::new(&history_url).unwrap();

    let created = client
        .create(&NewLogEntry::new("GET", "http://target/a", 200))
        .await
        .unwrap();

    let patch = LogEntryPatch {
        status_code: Some(404),
        ..Default::default()
    };
    let updated = client.update(created.id, &patch).await.unwrap();
    assert_eq!(updated.status_code, 404);
    assert_eq!(updated.url, "http://target/a");
    assert_eq!(updated.created_at, created.created_at);

    client.delete(created.id).await.unwrap();
    assert!(matches!(client.delete(created.id).await, Err(ClientError::NotFound)));
    assert!(matches!(client.get(created.id).await, Err(ClientError::NotFound)));
    assert!(matches!(client.update(99999, &patch).await, Err(ClientError::NotFound)));
}
