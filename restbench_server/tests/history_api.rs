use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use restbench_common::{HistoryPage, LogEntry};
use restbench_server::{
    build_router,
    config::{CorsPolicy, DatabaseConfig},
    AppState, Config, MemoryStore, Store,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        max_connections: 1,
        cors: CorsPolicy::Permissive,
        static_dir: None,
    }
}

fn app() -> Router {
    build_router(AppState::new(test_config(), Store::Memory(MemoryStore::new())))
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

async fn create(app: &Router, body: Value) -> LogEntry {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/history", &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

fn sample(url: &str) -> Value {
    json!({
        "method": "GET",
        "url": url,
        "headers": {},
        "body": null,
        "response": {"ok": true},
        "statusCode": 200
    })
}

// --- create ---

#[tokio::test]
async fn create_returns_201_with_numeric_id() {
    let app = app();
    let resp = app
        .oneshot(json_request("POST", "/history", &sample("http://x").to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let value: Value = body_json(resp).await;
    assert!(value["id"].is_i64());
    assert_eq!(value["statusCode"], 200);
    assert_eq!(value["response"], json!({"ok": true}));
    assert!(value["body"].is_null());
    assert!(value["createdAt"].is_string());
}

#[tokio::test]
async fn create_ignores_client_supplied_id_and_created_at() {
    let app = app();
    let before = chrono::Utc::now();
    let mut body = sample("http://x");
    body["id"] = json!(12345);
    body["createdAt"] = json!("1999-01-01T00:00:00Z");

    let created = create(&app, body).await;
    assert_ne!(created.id, 12345);
    assert!(created.created_at >= before);
}

#[tokio::test]
async fn create_assigns_distinct_ids() {
    let app = app();
    let mut seen = HashSet::new();
    for i in 0..5 {
        let created = create(&app, sample(&format!("http://x/{}", i))).await;
        assert!(seen.insert(created.id), "id {} reused", created.id);
    }
}

#[tokio::test]
async fn create_malformed_json_returns_error_body() {
    let app = app();
    let resp = app
        .oneshot(json_request("POST", "/history", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let value: Value = body_json(resp).await;
    assert!(value["error"].is_string());
}

#[tokio::test]
async fn create_with_missing_or_mistyped_field_fails_like_storage() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/history", r#"{"method":"GET","url":"http://x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let value: Value = body_json(resp).await;
    assert!(value["error"].as_str().unwrap().contains("statusCode"));

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/history",
            r#"{"method":"GET","url":"http://x","statusCode":"abc"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let value: Value = body_json(resp).await;
    assert!(value["error"].is_string());

    let resp = app.oneshot(empty_request("GET", "/history")).await.unwrap();
    let page: HistoryPage = body_json(resp).await;
    assert_eq!(page.total, 0);
}

// --- list ---

#[tokio::test]
async fn list_empty() {
    let app = app();
    let resp = app.oneshot(empty_request("GET", "/history")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: HistoryPage = body_json(resp).await;
    assert!(page.data.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn list_paginates_fifteen_records() {
    let app = app();
    for i in 0..15 {
        create(&app, sample(&format!("http://x/{}", i))).await;
    }

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/history?page=1&limit=10"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let first: HistoryPage = body_json(resp).await;
    assert_eq!(first.data.len(), 10);
    assert_eq!(first.total, 15);
    assert_eq!(first.data[0].url, "http://x/14");

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/history?page=2&limit=10"))
        .await
        .unwrap();
    let second: HistoryPage = body_json(resp).await;
    assert_eq!(second.data.len(), 5);
    assert_eq!(second.total, 15);

    let ids: HashSet<i64> = first
        .data
        .iter()
        .chain(second.data.iter())
        .map(|e| e.id)
        .collect();
    assert_eq!(ids.len(), 15);

    let all: Vec<&LogEntry> = first.data.iter().chain(second.data.iter()).collect();
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn list_uses_defaults_for_bad_parameters() {
    let app = app();
    for i in 0..12 {
        create(&app, sample(&format!("http://x/{}", i))).await;
    }

    let resp = app
        .oneshot(empty_request("GET", "/history?page=abc&limit=-4"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: HistoryPage = body_json(resp).await;
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.total, 12);
}

#[tokio::test]
async fn list_ignores_undecodable_query() {
    let app = app();
    for i in 0..12 {
        create(&app, sample(&format!("http://x/{}", i))).await;
    }

    let resp = app
        .oneshot(empty_request("GET", "/history?page=1&page=2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: HistoryPage = body_json(resp).await;
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.total, 12);
}

// --- get ---

#[tokio::test]
async fn get_missing_returns_404() {
    let app = app();
    let resp = app
        .oneshot(empty_request("GET", "/history/99999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let value: Value = body_json(resp).await;
    assert_eq!(value, json!({"error": "Not found"}));
}

#[tokio::test]
async fn get_non_numeric_id_returns_404() {
    let app = app();
    let resp = app
        .oneshot(empty_request("GET", "/history/abc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_existing() {
    let app = app();
    let created = create(&app, sample("http://x")).await;

    let resp = app
        .oneshot(empty_request("GET", &format!("/history/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: LogEntry = body_json(resp).await;
    assert_eq!(fetched, created);
}

// --- update ---

#[tokio::test]
async fn update_changes_only_status_code() {
    let app = app();
    let created = create(&app, sample("http://x")).await;

    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/history/{}", created.id),
            r#"{"statusCode":201}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let updated: LogEntry = body_json(resp).await;
    assert_eq!(
        updated,
        LogEntry {
            status_code: 201,
            ..created
        }
    );
}

#[tokio::test]
async fn update_ignores_id_and_created_at() {
    let app = app();
    let created = create(&app, sample("http://x")).await;

    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/history/{}", created.id),
            r#"{"id":777,"createdAt":"2000-01-01T00:00:00Z","url":"http://y"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let updated: LogEntry = body_json(resp).await;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.url, "http://y");
}

#[tokio::test]
async fn update_missing_returns_404() {
    let app = app();
    let resp = app
        .oneshot(json_request("PUT", "/history/5", r#"{"statusCode":201}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_writes_explicit_nulls() {
    let app = app();
    let mut body = sample("http://x");
    body["headers"] = json!({"X-Token": "abc"});
    body["response"] = json!({"a": 1});
    let created = create(&app, body).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/history/{}", created.id),
            r#"{"response":null,"headers":null}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = body_json(resp).await;
    assert!(updated["response"].is_null());
    assert!(updated["headers"].is_null());
    assert_eq!(updated["url"], "http://x");
    assert_eq!(updated["statusCode"], 200);

    let resp = app
        .oneshot(empty_request("GET", &format!("/history/{}", created.id)))
        .await
        .unwrap();
    let fetched: Value = body_json(resp).await;
    assert!(fetched["response"].is_null());
}

#[tokio::test]
async fn update_with_mistyped_field_fails_like_storage() {
    let app = app();
    let created = create(&app, sample("http://x")).await;

    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/history/{}", created.id),
            r#"{"statusCode":"abc"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- delete ---

#[tokio::test]
async fn delete_then_delete_again() {
    let app = app();
    let created = create(&app, sample("http://x")).await;
    let uri = format!("/history/{}", created.id);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = body_json(resp).await;
    assert_eq!(value, json!({"success": true}));

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.oneshot(empty_request("GET", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- health ---

#[tokio::test]
async fn health_reports_store() {
    let app = app();
    let resp = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let value: Value = body_json(resp).await;
    assert_eq!(value["status"], "healthy");
    assert_eq!(value["store"], "memory");
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let config = Config {
        cors: CorsPolicy::Origin(http::HeaderValue::from_static("http://localhost:5173")),
        ..test_config()
    };
    let app = build_router(AppState::new(config, Store::Memory(MemoryStore::new())));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/history")
                .header(http::header::ORIGIN, "http://localhost:5173")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        resp.headers()
            .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
}

// --- static files ---

#[tokio::test]
async fn static_dir_serves_index_for_client_routes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>restbench</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

    let config = Config {
        static_dir: Some(dir.path().to_path_buf()),
        ..test_config()
    };
    let app = build_router(AppState::new(config, Store::Memory(MemoryStore::new())));

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/some/client/route"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>restbench</html>");

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/app.js"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"console.log(1)");

    let resp = app.oneshot(empty_request("GET", "/history")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: HistoryPage = body_json(resp).await;
    assert_eq!(page.total, 0);
}
