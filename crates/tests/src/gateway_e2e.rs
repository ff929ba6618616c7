//! HTTP -> engine -> file, through the real router

use std::sync::Arc;
use std::time::Duration;

use auth::CredentialStore;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use contracts::{DestinationKey, RetryPolicy};
use engine::Engine;
use flusher::FileSink;
use gateway::AppState;
use tower::ServiceExt;

use crate::support::{expected_payloads, ordered_config, read_lines};

struct App {
    router: Router,
    engine: Engine<FileSink>,
    sink: Arc<FileSink>,
    _dir: tempfile::TempDir,
}

fn app(tokens: &[&str]) -> App {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(FileSink::new("file", dir.path()).unwrap());
    let engine = Engine::new(
        ordered_config(60_000),
        RetryPolicy::new(3, Duration::from_millis(10)),
        Arc::clone(&sink),
    );
    engine.start(Vec::new()).unwrap();

    let state = AppState::new(
        Arc::new(CredentialStore::new(tokens.iter().copied())),
        Arc::clone(engine.registry()),
        engine.handle(),
    );
    App {
        router: gateway::router(state),
        engine,
        sink,
        _dir: dir,
    }
}

async fn get(app: &App, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_hundred_messages_over_http() {
    let app = app(&["valid_token_1"]);

    let (status, _) = get(&app, "/add-user?token=valid_token_1&fileID=file1").await;
    assert_eq!(status, StatusCode::OK);

    for i in 0..100 {
        let uri = format!("/add-message?token=valid_token_1&fileID=file1&data=data{i}");
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let stats = app.engine.shutdown().await.unwrap();

    let path = app.sink.path_for(&DestinationKey::from("file1"));
    assert_eq!(read_lines(&path), expected_payloads("data", 100));
    assert_eq!(stats.flush.records_written, 100);
}

#[tokio::test]
async fn test_rejected_messages_never_reach_disk() {
    let app = app(&["valid_token_1", "valid_token_2"]);
    get(&app, "/add-user?token=valid_token_1&fileID=file1").await;

    let (status, _) = get(&app, "/add-message?token=invalid_token&fileID=file1&data=x").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = get(&app, "/add-message?token=valid_token_2&fileID=file1&data=x").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = get(&app, "/add-message?token=valid_token_1&fileID=file2&data=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stats = app.engine.shutdown().await.unwrap();

    assert_eq!(stats.ingestion.submitted, 0);
    assert!(!app.sink.path_for(&DestinationKey::from("file1")).exists());
}

#[tokio::test]
async fn test_two_tokens_share_one_file() {
    let app = app(&["valid_token_1", "valid_token_2"]);
    get(&app, "/add-user?token=valid_token_1&fileID=shared").await;
    get(&app, "/add-user?token=valid_token_2&fileID=shared").await;

    for i in 0..5 {
        get(&app, &format!("/add-message?token=valid_token_1&fileID=shared&data=one{i}")).await;
        get(&app, &format!("/add-message?token=valid_token_2&fileID=shared&data=two{i}")).await;
    }
    app.engine.shutdown().await.unwrap();

    let lines = read_lines(&app.sink.path_for(&DestinationKey::from("shared")));
    assert_eq!(lines.len(), 10);
    let ones: Vec<_> = lines.iter().filter(|l| l.starts_with("one")).cloned().collect();
    assert_eq!(ones, expected_payloads("one", 5));
}

#[tokio::test]
async fn test_messages_after_shutdown_are_unavailable() {
    let app = app(&["valid_token_1"]);
    get(&app, "/add-user?token=valid_token_1&fileID=file1").await;
    app.engine.shutdown().await.unwrap();

    let (status, _) = get(&app, "/add-message?token=valid_token_1&fileID=file1&data=x").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_fresh_token_reaches_disk() {
    let app = app(&["valid_token_1"]);

    let (status, _) = get(&app, "/add-user?token=newcomer&fileID=fresh").await;
    assert_eq!(status, StatusCode::OK);
    for i in 0..3 {
        let uri = format!("/add-message?token=newcomer&fileID=fresh&data=n{i}");
        assert_eq!(get(&app, &uri).await.0, StatusCode::OK);
    }
    app.engine.shutdown().await.unwrap();

    let path = app.sink.path_for(&DestinationKey::from("fresh"));
    assert_eq!(read_lines(&path), expected_payloads("n", 3));
}
