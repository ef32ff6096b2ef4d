// cropper-cli/tests/server_tests.rs
//
// Router tests driven through tower's `oneshot`, with an in-memory queue and
// scripted ffmpeg/ffprobe doubles.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use cropper_cli::{AppState, build_router};
use cropper_core::crop::FnExecutor;
use cropper_core::external::ToolPaths;
use cropper_core::external::mocks::{MockFfmpegSpawner, MockFfprobeExecutor};
use cropper_core::{DimensionDetector, PathMappings, QueueEngine, SharedExecutor, Store};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

struct TestServer {
    router: Router,
    engine: QueueEngine<SharedExecutor>,
    spawner: MockFfmpegSpawner,
    release: mpsc::Sender<()>,
}

/// Router whose crops block until `release` is signalled.
async fn test_server(mappings: &str) -> TestServer {
    let (release, gate) = mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let executor: SharedExecutor = Arc::new(FnExecutor::new(move |_path: &Path| {
        let _ = gate.lock().unwrap().recv();
        Ok(())
    }));

    let store = Store::open_in_memory().unwrap();
    let engine = QueueEngine::start(store, PathMappings::parse(mappings), executor)
        .await
        .unwrap();

    let spawner = MockFfmpegSpawner::new();
    let detector = DimensionDetector::new(spawner.clone(), MockFfprobeExecutor::new(), ToolPaths::default());
    let router = build_router(AppState {
        engine: engine.clone(),
        detector: Arc::new(detector),
    });
    TestServer { router, engine, spawner, release }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Value {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_list_and_remove() {
    let server = test_server("").await;

    let added = send(&server.router, "POST", "/api/1/queue/add", Some(json!({"file": "/tv/a.mkv"}))).await;
    assert_eq!(added["success"], true);
    assert_eq!(added["detail"]["type"], "queue/add");
    let id = added["detail"]["position"].as_i64().unwrap();

    let again = send(&server.router, "POST", "/api/1/queue/add", Some(json!({"file": "/tv/a.mkv"}))).await;
    assert_eq!(again["detail"]["position"], id);

    let list = send(&server.router, "GET", "/api/1/queue", None).await;
    assert_eq!(list["detail"]["type"], "queue");
    assert_eq!(list["detail"]["subtype"], "list");
    let items = list["detail"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["path"], "/tv/a.mkv");
    assert_eq!(items[0]["name"], "a.mkv");
    assert_eq!(items[0]["localSource"]["name"], "Api");

    let removed = send(&server.router, "POST", "/api/1/queue/remove", Some(json!({"file": "/tv/a.mkv"}))).await;
    assert_eq!(removed["success"], true);
    assert_eq!(removed["detail"]["position"], id);

    server.release.send(()).unwrap();
    server.engine.wait_idle().await;
}

#[tokio::test]
async fn test_add_without_file_fails() {
    let server = test_server("").await;

    let response = send(&server.router, "POST", "/api/1/queue/add", Some(json!({"name": "x"}))).await;
    assert_eq!(response["success"], false);
    assert_eq!(response["detail"]["type"], "queue/add");
    assert_eq!(response["detail"]["error"], "No file was provided in message body");

    let no_body = send(&server.router, "POST", "/api/1/queue/add", None).await;
    assert_eq!(no_body["success"], false);
}

#[tokio::test]
async fn test_remove_unknown_file_reports_minus_one() {
    let server = test_server("").await;

    let response = send(&server.router, "POST", "/api/1/queue/remove", Some(json!({"file": "/nope.mkv"}))).await;
    assert_eq!(response["success"], true);
    assert_eq!(response["detail"]["position"], -1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sonarr_import_and_delete() {
    let server = test_server("/downloads:/media").await;

    let import = json!({
        "eventType": "Download",
        "series": {"title": "Show", "network": "HBO"},
        "episodeFile": {"path": "/downloads/tv/S01E01.mkv", "releaseGroup": "NTb"}
    });
    let added = send(&server.router, "POST", "/api/1/webhook/sonarr", Some(import)).await;
    assert_eq!(added["success"], true);
    assert_eq!(added["detail"]["type"], "webhook/arr/add");
    let id = added["detail"]["position"].as_i64().unwrap();

    let item = server.engine.get(id).await.unwrap().unwrap();
    assert_eq!(item.path, "/media/tv/S01E01.mkv");
    assert_eq!(item.local_source.unwrap().name, "Sonarr");
    assert_eq!(item.remote_source.unwrap().name, "HBO");
    assert_eq!(item.remote_group.unwrap().name, "NTb");

    let delete = json!({
        "eventType": "episodeFileDelete",
        "episodeFile": {"path": "/downloads/tv/S01E01.mkv"}
    });
    let removed = send(&server.router, "POST", "/api/1/webhook/sonarr", Some(delete)).await;
    assert_eq!(removed["detail"]["type"], "webhook/arr/remove");
    assert_eq!(removed["detail"]["position"], id);

    server.release.send(()).unwrap();
    server.engine.wait_idle().await;
}

#[tokio::test]
async fn test_radarr_test_and_irrelevant_events() {
    let server = test_server("").await;

    let test = send(&server.router, "POST", "/api/1/webhook/radarr", Some(json!({"eventType": "Test"}))).await;
    assert_eq!(test, json!({"success": true, "detail": {"type": "test", "program": "Radarr"}}));

    let grab = send(&server.router, "POST", "/api/1/webhook/radarr", Some(json!({"eventType": "Grab"}))).await;
    assert_eq!(grab["success"], false);
    assert_eq!(grab["detail"]["type"], "event");
    assert_eq!(grab["detail"]["subtype"], "Grab");
    assert!(grab["detail"]["error"].as_str().unwrap().contains("Non-relevant Radarr event"));
}

#[tokio::test]
async fn test_import_without_path_fails() {
    let server = test_server("").await;

    let response = send(
        &server.router,
        "POST",
        "/api/1/webhook/radarr",
        Some(json!({"eventType": "DownloadFolderImported", "data": {}})),
    )
    .await;
    assert_eq!(response["success"], false);
    assert_eq!(response["detail"]["error"], "No file path provided in event");
}

#[tokio::test]
async fn test_detect_endpoint() {
    let server = test_server("").await;
    for position in ["60.00", "180.00", "300.00", "420.00", "540.00"] {
        server.spawner.add_cropdetect_expectation(position, &["1920:800:0:140"]);
    }

    let response = send(&server.router, "POST", "/api/1/detect", Some(json!({"file": "/media/movie.mkv"}))).await;
    assert_eq!(
        response,
        json!({
            "success": true,
            "detail": {
                "type": "detect",
                "file_width": 1920,
                "file_height": 1080,
                "actual_width": 1920,
                "actual_height": 800,
                "left_offset": 0,
                "top_offset": 140,
                "aspect": "2.35:1 (anamorphic)"
            }
        })
    );
}

#[tokio::test]
async fn test_detect_failure_is_reported() {
    let server = test_server("").await;
    for position in ["60.00", "180.00", "300.00", "420.00", "540.00"] {
        server.spawner.add_cropdetect_expectation(position, &[]);
    }

    let response = send(&server.router, "POST", "/api/1/detect", Some(json!({"file": "/media/movie.mkv"}))).await;
    assert_eq!(response["success"], false);
    assert_eq!(response["detail"]["type"], "detect");
    assert!(response["detail"]["error"].as_str().unwrap().contains("no crop found"));
}
