// ============================================================================
// cropper-cli/src/server/mod.rs
// ============================================================================
//
// HTTP EVENT SERVER: Queue API and Sonarr/Radarr webhooks
//
// Every response has the shape `{"success": bool, "detail": {"type": ...}}`
// and is sent with status 200; failures are reported through `success`.
//
// ROUTES:
// - GET  /api/1/queue            open queue items
// - POST /api/1/queue/add        enqueue {file, name?}
// - POST /api/1/queue/remove     cancel {file}
// - POST /api/1/detect           detect {file}
// - POST /api/1/webhook/sonarr   Sonarr event
// - POST /api/1/webhook/radarr   Radarr event

pub mod webhook;

use crate::error::CliResult;
use webhook::{ArrEvent, EventKind, Program};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use cropper_core::external::check_dependencies;
use cropper_core::{
    CoreConfig, CoreError, CropRectangle, Detect, EnqueueRequest, FileCropper, QueueEngine,
    QueueItem, SharedExecutor, Store,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: QueueEngine<SharedExecutor>,
    pub detector: Arc<dyn Detect>,
}

// ============================================================================
// RESPONSE SHAPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub detail: Detail,
}

#[derive(Debug, Serialize)]
pub struct Detail {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub body: Body,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Body {
    List { subtype: &'static str, items: Vec<QueueItem> },
    Position { position: i64 },
    Detection(CropRectangle),
    Test { program: &'static str },
    Event { subtype: String, error: String },
    Error { error: String },
}

impl ApiResponse {
    fn ok(kind: &'static str, body: Body) -> Json<Self> {
        Json(Self {
            success: true,
            detail: Detail { kind, body },
        })
    }

    fn failed(kind: &'static str, error: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            detail: Detail {
                kind,
                body: Body::Error { error: error.into() },
            },
        })
    }

    fn from_result(kind: &'static str, result: Result<Body, CoreError>) -> Json<Self> {
        match result {
            Ok(body) => Self::ok(kind, body),
            Err(e) => {
                log::error!("{} failed: {}", kind, e);
                Self::failed(kind, e.to_string())
            }
        }
    }
}

/// Body of the queue and detect endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FileRequest {
    pub file: Option<String>,
    pub name: Option<String>,
}

const NO_FILE_IN_BODY: &str = "No file was provided in message body";
const NO_FILE_IN_EVENT: &str = "No file path provided in event";

/// Extracts `file` from a JSON body, or the error to report.
fn requested_file(payload: &Result<Json<FileRequest>, JsonRejection>) -> Result<String, String> {
    match payload {
        Ok(Json(request)) => request
            .file
            .clone()
            .filter(|file| !file.trim().is_empty())
            .ok_or_else(|| NO_FILE_IN_BODY.to_string()),
        Err(rejection) => Err(rejection.body_text()),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/1/queue", get(list_queue))
        .route("/api/1/queue/add", post(add_to_queue))
        .route("/api/1/queue/remove", post(remove_from_queue))
        .route("/api/1/detect", post(detect))
        .route("/api/1/webhook/sonarr", post(sonarr_webhook))
        .route("/api/1/webhook/radarr", post(radarr_webhook))
        .with_state(state)
}

async fn list_queue(State(state): State<AppState>) -> Json<ApiResponse> {
    let result = state
        .engine
        .list_active()
        .await
        .map(|items| Body::List { subtype: "list", items });
    ApiResponse::from_result("queue", result)
}

async fn add_to_queue(
    State(state): State<AppState>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Json<ApiResponse> {
    let file = match requested_file(&payload) {
        Ok(file) => file,
        Err(error) => return ApiResponse::failed("queue/add", error),
    };
    let name = payload
        .ok()
        .and_then(|Json(request)| request.name)
        .unwrap_or_default();

    let result = state
        .engine
        .enqueue(EnqueueRequest::new(name, file).local_source("Api"))
        .await
        .map(|position| Body::Position { position });
    ApiResponse::from_result("queue/add", result)
}

async fn remove_from_queue(
    State(state): State<AppState>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Json<ApiResponse> {
    let file = match requested_file(&payload) {
        Ok(file) => file,
        Err(error) => return ApiResponse::failed("queue/remove", error),
    };
    let result = cancel(&state, &file).await;
    ApiResponse::from_result("queue/remove", result)
}

async fn detect(
    State(state): State<AppState>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Json<ApiResponse> {
    let file = match requested_file(&payload) {
        Ok(file) => file,
        Err(error) => return ApiResponse::failed("detect", error),
    };
    let path = PathBuf::from(state.engine.mappings().apply(&file));
    let detector = Arc::clone(&state.detector);

    let result = match tokio::task::spawn_blocking(move || detector.detect(&path)).await {
        Ok(detected) => detected.map(Body::Detection),
        Err(e) => Err(CoreError::Task(e.to_string())),
    };
    ApiResponse::from_result("detect", result)
}

async fn sonarr_webhook(
    State(state): State<AppState>,
    payload: Result<Json<ArrEvent>, JsonRejection>,
) -> Json<ApiResponse> {
    handle_arr_event(&state, Program::Sonarr, payload).await
}

async fn radarr_webhook(
    State(state): State<AppState>,
    payload: Result<Json<ArrEvent>, JsonRejection>,
) -> Json<ApiResponse> {
    handle_arr_event(&state, Program::Radarr, payload).await
}

async fn handle_arr_event(
    state: &AppState,
    program: Program,
    payload: Result<Json<ArrEvent>, JsonRejection>,
) -> Json<ApiResponse> {
    let event = match payload {
        Ok(Json(event)) => event,
        Err(rejection) => {
            log::warn!("Unreadable {} event: {}", program, rejection.body_text());
            return ApiResponse::failed("event", rejection.body_text());
        }
    };

    match event.kind() {
        EventKind::Import => {
            let Some(request) = event.import_request(program) else {
                log::warn!("{} {} event carried no file path", program, event.event_type);
                return ApiResponse::failed("webhook/arr/add", NO_FILE_IN_EVENT);
            };
            let result = state
                .engine
                .enqueue(request)
                .await
                .map(|position| Body::Position { position });
            ApiResponse::from_result("webhook/arr/add", result)
        }
        EventKind::Delete => {
            let Some(path) = event.deleted_path() else {
                log::warn!("{} {} event carried no file path", program, event.event_type);
                return ApiResponse::failed("webhook/arr/remove", NO_FILE_IN_EVENT);
            };
            let result = cancel(state, path).await;
            ApiResponse::from_result("webhook/arr/remove", result)
        }
        EventKind::Test => {
            log::info!("{} performed a test.", program);
            ApiResponse::ok("test", Body::Test { program: program.name() })
        }
        EventKind::Other => {
            let warning = format!(
                "Non-relevant {program} event received: {}. Update your {program} settings to remove this warning.",
                event.event_type
            );
            log::warn!("{}", warning);
            Json(ApiResponse {
                success: false,
                detail: Detail {
                    kind: "event",
                    body: Body::Event {
                        subtype: event.event_type,
                        error: warning,
                    },
                },
            })
        }
    }
}

/// Cancels `file`; a path with no rows reports position -1.
async fn cancel(state: &AppState, file: &str) -> Result<Body, CoreError> {
    let position = state.engine.cancel(file).await?.unwrap_or(-1);
    Ok(Body::Position { position })
}

// ============================================================================
// SERVER STARTUP
// ============================================================================

/// Opens the queue and serves the API until Ctrl-C.
pub async fn run(config: CoreConfig) -> CliResult<()> {
    let tools = config.tool_paths();
    check_dependencies(&tools)?;

    let store = Store::open(&config.database_path)?;
    log::info!("Using queue database {}", config.database_path.display());

    let detector = crate::commands::system_detector(&config);
    let cropper = FileCropper::new(crate::commands::system_detector(&config), config.crop_mode.clone());
    let executor: SharedExecutor = Arc::new(cropper);
    let engine = QueueEngine::start(store, config.path_mappings.clone(), executor).await?;

    let app = build_router(AppState {
        engine,
        detector: Arc::new(detector),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    log::info!("Listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
