//! HTTP server for the submission, status, and download boundaries.

use anyhow::Result;
use axum::{
    extract::{Multipart, Path as AxumPath, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers::{self, Download};
use crate::config::Config;
use crate::job::JobOrchestrator;
use crate::registry::JobRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub config: Arc<Config>,
}

/// Configure and start the HTTP server
pub async fn start_http_server(
    registry: Arc<JobRegistry>,
    orchestrator: Arc<JobOrchestrator>,
    config: Arc<Config>,
) -> Result<()> {
    let port = config.server.port;
    info!("🚀 Starting HTTP server on port {}", port);

    let app_state = AppState {
        registry,
        orchestrator,
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/translate", post(translate_handler))
        .route("/api/status/:id", get(status_handler))
        .route("/api/download/:id", get(download_handler))
        .with_state(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("🌐 API server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Accept an uploaded video or a remote URL plus a target language.
async fn translate_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut target_language = "en".to_string();
    let mut video: Option<(String, Vec<u8>)> = None;
    let mut youtube_url: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, &e.to_string());
            }
        };

        match field.name().unwrap_or_default() {
            "target_language" => {
                if let Ok(value) = field.text().await {
                    target_language = value;
                }
            }
            "youtube_url" => {
                if let Ok(value) = field.text().await {
                    youtube_url = Some(value);
                }
            }
            "video" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "upload.mp4".to_string());
                match field.bytes().await {
                    Ok(bytes) => video = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    let result = if let Some((filename, bytes)) = video {
        if filename.is_empty() {
            return error_response(StatusCode::BAD_REQUEST, "No selected file");
        }
        handlers::submit_upload(
            &state.registry,
            state.orchestrator.clone(),
            &state.config.output.uploads_dir,
            &filename,
            &bytes,
            target_language,
        )
        .await
    } else if let Some(url) = youtube_url {
        if url.trim().is_empty() {
            return error_response(StatusCode::BAD_REQUEST, "No video URL provided");
        }
        handlers::submit_url(
            &state.registry,
            state.orchestrator.clone(),
            url,
            target_language,
        )
        .await
    } else {
        return error_response(StatusCode::BAD_REQUEST, "No video file or URL provided");
    };

    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Poll a job's state. Polling is the only notification mechanism.
async fn status_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    match handlers::job_status(&state.registry, &id).await {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Unknown task id"),
    }
}

/// Retrieve a completed job's output video.
async fn download_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    match handlers::download(&state.config.output.output_dir, &id).await {
        Ok(Download::Ready(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "video/mp4".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{id}.mp4\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(Download::NotFound) => error_response(StatusCode::NOT_FOUND, "Video not found"),
        Ok(Download::Corrupted) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Video file is corrupted")
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
