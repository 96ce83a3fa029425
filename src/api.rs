// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::audio::WAV_CONTENT_TYPE;
use crate::error::{ErrorKind, PipelineError};
use crate::metrics::Metrics;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Routes: `/health`, `/generate_podcast`, `/metrics` (when given), static player page as fallback.
pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let static_dir = state.pipeline.config().settings.server.static_dir.clone();

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/generate_podcast", get(generate_podcast))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
}

fn error_response(e: &PipelineError) -> Response {
    let body = ErrorBody {
        error: e.to_string(),
        kind: e.kind(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn generate_podcast(State(state): State<AppState>) -> Response {
    match state.pipeline.run().await {
        Ok(episode) => {
            let mut resp = (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, WAV_CONTENT_TYPE),
                    (header::CACHE_CONTROL, "no-store"),
                ],
                episode.wav.bytes,
            )
                .into_response();
            if let Ok(v) = HeaderValue::from_str(&episode.speech_model) {
                resp.headers_mut().insert("x-speech-model", v);
            }
            resp
        }
        Err(e) => error_response(&e),
    }
}
