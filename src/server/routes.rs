use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::app::AppState;
use crate::constants::{DEFAULT_AUDIO_FORMAT, MAX_AUDIO_UPLOAD_BYTES};

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route(
            "/transcribe",
            post(transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_UPLOAD_BYTES)),
        )
        .route("/sessions/:id", delete(clear_session))
        .with_state(state)
}

// ============ Health Check ============

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "has_openai_key": state.orchestrator.is_configured(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ============ Chat ============

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
    session_id: String,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let reply = state
        .orchestrator
        .handle_message(request.session_id, &request.message)
        .await?;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        session_id: reply.session_id,
    }))
}

// ============ Transcription ============

#[derive(Debug, Serialize)]
struct TranscribeResponse {
    text: String,
}

/// Extension of an uploaded file name, used as the audio format hint
fn audio_format(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string())
}

async fn transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let format = audio_format(field.file_name());
        let audio = field.bytes().await?;

        let text = state.transcription.transcribe(&audio, &format).await?;
        return Ok(Json(TranscribeResponse { text }));
    }

    Err(ApiError::BadRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

// ============ Session Management ============

async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let cleared = state.store().clear(&id);
    Json(serde_json::json!({ "cleared": cleared }))
}
