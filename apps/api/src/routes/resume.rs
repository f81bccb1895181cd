use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{InterviewGuide, InterviewType, ResumeRecord};
use crate::render;
use crate::session::{Mode, SessionKey, Turn};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub session_id: SessionKey,
    pub filename: String,
    pub resume_data: ResumeRecord,
    pub formatted: String,
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub chat_history: Vec<Turn>,
    pub mode: Mode,
}

#[derive(Serialize)]
pub struct StopResponse {
    pub session_id: SessionKey,
    pub previous_mode: Mode,
    pub mode: Mode,
}

#[derive(Deserialize)]
pub struct InterviewPrepRequest {
    pub session_id: String,
    pub interview_type: Option<String>,
}

#[derive(Serialize)]
pub struct InterviewPrepResponse {
    pub session_id: SessionKey,
    pub interview_type: InterviewType,
    pub interview_prep: String,
    pub guide: InterviewGuide,
}

/// Action endpoints never create sessions: an unknown id means nothing was uploaded.
/// Only web (UUID) ids resolve here; bot sessions are not reachable over HTTP.
fn known_session(state: &AppState, session_id: &str) -> Result<SessionKey, AppError> {
    SessionKey::parse_web(session_id)
        .filter(|key| state.sessions.contains(key))
        .ok_or(AppError::NoResume)
}

fn multipart_error(err: MultipartError, limit_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit_bytes }
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// POST /api/upload
/// Multipart form: `file` (required), `session_id` (optional, reuses a web session).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let limit = state.config.web_max_upload_bytes;
    let mut file: Option<(String, Bytes)> = None;
    let mut session_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                file = Some((file_name, data));
            }
            Some("session_id") => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                session_id = Some(text.trim().to_string()).filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    if file_name.trim().is_empty() {
        return Err(AppError::Validation("No file selected".to_string()));
    }

    let key = match session_id {
        Some(id) => SessionKey::web(
            Uuid::parse_str(&id)
                .map_err(|_| AppError::Validation(format!("Invalid session_id: {id}")))?,
        ),
        None => SessionKey::new_web(),
    };

    let outcome = state.router.upload(&key, &file_name, data, limit).await?;
    let formatted = render::format_resume(&outcome.record);
    Ok(Json(UploadResponse {
        session_id: key,
        filename: file_name,
        resume_data: outcome.record,
        formatted,
    }))
}

/// POST /api/chat
/// Enters chat mode on first use, so web clients need no separate `/chat` step.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let key = known_session(&state, &req.session_id)?;
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("No message provided".to_string()));
    }

    let in_chat = state
        .sessions
        .get(&key)
        .is_some_and(|session| session.mode == Mode::Chat);
    if !in_chat {
        state.router.enter_chat(&key)?;
    }

    let response = state.router.chat(&key, &req.message).await?;
    Ok(Json(ChatResponse {
        response,
        chat_history: state.router.history(&key),
        mode: Mode::Chat,
    }))
}

/// POST /api/stop
pub async fn handle_stop(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<StopResponse>, AppError> {
    let key = SessionKey::parse_web(&req.session_id)
        .filter(|key| state.sessions.contains(key))
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", req.session_id.trim())))?;
    let previous_mode = state.router.stop(&key);
    Ok(Json(StopResponse {
        session_id: key,
        previous_mode,
        mode: Mode::Idle,
    }))
}

/// POST /api/interview-prep
pub async fn handle_interview_prep(
    State(state): State<AppState>,
    Json(req): Json<InterviewPrepRequest>,
) -> Result<Json<InterviewPrepResponse>, AppError> {
    let key = known_session(&state, &req.session_id)?;
    let interview_type = match req.interview_type.as_deref() {
        None | Some("") => InterviewType::default(),
        Some(raw) => raw.parse::<InterviewType>().map_err(AppError::Validation)?,
    };

    let guide = state.router.interview_prep(&key, interview_type).await?;
    Ok(Json(InterviewPrepResponse {
        session_id: key,
        interview_type,
        interview_prep: render::format_interview_guide(&guide),
        guide,
    }))
}

/// POST /api/export-pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let key = known_session(&state, &req.session_id)?;
    let pdf = state.router.export_pdf(&key).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"resume.pdf\"",
            ),
        ],
        pdf,
    ))
}
