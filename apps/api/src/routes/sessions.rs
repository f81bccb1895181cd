use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::session::{Session, SessionKey, SessionSummary};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionListResponse {
    pub count: usize,
    pub sessions: Vec<SessionSummary>,
}

/// GET /api/session/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    SessionKey::parse_web(&id)
        .and_then(|key| state.sessions.get(&key))
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// DELETE /api/session/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let key = SessionKey::parse_web(&id).ok_or_else(|| not_found(&id))?;
    if !state.router.reset(&key) {
        return Err(not_found(&id));
    }
    Ok(Json(json!({ "session_id": key, "deleted": true })))
}

/// GET /api/sessions
///
/// Lists web sessions only; bot chats stay private to the bot.
pub async fn handle_list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions: Vec<SessionSummary> = state
        .sessions
        .list()
        .into_iter()
        .filter(|summary| !summary.session_id.is_telegram())
        .collect();
    Json(SessionListResponse {
        count: sessions.len(),
        sessions,
    })
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
