use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::files::SUPPORTED_EXTENSIONS;
use crate::models::InterviewType;
use crate::state::AppState;

const MEGABYTE: usize = 1024 * 1024;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resumate",
        "ai_configured": !state.config.gemini_api_key.is_empty(),
        "bot_running": state.bot.status().await.running,
        "active_sessions": state.sessions.len(),
    }))
}

/// GET /api/config
/// Configuration status without any secret values.
pub async fn config_handler(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "ai_configured": !config.gemini_api_key.is_empty(),
        "bot_configured": config.bot_configured(),
        "bot_running": state.bot.status().await.running,
        "supported_extensions": SUPPORTED_EXTENSIONS,
        "interview_types": InterviewType::ALL,
        "web_max_upload_mb": config.web_max_upload_bytes / MEGABYTE,
        "bot_max_upload_mb": config.bot_max_upload_bytes / MEGABYTE,
    }))
}
