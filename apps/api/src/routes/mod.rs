pub mod bot;
pub mod health;
pub mod resume;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.web_max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/config", get(health::config_handler))
        // Resume workflow
        .route("/api/upload", post(resume::handle_upload))
        .route("/api/chat", post(resume::handle_chat))
        .route("/api/stop", post(resume::handle_stop))
        .route("/api/interview-prep", post(resume::handle_interview_prep))
        .route("/api/export-pdf", post(resume::handle_export_pdf))
        // Sessions
        .route(
            "/api/session/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route("/api/sessions", get(sessions::handle_list_sessions))
        // Telegram bot lifecycle
        .route("/api/bot/start", post(bot::handle_bot_start))
        .route("/api/bot/stop", post(bot::handle_bot_stop))
        .route("/api/bot/status", get(bot::handle_bot_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
