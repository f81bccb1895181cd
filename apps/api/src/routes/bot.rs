use axum::{extract::State, Json};

use crate::bot::BotStatus;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/bot/start
pub async fn handle_bot_start(State(state): State<AppState>) -> Result<Json<BotStatus>, AppError> {
    Ok(Json(state.bot.start().await?))
}

/// POST /api/bot/stop
pub async fn handle_bot_stop(State(state): State<AppState>) -> Result<Json<BotStatus>, AppError> {
    Ok(Json(state.bot.stop().await?))
}

/// GET /api/bot/status
pub async fn handle_bot_status(State(state): State<AppState>) -> Json<BotStatus> {
    Json(state.bot.status().await)
}
