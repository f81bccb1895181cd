use std::sync::Arc;

use crate::assistant::ResumeAssistant;
use crate::bot::BotSupervisor;
use crate::config::Config;
use crate::interaction::InteractionRouter;
use crate::session::{SessionLimits, SessionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    pub router: InteractionRouter,
    /// The Telegram frontend shares `router` (and so the session store) with HTTP.
    pub bot: Arc<BotSupervisor>,
}

impl AppState {
    pub fn new(config: Config, assistant: Arc<dyn ResumeAssistant>) -> Self {
        let sessions = Arc::new(SessionStore::new(SessionLimits {
            idle_ttl: config.session_idle_ttl,
            max_sessions: config.max_sessions,
        }));
        let router = InteractionRouter::new(
            sessions.clone(),
            assistant,
            config.bot_max_upload_bytes,
        );
        let bot = Arc::new(BotSupervisor::new(
            config.telegram_bot_token.clone(),
            router.clone(),
        ));
        AppState {
            config,
            sessions,
            router,
            bot,
        }
    }
}
