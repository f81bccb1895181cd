//! Telegram frontend: a long-polling teloxide dispatcher behind a supervisor
//! that the HTTP API can start, stop and inspect.

mod handler;

use chrono::{DateTime, Utc};
use serde::Serialize;
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::interaction::InteractionRouter;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BotStatus {
    pub configured: bool,
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
}

struct RunningBot {
    shutdown: ShutdownToken,
    handle: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// Owns at most one dispatcher. Start and stop are serialised by the mutex,
/// which is held across the graceful-shutdown wait.
pub struct BotSupervisor {
    token: Option<String>,
    router: InteractionRouter,
    running: Mutex<Option<RunningBot>>,
}

impl BotSupervisor {
    pub fn new(token: Option<String>, router: InteractionRouter) -> Self {
        BotSupervisor {
            token,
            router,
            running: Mutex::new(None),
        }
    }

    pub fn configured(&self) -> bool {
        self.token.is_some()
    }

    pub async fn start(&self) -> Result<BotStatus, AppError> {
        let token = self.token.clone().ok_or_else(|| {
            AppError::Validation("TELEGRAM_BOT_TOKEN is not configured".to_string())
        })?;

        let mut running = self.running.lock().await;
        if let Some(bot) = running.as_ref() {
            if !bot.handle.is_finished() {
                return Err(AppError::Conflict("Bot is already running".to_string()));
            }
        }

        let bot = Bot::new(token);
        let mut dispatcher = Dispatcher::builder(
            bot,
            Update::filter_message().endpoint(handler::handle_message),
        )
        .dependencies(dptree::deps![self.router.clone()])
        .default_handler(|update| async move {
            debug!("Unhandled update {:?}", update.id);
        })
        .build();

        let shutdown = dispatcher.shutdown_token();
        let handle = tokio::spawn(async move {
            dispatcher.dispatch().await;
        });
        let started_at = Utc::now();
        *running = Some(RunningBot {
            shutdown,
            handle,
            started_at,
        });
        info!("Telegram bot started");

        Ok(BotStatus {
            configured: true,
            running: true,
            started_at: Some(started_at),
        })
    }

    /// Lets in-flight updates finish, then joins the dispatcher task.
    pub async fn stop(&self) -> Result<BotStatus, AppError> {
        let mut running = self.running.lock().await;
        let bot = running
            .take()
            .ok_or_else(|| AppError::Conflict("Bot is not running".to_string()))?;

        match bot.shutdown.shutdown() {
            Ok(wait) => wait.await,
            Err(_) => {
                // Dispatcher never got as far as polling.
                debug!("Bot dispatcher idle at shutdown, aborting task");
                bot.handle.abort();
            }
        }
        if let Err(e) = bot.handle.await {
            if !e.is_cancelled() {
                warn!("Bot task ended abnormally: {e}");
            }
        }
        info!("Telegram bot stopped");

        Ok(BotStatus {
            configured: self.configured(),
            running: false,
            started_at: None,
        })
    }

    pub async fn status(&self) -> BotStatus {
        let running = self.running.lock().await;
        let live = running.as_ref().filter(|bot| !bot.handle.is_finished());
        BotStatus {
            configured: self.configured(),
            running: live.is_some(),
            started_at: live.map(|bot| bot.started_at),
        }
    }

    /// Process shutdown: stops the bot if it is running, otherwise does nothing.
    pub async fn shutdown(&self) {
        if self.status().await.running {
            if let Err(e) = self.stop().await {
                warn!("Bot shutdown failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::tests::router;

    #[tokio::test]
    async fn test_unconfigured_bot_cannot_start() {
        let supervisor = BotSupervisor::new(None, router());
        assert!(matches!(
            supervisor.start().await,
            Err(AppError::Validation(_))
        ));
        let status = supervisor.status().await;
        assert!(!status.configured);
        assert!(!status.running);
    }

    #[tokio::test]
    async fn test_stop_when_not_running_is_conflict() {
        let supervisor = BotSupervisor::new(Some("123:abc".to_string()), router());
        assert!(supervisor.configured());
        assert!(matches!(
            supervisor.stop().await,
            Err(AppError::Conflict(_))
        ));
        supervisor.shutdown().await;
        assert!(!supervisor.status().await.running);
    }
}
