//! Interaction Router — the idle / chat / interview state machine.
//!
//! Both frontends drive sessions through here. The HTTP handlers call the
//! typed operations (`upload`, `chat`, `interview_prep`, ...) and render the
//! result themselves; the bot turns every inbound message into an [`Event`]
//! and sends back whatever [`Reply`] list `handle` produces.
//!
//! The session lock is never held across an AI call: each operation takes a
//! snapshot, awaits the assistant, then commits in a second short update.

pub mod messages;

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::assistant::ResumeAssistant;
use crate::errors::AppError;
use crate::files;
use crate::models::{InterviewGuide, InterviewType, ResumeRecord};
use crate::render;
use crate::session::{Mode, SessionKey, SessionStore, Turn};

/// One inbound chat-frontend event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    Help,
    About,
    Chat,
    /// `/interview` with an optional type argument.
    Interview(Option<InterviewType>),
    Stop,
    Convert,
    Json { interview: bool },
    Reset,
    Unknown(String),
    Upload { file_name: String, bytes: Bytes },
    Text(String),
}

impl Event {
    /// Classifies a text message. `/cmd@BotName args` is accepted as `/cmd args`.
    pub fn from_text(text: &str) -> Event {
        let trimmed = text.trim();
        let Some(command_line) = trimmed.strip_prefix('/') else {
            return Event::Text(trimmed.to_string());
        };

        let mut parts = command_line.split_whitespace();
        let command = parts
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let argument = parts.next();

        match command.as_str() {
            "start" => Event::Start,
            "help" => Event::Help,
            "about" => Event::About,
            "chat" => Event::Chat,
            "interview" => Event::Interview(argument.and_then(|a| a.parse().ok())),
            "stop" => Event::Stop,
            "convert" => Event::Convert,
            "json" => Event::Json {
                interview: argument.is_some_and(|a| a.eq_ignore_ascii_case("interview")),
            },
            "reset" => Event::Reset,
            _ => Event::Unknown(command),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Document {
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub record: ResumeRecord,
    /// `/convert` was pending; the caller should also deliver a PDF.
    pub convert_requested: bool,
}

#[derive(Clone)]
pub struct InteractionRouter {
    sessions: Arc<SessionStore>,
    assistant: Arc<dyn ResumeAssistant>,
    /// Ceiling applied to uploads arriving through `handle`.
    chat_upload_limit: usize,
}

impl InteractionRouter {
    pub fn new(
        sessions: Arc<SessionStore>,
        assistant: Arc<dyn ResumeAssistant>,
        chat_upload_limit: usize,
    ) -> Self {
        InteractionRouter {
            sessions,
            assistant,
            chat_upload_limit,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn chat_upload_limit(&self) -> usize {
        self.chat_upload_limit
    }

    /// Any mode → idle with a freshly extracted resume.
    ///
    /// A failure anywhere leaves the session exactly as it was.
    pub async fn upload(
        &self,
        key: &SessionKey,
        file_name: &str,
        bytes: Bytes,
        max_bytes: usize,
    ) -> Result<UploadOutcome, AppError> {
        let extension = files::extension_of(file_name).unwrap_or_default();
        let text = files::extract_text(bytes, &extension, max_bytes).await?;
        let record = self.assistant.analyze(&text).await?;

        let convert_requested = self.sessions.update(key, |session| {
            session.replace_resume(record.clone(), Some(file_name.to_string()));
            std::mem::take(&mut session.convert_pending)
        });
        info!("Session {key}: analyzed {file_name}");

        Ok(UploadOutcome {
            record,
            convert_requested,
        })
    }

    pub fn enter_chat(&self, key: &SessionKey) -> Result<(), AppError> {
        self.sessions.update(key, |session| session.enter_chat())
    }

    /// Chat-mode free text. History grows by one user and one assistant turn
    /// only when the assistant answers.
    pub async fn chat(&self, key: &SessionKey, message: &str) -> Result<String, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }

        let snapshot = self.sessions.get_or_create(key);
        let resume = snapshot.resume()?.clone();
        if snapshot.mode != Mode::Chat {
            return Err(AppError::Validation(
                "Chat mode is not active. Use /chat first.".to_string(),
            ));
        }

        let answer = self
            .assistant
            .chat_turn(&resume, &snapshot.history, message)
            .await?;

        // A concurrent upload or /stop wins over this exchange.
        let committed = self.sessions.update(key, |session| {
            let still_current =
                session.mode == Mode::Chat && session.resume_data.as_ref() == Some(&resume);
            if still_current {
                session.record_exchange(message, &answer);
            }
            still_current
        });
        if !committed {
            warn!("Session {key}: chat reply dropped, session changed while waiting");
        }
        Ok(answer)
    }

    /// Enters interview mode without generating anything yet.
    pub fn enter_interview(&self, key: &SessionKey) -> Result<(), AppError> {
        self.sessions.update(key, |session| session.enter_interview())
    }

    /// Enters interview mode (if not already there) and generates a guide.
    pub async fn interview_prep(
        &self,
        key: &SessionKey,
        interview_type: InterviewType,
    ) -> Result<InterviewGuide, AppError> {
        let resume = self
            .sessions
            .update(key, |session| -> Result<ResumeRecord, AppError> {
                session.enter_interview()?;
                session.resume().cloned()
            })?;

        info!("Session {key}: generating {interview_type} interview guide");
        let guide = self.assistant.interview_prep(&resume, interview_type).await?;

        self.sessions.update(key, |session| {
            if session.resume_data.as_ref() == Some(&resume) {
                session.last_guide = Some(guide.clone());
            }
        });
        Ok(guide)
    }

    /// Returns the mode that was left.
    pub fn stop(&self, key: &SessionKey) -> Mode {
        self.sessions.update(key, |session| session.stop())
    }

    pub fn request_conversion(&self, key: &SessionKey) {
        self.sessions
            .update(key, |session| session.convert_pending = true);
    }

    pub async fn export_pdf(&self, key: &SessionKey) -> Result<Vec<u8>, AppError> {
        let resume = self
            .sessions
            .get(key)
            .ok_or(AppError::NoResume)?
            .resume()?
            .clone();
        render_pdf_blocking(resume).await
    }

    pub fn reset(&self, key: &SessionKey) -> bool {
        self.sessions.delete(key)
    }

    pub fn history(&self, key: &SessionKey) -> Vec<Turn> {
        self.sessions
            .get(key)
            .map(|session| session.history)
            .unwrap_or_default()
    }

    /// Chat-frontend entry point. Errors become user-facing text replies.
    pub async fn handle(&self, key: &SessionKey, event: Event) -> Vec<Reply> {
        match self.dispatch(key, event).await {
            Ok(replies) => replies,
            Err(err) => {
                match &err {
                    AppError::Internal(_) | AppError::AiService(_) => warn!("Session {key}: {err}"),
                    _ => info!("Session {key}: {err}"),
                }
                vec![Reply::Text(err.user_message())]
            }
        }
    }

    async fn dispatch(&self, key: &SessionKey, event: Event) -> Result<Vec<Reply>, AppError> {
        match event {
            Event::Start => Ok(vec![Reply::text(messages::WELCOME)]),
            Event::Help => Ok(vec![Reply::text(messages::HELP.replace(
                "{limit_mb}",
                &(self.chat_upload_limit / (1024 * 1024)).to_string(),
            ))]),
            Event::About => Ok(vec![Reply::text(
                messages::ABOUT.replace("{version}", env!("CARGO_PKG_VERSION")),
            )]),
            Event::Chat => {
                self.enter_chat(key)?;
                Ok(vec![Reply::text(messages::CHAT_ENABLED)])
            }
            Event::Interview(None) => {
                self.enter_interview(key)?;
                Ok(vec![Reply::text(messages::INTERVIEW_MENU)])
            }
            Event::Interview(Some(interview_type)) => self.guide_replies(key, interview_type).await,
            Event::Stop => {
                let text = match self.stop(key) {
                    Mode::Chat => messages::CHAT_STOPPED,
                    Mode::Interview => messages::INTERVIEW_STOPPED,
                    Mode::Idle => messages::NOTHING_TO_STOP,
                };
                Ok(vec![Reply::text(text)])
            }
            Event::Convert => {
                self.request_conversion(key);
                Ok(vec![Reply::text(messages::CONVERT_PROMPT)])
            }
            Event::Json { interview } => self.json_export(key, interview),
            Event::Reset => {
                self.reset(key);
                Ok(vec![Reply::text(messages::RESET_DONE)])
            }
            Event::Unknown(_) => Ok(vec![Reply::text(messages::UNKNOWN_COMMAND)]),
            Event::Upload { file_name, bytes } => {
                self.upload_replies(key, &file_name, bytes).await
            }
            Event::Text(text) => self.text_replies(key, &text).await,
        }
    }

    async fn upload_replies(
        &self,
        key: &SessionKey,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<Vec<Reply>, AppError> {
        let outcome = self
            .upload(key, file_name, bytes, self.chat_upload_limit)
            .await?;

        let mut replies = vec![
            Reply::Text(render::format_resume(&outcome.record)),
            Reply::text(messages::ANALYSIS_COMPLETE),
        ];
        if outcome.convert_requested {
            let pdf = render_pdf_blocking(outcome.record).await?;
            replies.push(Reply::Document {
                file_name: pdf_file_name(file_name),
                bytes: pdf,
                caption: Some(messages::CONVERTED.to_string()),
            });
        }
        Ok(replies)
    }

    async fn text_replies(&self, key: &SessionKey, text: &str) -> Result<Vec<Reply>, AppError> {
        let mode = self.sessions.get(key).map(|s| s.mode).unwrap_or_default();
        match mode {
            Mode::Idle => Ok(vec![Reply::text(messages::UPLOAD_PROMPT)]),
            Mode::Chat => {
                let answer = format!("🤖 {}", self.chat(key, text).await?);
                Ok(vec![Reply::text(render::truncate_chars(
                    &answer,
                    render::MESSAGE_LIMIT,
                ))])
            }
            Mode::Interview => match text.parse::<InterviewType>() {
                Ok(interview_type) => self.guide_replies(key, interview_type).await,
                Err(_) => Ok(vec![Reply::text(messages::INTERVIEW_TYPE_HINT)]),
            },
        }
    }

    async fn guide_replies(
        &self,
        key: &SessionKey,
        interview_type: InterviewType,
    ) -> Result<Vec<Reply>, AppError> {
        let guide = self.interview_prep(key, interview_type).await?;
        Ok(vec![
            Reply::Text(render::format_interview_guide(&guide)),
            Reply::text(messages::INTERVIEW_FOLLOW_UP),
        ])
    }

    fn json_export(&self, key: &SessionKey, interview: bool) -> Result<Vec<Reply>, AppError> {
        let session = self.sessions.get(key).ok_or(AppError::NoResume)?;
        let (json, file_name) = if interview {
            session.resume()?;
            let guide = session
                .last_guide
                .as_ref()
                .ok_or_else(|| AppError::NotFound(messages::NO_INTERVIEW_GUIDE.to_string()))?;
            (render::to_pretty_json(guide), "interview_prep.json")
        } else {
            (render::to_pretty_json(session.resume()?), "resume_data.json")
        };

        if json.chars().count() <= render::MESSAGE_LIMIT {
            Ok(vec![Reply::Text(json)])
        } else {
            Ok(vec![Reply::Document {
                file_name: file_name.to_string(),
                bytes: json.into_bytes(),
                caption: None,
            }])
        }
    }
}

async fn render_pdf_blocking(resume: ResumeRecord) -> Result<Vec<u8>, AppError> {
    let pdf = tokio::task::spawn_blocking(move || render::render_pdf(&resume))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF task failed: {e}")))??;
    Ok(pdf)
}

/// `cv.docx` → `cv.pdf`.
fn pdf_file_name(source: &str) -> String {
    let stem = std::path::Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("resume");
    format!("{stem}.pdf")
}
