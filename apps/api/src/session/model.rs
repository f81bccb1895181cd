use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{InterviewGuide, ResumeRecord};

/// Stored chat turns per session; older exchanges are dropped first.
pub const MAX_STORED_TURNS: usize = 40;

const TELEGRAM_PREFIX: &str = "tg:";

/// Opaque session identifier: `tg:<chat id>` for the bot, a UUID for the web.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn telegram(chat_id: i64) -> Self {
        SessionKey(format!("{TELEGRAM_PREFIX}{chat_id}"))
    }

    /// Parses a client-supplied web session id. Only UUIDs are accepted, so
    /// the HTTP API can never address a bot session.
    pub fn parse_web(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self::web)
    }

    pub fn web(id: Uuid) -> Self {
        SessionKey(id.to_string())
    }

    pub fn new_web() -> Self {
        Self::web(Uuid::new_v4())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_telegram(&self) -> bool {
        self.0.starts_with(TELEGRAM_PREFIX)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(raw: &str) -> Self {
        SessionKey(raw.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Idle,
    Chat,
    Interview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Per-user interaction state. Only the session store hands these out, and
/// only the interaction router mutates them.
///
/// Invariant: `mode` is `Chat` or `Interview` only while `resume_data` is set.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub key: SessionKey,
    pub mode: Mode,
    pub resume_data: Option<ResumeRecord>,
    pub history: Vec<Turn>,
    pub source_file: Option<String>,
    pub last_guide: Option<InterviewGuide>,
    /// Set by `/convert`: the next upload is answered with a PDF.
    pub convert_pending: bool,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Session {
            key,
            mode: Mode::Idle,
            resume_data: None,
            history: Vec::new(),
            source_file: None,
            last_guide: None,
            convert_pending: false,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    pub fn resume(&self) -> Result<&ResumeRecord, AppError> {
        self.resume_data.as_ref().ok_or(AppError::NoResume)
    }

    /// Any mode → idle with the record replaced wholesale. Nothing derived from
    /// the previous resume survives.
    pub fn replace_resume(&mut self, record: ResumeRecord, source_file: Option<String>) {
        self.resume_data = Some(record);
        self.source_file = source_file;
        self.mode = Mode::Idle;
        self.history.clear();
        self.last_guide = None;
    }

    pub fn enter_chat(&mut self) -> Result<(), AppError> {
        self.resume()?;
        self.mode = Mode::Chat;
        Ok(())
    }

    /// Leaving chat for interview drops the conversation, as `/stop` would.
    pub fn enter_interview(&mut self) -> Result<(), AppError> {
        self.resume()?;
        if self.mode == Mode::Chat {
            self.history.clear();
        }
        self.mode = Mode::Interview;
        Ok(())
    }

    /// Returns the mode that was left.
    pub fn stop(&mut self) -> Mode {
        let previous = self.mode;
        if previous == Mode::Chat {
            self.history.clear();
        }
        self.mode = Mode::Idle;
        previous
    }

    /// Appends a completed exchange. Both turns or neither.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.history.push(Turn::user(question));
        self.history.push(Turn::assistant(answer));
        let overflow = self.history.len().saturating_sub(MAX_STORED_TURNS);
        self.history.drain(..overflow);
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.key.clone(),
            mode: self.mode,
            filename: self.source_file.clone(),
            name: self
                .resume_data
                .as_ref()
                .map(|r| r.display_name().to_string()),
            chat_count: self.history.len() / 2,
            last_active_at: self.last_active_at,
        }
    }
}

/// Listing view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionKey,
    pub mode: Mode,
    pub filename: Option<String>,
    pub name: Option<String>,
    pub chat_count: usize,
    pub last_active_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_resume() -> Session {
        let mut session = Session::new(SessionKey::from("s1"));
        session.replace_resume(ResumeRecord::default(), Some("resume.txt".to_string()));
        session
    }

    #[test]
    fn test_chat_requires_resume() {
        let mut session = Session::new(SessionKey::from("s1"));
        assert!(matches!(session.enter_chat(), Err(AppError::NoResume)));
        assert_eq!(session.mode, Mode::Idle);
    }

    #[test]
    fn test_interview_requires_resume() {
        let mut session = Session::new(SessionKey::from("s1"));
        assert!(matches!(session.enter_interview(), Err(AppError::NoResume)));
        assert_eq!(session.mode, Mode::Idle);
    }

    #[test]
    fn test_stop_from_chat_clears_history_keeps_resume() {
        let mut session = session_with_resume();
        session.enter_chat().unwrap();
        session.record_exchange("What skills?", "Rust.");
        assert_eq!(session.stop(), Mode::Chat);
        assert_eq!(session.mode, Mode::Idle);
        assert!(session.history.is_empty());
        assert!(session.resume_data.is_some());
    }

    #[test]
    fn test_stop_from_interview_returns_idle() {
        let mut session = session_with_resume();
        session.enter_interview().unwrap();
        assert_eq!(session.stop(), Mode::Interview);
        assert_eq!(session.mode, Mode::Idle);
        assert!(session.resume_data.is_some());
    }

    #[test]
    fn test_replace_resume_resets_mode_and_derived_state() {
        let mut session = session_with_resume();
        session.enter_chat().unwrap();
        session.record_exchange("q", "a");
        session.last_guide = Some(InterviewGuide::default());

        let mut replacement = ResumeRecord::default();
        replacement.personal_info.name = Some("New Person".to_string());
        session.replace_resume(replacement.clone(), Some("new.pdf".to_string()));

        assert_eq!(session.mode, Mode::Idle);
        assert_eq!(session.resume_data, Some(replacement));
        assert!(session.history.is_empty());
        assert!(session.last_guide.is_none());
        assert_eq!(session.source_file.as_deref(), Some("new.pdf"));
    }

    #[test]
    fn test_switch_chat_to_interview_drops_history() {
        let mut session = session_with_resume();
        session.enter_chat().unwrap();
        session.record_exchange("q", "a");
        session.enter_interview().unwrap();
        assert_eq!(session.mode, Mode::Interview);
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_summary_counts_exchanges() {
        let mut session = session_with_resume();
        session.record_exchange("q1", "a1");
        session.record_exchange("q2", "a2");
        let summary = session.summary();
        assert_eq!(summary.chat_count, 2);
        assert_eq!(summary.name.as_deref(), Some("Unknown"));
        assert_eq!(summary.filename.as_deref(), Some("resume.txt"));
    }

    #[test]
    fn test_session_key_formats() {
        assert_eq!(SessionKey::telegram(42).as_str(), "tg:42");
        assert!(SessionKey::telegram(42).is_telegram());
        let id = Uuid::new_v4();
        assert_eq!(SessionKey::web(id).to_string(), id.to_string());
        assert!(!SessionKey::web(id).is_telegram());
    }

    #[test]
    fn test_parse_web_accepts_only_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(
            SessionKey::parse_web(&id.to_string().to_uppercase()),
            Some(SessionKey::web(id))
        );
        assert_eq!(SessionKey::parse_web("tg:7"), None);
        assert_eq!(SessionKey::parse_web("unknown"), None);
        assert_eq!(SessionKey::parse_web(""), None);
    }

    #[test]
    fn test_history_keeps_most_recent_turns() {
        let mut session = session_with_resume();
        for i in 0..30 {
            session.record_exchange(&format!("q{i}"), &format!("a{i}"));
        }
        assert_eq!(session.history.len(), MAX_STORED_TURNS);
        assert_eq!(session.history[0].text, "q10");
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history.last().unwrap().text, "a29");
    }
}
