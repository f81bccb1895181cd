//! Extraction Client — every AI-backed operation the router needs.
//!
//! `AppState` holds an `Arc<dyn ResumeAssistant>`; `GeminiAssistant` is the
//! production backend and tests substitute their own.

pub mod prompts;

use async_trait::async_trait;
use tracing::info;

use crate::assistant::prompts::{
    CHAT_SYSTEM_TEMPLATE, EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM, INTERVIEW_PROMPT_TEMPLATE,
    INTERVIEW_SYSTEM,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmRole, LlmTurn};
use crate::models::{InterviewGuide, InterviewType, ResumeRecord};
use crate::session::{Role, Turn};

/// Most recent history turns replayed to the model on each chat message.
const MAX_HISTORY_TURNS: usize = 20;

#[async_trait]
pub trait ResumeAssistant: Send + Sync {
    /// Structured-field extraction from raw resume text.
    async fn analyze(&self, text: &str) -> Result<ResumeRecord, AppError>;

    /// One follow-up answer scoped to the resume and the conversation so far.
    async fn chat_turn(
        &self,
        resume: &ResumeRecord,
        history: &[Turn],
        message: &str,
    ) -> Result<String, AppError>;

    async fn interview_prep(
        &self,
        resume: &ResumeRecord,
        interview_type: InterviewType,
    ) -> Result<InterviewGuide, AppError>;
}

pub struct GeminiAssistant(pub LlmClient);

#[async_trait]
impl ResumeAssistant for GeminiAssistant {
    async fn analyze(&self, text: &str) -> Result<ResumeRecord, AppError> {
        let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{resume_text}", text);
        let system = format!("{EXTRACTION_SYSTEM} {JSON_ONLY_SYSTEM}");
        let record: ResumeRecord = self
            .0
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::AiService(format!("Resume extraction failed: {e}")))?;
        info!(
            "Resume extracted: {} experience entries, {} education entries",
            record.experience.len(),
            record.education.len()
        );
        Ok(record)
    }

    async fn chat_turn(
        &self,
        resume: &ResumeRecord,
        history: &[Turn],
        message: &str,
    ) -> Result<String, AppError> {
        let system = CHAT_SYSTEM_TEMPLATE
            .replace("{resume_json}", &resume_json(resume)?)
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION);

        let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
        let mut turns: Vec<LlmTurn<'_>> = history[skip..]
            .iter()
            .map(|t| LlmTurn {
                role: match t.role {
                    Role::User => LlmRole::User,
                    Role::Assistant => LlmRole::Model,
                },
                text: &t.text,
            })
            .collect();
        turns.push(LlmTurn {
            role: LlmRole::User,
            text: message,
        });

        self.0
            .call_text(&turns, &system)
            .await
            .map_err(|e| AppError::AiService(format!("Chat reply failed: {e}")))
    }

    async fn interview_prep(
        &self,
        resume: &ResumeRecord,
        interview_type: InterviewType,
    ) -> Result<InterviewGuide, AppError> {
        let prompt = INTERVIEW_PROMPT_TEMPLATE
            .replace("{interview_type}", interview_type.as_str())
            .replace("{interview_focus}", interview_type.description())
            .replace("{resume_json}", &resume_json(resume)?)
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION);
        let system = format!("{INTERVIEW_SYSTEM} {JSON_ONLY_SYSTEM}");

        self.0
            .call_json::<InterviewGuide>(&prompt, &system)
            .await
            .map_err(|e| AppError::AiService(format!("Interview preparation failed: {e}")))
    }
}

fn resume_json(resume: &ResumeRecord) -> Result<String, AppError> {
    serde_json::to_string_pretty(resume)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume: {e}")))
}
