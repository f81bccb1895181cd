/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through this module.
///
/// Model: gemini-2.0-flash (hardcoded — do not make configurable to prevent drift)
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.0-flash";
const MAX_OUTPUT_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;
/// One extra attempt when the model answers with malformed JSON.
const JSON_PARSE_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Who authored a conversation turn, in Gemini's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Model,
}

/// One prior turn of a multi-turn conversation.
#[derive(Debug, Clone)]
pub struct LlmTurn<'a> {
    pub role: LlmRole,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    system_instruction: GeminiSystemInstruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: LlmRole,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the Gemini generateContent API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, GEMINI_API_BASE)
    }

    /// Points the client at another models endpoint, e.g. a local stand-in.
    pub fn with_base_url(api_key: String, base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Single-prompt call, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        self.call_conversation(
            &[LlmTurn {
                role: LlmRole::User,
                text: prompt,
            }],
            system,
        )
        .await
    }

    /// Multi-turn call. `turns` must end with a user turn.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call_conversation(
        &self,
        turns: &[LlmTurn<'_>],
        system: &str,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = GeminiRequest {
            contents: turns
                .iter()
                .map(|t| GeminiContent {
                    role: t.role,
                    parts: vec![GeminiPart { text: t.text }],
                })
                .collect(),
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart { text: system }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let url = format!("{}/{MODEL}:generateContent", self.base_url);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and returns trimmed response text.
    pub async fn call_text(&self, turns: &[LlmTurn<'_>], system: &str) -> Result<String, LlmError> {
        let response = self.call_conversation(turns, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(text.trim().to_string())
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    /// A response that fails to parse is asked for once more before giving up.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 1..=JSON_PARSE_ATTEMPTS {
            let response = self.call(prompt, system).await?;
            let parsed = response
                .text()
                .ok_or(LlmError::EmptyContent)
                .and_then(|text| parse_json_response(&text));

            match parsed {
                Ok(value) => return Ok(value),
                Err(e @ (LlmError::Parse(_) | LlmError::EmptyContent)) => {
                    warn!("LLM returned unusable JSON on attempt {attempt}: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}

/// Parses a model response as JSON after stripping markdown code fences.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_json_fences(text)).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Router};
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    /// Local stand-in for the Gemini endpoint that plays back canned replies
    /// and counts the requests it receives.
    #[derive(Clone, Default)]
    struct StubGemini {
        replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
        hits: Arc<AtomicUsize>,
    }

    impl StubGemini {
        fn with_replies(replies: Vec<(StatusCode, String)>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Self::default()
            }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        async fn serve(&self) -> LlmClient {
            let app = Router::new()
                .fallback(stub_reply)
                .with_state(self.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            LlmClient::with_base_url("test-key".to_string(), &format!("http://{addr}")).unwrap()
        }
    }

    async fn stub_reply(State(stub): State<StubGemini>) -> (StatusCode, String) {
        stub.hits.fetch_add(1, Ordering::SeqCst);
        stub.replies
            .lock()
            .pop_front()
            .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, String::new()))
    }

    fn candidate(text: &str) -> (StatusCode, String) {
        let body = json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] });
        (StatusCode::OK, body.to_string())
    }

    #[tokio::test]
    async fn test_call_json_asks_again_after_malformed_reply() {
        let stub = StubGemini::with_replies(vec![
            candidate("Sure! Here is the JSON you asked for"),
            candidate("```json\n{\"name\": \"Jane\"}\n```"),
        ]);
        let client = stub.serve().await;

        let value: serde_json::Value = client.call_json("extract", "sys").await.unwrap();
        assert_eq!(value["name"], "Jane");
        assert_eq!(stub.hits(), 2);
    }

    #[tokio::test]
    async fn test_call_json_gives_up_after_second_malformed_reply() {
        let stub = StubGemini::with_replies(vec![candidate("not json"), candidate("still not")]);
        let client = stub.serve().await;

        let result: Result<serde_json::Value, _> = client.call_json("extract", "sys").await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
        assert_eq!(stub.hits(), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let body = json!({ "error": { "message": "API key not valid" } }).to_string();
        let stub = StubGemini::with_replies(vec![(StatusCode::BAD_REQUEST, body)]);
        let client = stub.serve().await;

        let result = client.call("hello", "sys").await;
        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert_eq!(stub.hits(), 1);
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_json_response_reports_parse_error() {
        let result: Result<serde_json::Value, _> = parse_json_response("Sure! Here is the JSON:");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world"}], "role": "model"}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello, world"));
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 10);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: LlmResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_request_serializes_gemini_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: LlmRole::Model,
                parts: vec![GeminiPart { text: "hi" }],
            }],
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart { text: "sys" }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: 10,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "model");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 10);
    }
}
