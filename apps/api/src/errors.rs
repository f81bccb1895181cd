use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::files::FileError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`,
/// and `user_message()` so the bot can answer with the same taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("AI service error: {0}")]
    AiService(String),

    #[error("No resume has been analyzed for this session")]
    NoResume,

    #[error("File too large: limit is {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Text shown to an end user in a chat reply. Never leaks internals.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UnsupportedFormat(ext) => format!(
                "❌ Unsupported file format ({ext}).\n\nSupported formats: .pdf, .docx, .txt"
            ),
            AppError::Extraction(_) => {
                "❌ Could not extract text from the uploaded file.".to_string()
            }
            AppError::AiService(_) => {
                "❌ Sorry, the AI service failed to process your request. Please try again."
                    .to_string()
            }
            AppError::NoResume => "❌ No resume data found. Please upload and analyze a resume first.\n\nUpload a resume file to get started!".to_string(),
            AppError::PayloadTooLarge { limit_bytes } => format!(
                "❌ File too large. Please upload files smaller than {}MB.",
                limit_bytes / (1024 * 1024)
            ),
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Conflict(msg) => {
                format!("❌ {msg}")
            }
            AppError::Internal(_) => {
                "❌ An internal error occurred. Please try again later.".to_string()
            }
        }
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::TooLarge { limit_bytes, .. } => AppError::PayloadTooLarge { limit_bytes },
            FileError::UnsupportedFormat(ext) => AppError::UnsupportedFormat(ext),
            FileError::Extraction(msg) => AppError::Extraction(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UnsupportedFormat(ext) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FORMAT",
                format!("File type not supported: {ext}"),
            ),
            AppError::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                format!("Failed to extract text from file: {msg}"),
            ),
            AppError::AiService(msg) => {
                tracing::error!("AI service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AI_SERVICE_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::NoResume => (
                StatusCode::BAD_REQUEST,
                "NO_RESUME",
                "No resume session found. Please upload a resume first.".to_string(),
            ),
            AppError::PayloadTooLarge { limit_bytes } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!(
                    "File too large. Maximum size is {}MB.",
                    limit_bytes / (1024 * 1024)
                ),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_resume_maps_to_bad_request() {
        let response = AppError::NoResume.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_ai_service_maps_to_bad_gateway() {
        let response = AppError::AiService("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_file_error_conversion() {
        let err: AppError = FileError::TooLarge {
            size_bytes: 30,
            limit_bytes: 20,
        }
        .into();
        assert!(matches!(err, AppError::PayloadTooLarge { limit_bytes: 20 }));

        let err: AppError = FileError::UnsupportedFormat("exe".to_string()).into();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_user_message_for_payload_is_in_megabytes() {
        let err = AppError::PayloadTooLarge {
            limit_bytes: 20 * 1024 * 1024,
        };
        assert!(err.user_message().contains("20MB"));
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let err = AppError::Internal(anyhow::anyhow!("secret stack detail"));
        assert!(!err.user_message().contains("secret"));
    }
}
