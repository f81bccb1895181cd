//! Output Renderer — chat-sized text, JSON export and PDF generation.

pub mod pdf;
pub mod text;

pub use pdf::render_pdf;
pub use text::{format_interview_guide, format_resume, to_pretty_json, truncate_chars, MESSAGE_LIMIT};
