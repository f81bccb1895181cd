//! File Adapter — turns an uploaded resume file into plain text.
//!
//! Uploads are staged into a `NamedTempFile` which is removed when it drops,
//! so the on-disk copy never outlives the extraction call whatever its outcome.
//! Parsing is CPU-bound and runs inside `tokio::task::spawn_blocking`.

mod docx;

use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Extensions the adapter can turn into text.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

/// The decompressed DOCX body may be at most this many times the upload ceiling.
const DOCX_EXPANSION_FACTOR: usize = 8;

/// Recognised but rejected: there is no OCR backend.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file is {size_bytes} bytes, limit is {limit_bytes}")]
    TooLarge {
        size_bytes: usize,
        limit_bytes: usize,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Extraction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    /// Accepts `pdf`, `.PDF`, `Docx`, ...
    pub fn from_extension(extension: &str) -> Result<Self, FileError> {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            "txt" => Ok(FileKind::Txt),
            e if IMAGE_EXTENSIONS.contains(&e) => Err(FileError::Extraction(
                "OCR text extraction from images is not supported. Please upload PDF, DOCX, or TXT files.".to_string(),
            )),
            "" => Err(FileError::UnsupportedFormat("(none)".to_string())),
            other => Err(FileError::UnsupportedFormat(other.to_string())),
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            FileKind::Pdf => ".pdf",
            FileKind::Docx => ".docx",
            FileKind::Txt => ".txt",
        }
    }
}

/// Lower-cased extension of a file name, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Extracts plain text from `bytes`, dispatching on `declared_extension`.
///
/// The size ceiling and the extension are checked before anything touches disk.
pub async fn extract_text(
    bytes: Bytes,
    declared_extension: &str,
    max_bytes: usize,
) -> Result<String, FileError> {
    if bytes.len() > max_bytes {
        return Err(FileError::TooLarge {
            size_bytes: bytes.len(),
            limit_bytes: max_bytes,
        });
    }
    let kind = FileKind::from_extension(declared_extension)?;

    let raw = tokio::task::spawn_blocking(move || extract_blocking(kind, &bytes, max_bytes))
        .await
        .map_err(|e| FileError::Extraction(format!("extraction task failed: {e}")))??;

    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return Err(FileError::Extraction(
            "the file contains no extractable text".to_string(),
        ));
    }

    info!(
        "Extracted {} characters from {:?} upload",
        text.chars().count(),
        kind
    );
    Ok(text)
}

fn extract_blocking(kind: FileKind, bytes: &[u8], max_bytes: usize) -> Result<String, FileError> {
    let staged = stage(bytes, kind)?;
    debug!("Staged upload at {}", staged.path().display());

    match kind {
        FileKind::Txt => read_text(staged.path()),
        FileKind::Docx => docx::extract_text(
            staged.path(),
            max_bytes.saturating_mul(DOCX_EXPANSION_FACTOR),
        ),
        FileKind::Pdf => pdf_extract::extract_text(staged.path())
            .map_err(|e| FileError::Extraction(format!("failed to read PDF: {e}"))),
    }
    // `staged` drops here and the temp file is deleted
}

fn stage(bytes: &[u8], kind: FileKind) -> Result<NamedTempFile, FileError> {
    let mut staged = tempfile::Builder::new()
        .prefix("resumate-upload-")
        .suffix(kind.suffix())
        .tempfile()
        .map_err(|e| FileError::Extraction(format!("failed to stage upload: {e}")))?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.flush())
        .map_err(|e| FileError::Extraction(format!("failed to stage upload: {e}")))?;
    Ok(staged)
}

fn read_text(path: &Path) -> Result<String, FileError> {
    let bytes = std::fs::read(path)
        .map_err(|e| FileError::Extraction(format!("failed to read text file: {e}")))?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|_| FileError::Extraction("text file is not valid UTF-8".to_string()))
}

/// Trims trailing whitespace per line and collapses runs of blank lines.
fn normalize_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_accepts_dot_and_case() {
        assert_eq!(FileKind::from_extension(".PDF").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_extension("Docx").unwrap(), FileKind::Docx);
        assert_eq!(FileKind::from_extension("txt").unwrap(), FileKind::Txt);
    }

    #[test]
    fn test_from_extension_rejects_unknown() {
        assert!(matches!(
            FileKind::from_extension("exe"),
            Err(FileError::UnsupportedFormat(ext)) if ext == "exe"
        ));
        assert!(matches!(
            FileKind::from_extension(""),
            Err(FileError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_images_are_recognised_but_not_extracted() {
        assert!(matches!(
            FileKind::from_extension("png"),
            Err(FileError::Extraction(msg)) if msg.contains("OCR")
        ));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Resume.Final.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("notes"), None);
    }

    #[test]
    fn test_normalize_whitespace_collapses_blank_runs() {
        let raw = "  Jane Doe  \n\n\n\nEngineer   \n\n";
        assert_eq!(normalize_whitespace(raw), "Jane Doe\n\nEngineer");
    }

    #[tokio::test]
    async fn test_extract_txt() {
        let bytes = Bytes::from_static(b"Jane Doe\nRust Engineer\n");
        let text = extract_text(bytes, "txt", 1024).await.unwrap();
        assert_eq!(text, "Jane Doe\nRust Engineer");
    }

    #[tokio::test]
    async fn test_extract_txt_strips_bom() {
        let bytes = Bytes::from_static(b"\xEF\xBB\xBFJane Doe");
        let text = extract_text(bytes, ".txt", 1024).await.unwrap();
        assert_eq!(text, "Jane Doe");
    }

    #[tokio::test]
    async fn test_size_checked_before_format() {
        let bytes = Bytes::from(vec![b'a'; 11]);
        let err = extract_text(bytes, "exe", 10).await.unwrap_err();
        assert!(matches!(
            err,
            FileError::TooLarge {
                size_bytes: 11,
                limit_bytes: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_extraction_error() {
        let bytes = Bytes::from_static(b"   \n\n  ");
        let err = extract_text(bytes, "txt", 1024).await.unwrap_err();
        assert!(matches!(err, FileError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_extraction_error() {
        let bytes = Bytes::from_static(&[0xff, 0xfe, 0xfd]);
        let err = extract_text(bytes, "txt", 1024).await.unwrap_err();
        assert!(matches!(err, FileError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_an_extraction_error() {
        let bytes = Bytes::from_static(b"definitely not a pdf");
        let err = extract_text(bytes, "pdf", 1024).await.unwrap_err();
        assert!(matches!(err, FileError::Extraction(_)));
    }
}
