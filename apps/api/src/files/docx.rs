use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::FileError;

const DOCUMENT_XML: &str = "word/document.xml";

/// Reads the main document part of a DOCX archive and flattens it to text.
/// Paragraphs and table rows end lines; table cells are space-separated.
///
/// At most `max_xml_bytes` of the decompressed part are read, whatever the
/// archive header claims.
pub(super) fn extract_text(path: &Path, max_xml_bytes: usize) -> Result<String, FileError> {
    let file = std::fs::File::open(path)
        .map_err(|e| FileError::Extraction(format!("failed to open DOCX: {e}")))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| FileError::Extraction(format!("not a valid DOCX archive: {e}")))?;

    let entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|_| FileError::Extraction("could not find document.xml in DOCX".to_string()))?;
    let limit = max_xml_bytes as u64;
    if entry.size() > limit {
        return Err(document_too_large(max_xml_bytes));
    }

    let mut raw = Vec::new();
    entry
        .take(limit + 1)
        .read_to_end(&mut raw)
        .map_err(|e| FileError::Extraction(format!("failed to read document.xml: {e}")))?;
    if raw.len() > max_xml_bytes {
        return Err(document_too_large(max_xml_bytes));
    }
    let xml = String::from_utf8(raw)
        .map_err(|_| FileError::Extraction("document.xml is not valid UTF-8".to_string()))?;

    flatten_document_xml(&xml)
}

fn document_too_large(max_xml_bytes: usize) -> FileError {
    FileError::Extraction(format!(
        "DOCX content is too large once decompressed (limit {max_xml_bytes} bytes)"
    ))
}

fn flatten_document_xml(xml: &str) -> Result<String, FileError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::Text(e)) if in_text => out.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(r)) if in_text => {
                let entity = format!("&{};", String::from_utf8_lossy(&r));
                let resolved = quick_xml::escape::unescape(&entity)
                    .map(|s| s.into_owned())
                    .unwrap_or(entity);
                out.push_str(&resolved);
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" | b"w:tr" => out.push('\n'),
                b"w:tc" => out.push(' '),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FileError::Extraction(format!(
                    "malformed DOCX XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

    const TEST_LIMIT: usize = 1024 * 1024;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Rust </w:t></w:r><w:r><w:t>&amp; Go Engineer</w:t></w:r></w:p>
    <w:tbl>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Skills</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>Tokio</w:t></w:r></w:p></w:tc>
      </w:tr>
    </w:tbl>
  </w:body>
</w:document>"#;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer.start_file(DOCUMENT_XML, options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_flatten_joins_runs_and_resolves_entities() {
        let text = flatten_document_xml(SAMPLE_XML).unwrap();
        assert!(text.contains("Jane Doe\n"));
        assert!(text.contains("Rust & Go Engineer\n"));
        assert!(text.contains("Skills"));
        assert!(text.contains("Tokio"));
    }

    #[test]
    fn test_extract_from_archive_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&build_docx(SAMPLE_XML)).unwrap();
        file.flush().unwrap();

        let text = extract_text(file.path(), TEST_LIMIT).unwrap();
        assert!(text.starts_with("Jane Doe"));
    }

    #[test]
    fn test_archive_without_document_part_fails() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/other.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        assert!(matches!(
            extract_text(file.path(), TEST_LIMIT),
            Err(FileError::Extraction(msg)) if msg.contains("document.xml")
        ));
    }

    #[test]
    fn test_non_zip_bytes_fail() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"plain text pretending to be docx").unwrap();
        file.flush().unwrap();
        assert!(extract_text(file.path(), TEST_LIMIT).is_err());
    }

    fn highly_compressible_xml(repeats: usize) -> String {
        format!(
            "<w:document><w:body>{}</w:body></w:document>",
            "<w:p><w:r><w:t>filler filler filler</w:t></w:r></w:p>".repeat(repeats)
        )
    }

    #[test]
    fn test_oversized_document_part_is_rejected() {
        let xml = highly_compressible_xml(5_000);
        let bytes = build_docx(&xml);
        assert!(bytes.len() < 16 * 1024);
        assert!(xml.len() > 200 * 1024);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        assert!(matches!(
            extract_text(file.path(), 64 * 1024),
            Err(FileError::Extraction(msg)) if msg.contains("too large")
        ));
        assert!(extract_text(file.path(), xml.len()).is_ok());
    }

    #[tokio::test]
    async fn test_upload_ceiling_bounds_decompressed_size() {
        let xml = highly_compressible_xml(5_000);
        let bytes = build_docx(&xml);
        let max_bytes = 16 * 1024;
        assert!(bytes.len() <= max_bytes);
        assert!(xml.len() > max_bytes * 8);

        let result = crate::files::extract_text(bytes.into(), "docx", max_bytes).await;
        assert!(matches!(result, Err(FileError::Extraction(msg)) if msg.contains("too large")));
    }
}
