//! Source file text extraction for `.txt`, `.pdf` and `.docx` course documents.

use lectern_core::{AppError, AppResult};
use quick_xml::events::Event;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Maximum decompressed bytes read from `word/document.xml`.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Pdf,
    Docx,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("txt") => Self::PlainText,
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        *self != Self::Unsupported
    }
}

/// Read a course document and return its plain text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);
    tracing::debug!("Parsing {:?} as {}", path, content_type.as_str());

    match content_type {
        ContentType::PlainText => read_text(path),
        ContentType::Pdf => {
            let bytes = fs::read(path)?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                AppError::Knowledge(format!("PDF extraction failed for {:?}: {}", path, e))
            })
        }
        ContentType::Docx => {
            let bytes = fs::read(path)?;
            extract_docx(&bytes).map_err(|e| {
                AppError::Knowledge(format!("DOCX extraction failed for {:?}: {}", path, e))
            })
        }
        ContentType::Unsupported => Err(AppError::Knowledge(format!(
            "Unsupported document type: {:?}",
            path
        ))),
    }
}

/// Plain text, tolerating non-UTF-8 bytes.
fn read_text(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!("{:?} is not valid UTF-8, replacing invalid bytes", path);
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| format!("word/document.xml: {}", e))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| e.to_string())?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err("word/document.xml exceeds size limit".to_string());
    }

    document_xml_text(&xml)
}

/// Collect `<w:t>` runs, one line per `<w:p>` paragraph.
///
/// Line structure matters: course headers and lesson markers are matched
/// line by line.
fn document_xml_text(xml: &[u8]) -> Result<String, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"br" => out.push('\n'),
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
