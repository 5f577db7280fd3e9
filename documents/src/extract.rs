//! Plain-text extraction from the supported document formats.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::error::{DocumentError, Result};

/// Lower-cased extensions (with the dot) that [`extract_text`] handles.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".pdf", ".docx"];

/// Whether `path` has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Read the text content of a document.
pub fn extract_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(DocumentError::FileNotFound(path.to_path_buf()));
    }

    let extension = extension_of(path);
    debug!("Extracting {} as {extension}", path.display());

    match extension.as_str() {
        ".txt" => extract_txt(path),
        ".pdf" => extract_pdf(path),
        ".docx" => extract_docx(path),
        _ => Err(DocumentError::UnsupportedFormat(extension)),
    }
}

/// The extension with a leading dot, lower-cased; empty when absent.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn extract_txt(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!("{} is not valid UTF-8, decoding as Latin-1", path.display());
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(e.as_bytes());
            Ok(text.into_owned())
        }
    }
}

/// Page text in page order, one trailing newline per page. Pages whose
/// content cannot be decoded are skipped.
fn extract_pdf(path: &Path) -> Result<String> {
    let document = lopdf::Document::load(path)?;
    let mut text = String::new();
    for page in document.get_pages().into_keys() {
        match document.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => warn!("Skipping page {page} of {}: {e}", path.display()),
        }
    }
    Ok(text)
}

fn extract_docx(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;
    Ok(paragraphs_from_xml(&xml))
}

/// Paragraph text from WordprocessingML, one line per `<w:p>`.
pub(crate) fn paragraphs_from_xml(xml: &str) -> String {
    let Some((paragraph_re, run_re)) = docx_patterns() else {
        return String::new();
    };

    let mut text = String::new();
    for paragraph in paragraph_re.find_iter(xml) {
        for run in run_re.captures_iter(paragraph.as_str()) {
            if let Some(content) = run.get(1) {
                text.push_str(&decode_entities(content.as_str()));
            }
        }
        text.push('\n');
    }
    text
}

fn docx_patterns() -> Option<&'static (Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let paragraph =
                Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>.*?</w:p>").ok()?;
            let run = Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").ok()?;
            Some((paragraph, run))
        })
        .as_ref()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
