//! PDF text extraction
//!
//! Extracts per-page text from in-memory PDF bytes using lopdf. Text is
//! pulled from the text-showing operators of each page's content stream;
//! line structure (one line per text block) is preserved so downstream
//! heading detection can work on it.

use crate::errors::IngestionError;
use tracing::{debug, warn};

/// Extracted text of a single page
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page number (1-based)
    pub number: u32,
    /// Normalized page text; empty when the page had no extractable text
    pub text: String,
}

/// Extract per-page text from PDF bytes.
///
/// A page without extractable text yields an empty `PageText`, not an
/// error. Fails with `UnsupportedDocument` when the bytes are not a
/// loadable PDF or when no page in the document yields any text.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>, IngestionError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| {
        IngestionError::UnsupportedDocument(format!("Failed to load PDF: {}", e))
    })?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut result = Vec::with_capacity(pages.len());
    for (number, page_id) in pages {
        let text = match doc.get_page_content(page_id) {
            Ok(content) => normalize_text(&page_text_from_content(&content)),
            Err(e) => {
                warn!(page = number, error = %e, "Failed to read page content, skipping");
                String::new()
            }
        };
        result.push(PageText { number, text });
    }

    if result.iter().all(|p| p.text.trim().is_empty()) {
        return Err(IngestionError::UnsupportedDocument(
            "No text content extracted from PDF".to_string(),
        ));
    }

    Ok(result)
}

/// Collect the text drawn by a page's content stream.
///
/// Walks BT..ET text blocks; each block becomes one output line.
fn page_text_from_content(content: &[u8]) -> String {
    fn flush(block: &mut String, page: &mut String) {
        let trimmed = block.trim();
        if !trimmed.is_empty() {
            page.push_str(trimmed);
            page.push('\n');
        }
        block.clear();
    }

    let source = String::from_utf8_lossy(content);
    let mut page = String::new();
    let mut block = String::new();
    let mut in_text = false;

    for raw in source.lines() {
        let line = raw.trim();
        match line {
            "BT" => in_text = true,
            "ET" => {
                in_text = false;
                flush(&mut block, &mut page);
            }
            _ if in_text => {
                if let Some(shown) = shown_text(line) {
                    block.push_str(&shown);
                }
            }
            _ => {}
        }
    }
    // Text block left open by a truncated stream
    flush(&mut block, &mut page);

    page
}

/// Text drawn by a single operation line, if it is a text-showing operator
/// (Tj, TJ arrays, ' or ").
fn shown_text(line: &str) -> Option<String> {
    let is_show_op = line.ends_with("Tj")
        || line.ends_with("TJ")
        || line.ends_with('\'')
        || line.ends_with('"');
    if !is_show_op {
        return None;
    }

    let mut result = String::new();
    let mut current = String::new();
    let mut in_literal = false;
    let mut escaped = false;

    for ch in line.chars() {
        if in_literal {
            if escaped {
                current.push(unescape(ch));
                escaped = false;
            } else {
                match ch {
                    '\\' => escaped = true,
                    ')' => {
                        in_literal = false;
                        result.push_str(&current);
                        current.clear();
                    }
                    _ => current.push(ch),
                }
            }
        } else if ch == '(' {
            in_literal = true;
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}

/// Normalize extracted text: collapse intra-line whitespace, drop empty
/// lines, strip BOMs, straighten curly quotes.
fn normalize_text(text: &str) -> String {
    text.replace('\u{FEFF}', "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
