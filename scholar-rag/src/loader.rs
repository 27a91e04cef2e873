//! Document loaders turning raw bytes into ordered pages.
//!
//! Loaders work on an in-memory byte buffer owned by the caller; nothing is
//! written to disk, so concurrent sessions never share a scratch file.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::document::{Document, Page};
use crate::error::{RagError, Result};

/// Parses a binary document into a [`Document`] of ordered pages.
pub trait DocumentLoader: Send + Sync {
    /// Short format name used in logs and errors (`pdf`, `text`).
    fn format(&self) -> &'static str;

    /// Parse `bytes` into a document identified by `id`.
    fn load(&self, id: &str, bytes: &[u8]) -> Result<Document>;
}

/// Extracts text from PDF files page by page.
///
/// Pages whose text cannot be extracted are kept as empty pages so page
/// indices still match the source; if no page yields text the load fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Create a new PDF loader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn format(&self) -> &'static str {
        "pdf"
    }

    fn load(&self, id: &str, bytes: &[u8]) -> Result<Document> {
        let pdf = lopdf::Document::load_mem(bytes)
            .map_err(|e| RagError::load(self.format(), format!("unreadable PDF: {e}")))?;

        if pdf.is_encrypted() {
            return Err(RagError::load(self.format(), "encrypted PDFs are not supported"));
        }

        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(RagError::load(self.format(), "PDF has no pages"));
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        let mut extracted = 0;
        for (index, number) in page_numbers.iter().enumerate() {
            let text = match pdf.extract_text(&[*number]) {
                Ok(text) => {
                    extracted += 1;
                    normalize_page_text(&text)
                }
                Err(e) => {
                    warn!(document.id = id, page = number, error = %e, "failed to extract page text");
                    String::new()
                }
            };
            pages.push(Page::new(index, text));
        }

        if extracted == 0 {
            return Err(RagError::load(self.format(), "no page text could be extracted"));
        }

        info!(document.id = id, page_count = pages.len(), "loaded PDF document");
        Ok(Document::new(id, pages))
    }
}

/// Trim trailing whitespace on each line and drop trailing blank lines.
fn normalize_page_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    lines.join("\n").trim_end().to_string()
}

/// Loads UTF-8 text; a form feed (`\x0C`) starts a new page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl TextLoader {
    /// Create a new text loader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for TextLoader {
    fn format(&self) -> &'static str {
        "text"
    }

    fn load(&self, id: &str, bytes: &[u8]) -> Result<Document> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RagError::load(self.format(), format!("invalid UTF-8: {e}")))?;

        let pages: Vec<Page> =
            text.split('\x0C').enumerate().map(|(index, page)| Page::new(index, page)).collect();

        debug!(document.id = id, page_count = pages.len(), "loaded text document");
        Ok(Document::new(id, pages))
    }
}

/// Pick a loader from the file extension: `.pdf` gets [`PdfLoader`], anything else [`TextLoader`].
pub fn loader_for_path(path: &Path) -> Box<dyn DocumentLoader> {
    let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf { Box::new(PdfLoader::new()) } else { Box::new(TextLoader::new()) }
}

/// Read `path` into memory and parse it with `loader`.
///
/// The document id is the file stem and the source URI is the path. The byte
/// buffer is released before this function returns, on success or failure.
pub fn load_path(loader: &dyn DocumentLoader, path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    let id = path.file_stem().and_then(|s| s.to_str()).unwrap_or("document").to_string();
    let document = loader.load(&id, &bytes)?;
    Ok(document.with_source_uri(path.display().to_string()))
}
