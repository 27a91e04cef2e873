//! Data types for documents, pages, chunks, and search results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator inserted between consecutive pages when a document is flattened to text.
pub const PAGE_SEPARATOR: &str = "\n";

/// A single page of extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// Zero-based position of the page in the source document.
    pub index: usize,
    /// The extracted text of the page.
    pub text: String,
}

impl Page {
    /// Create a page from its index and text.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, text: text.into() }
    }
}

/// A loaded source document: an ordered sequence of pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// Pages in document order.
    pub pages: Vec<Page>,
    /// Where the document was loaded from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document from its pages.
    pub fn new(id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self { id: id.into(), pages, source_uri: None }
    }

    /// Create a single-page document from plain text.
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, vec![Page::new(0, text)])
    }

    /// Attach a source URI.
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    /// The full document text: page texts joined with [`PAGE_SEPARATOR`].
    ///
    /// Chunks produced by the chunkers cover exactly this string.
    pub fn text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(PAGE_SEPARATOR)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of characters in [`Document::text`].
    pub fn char_count(&self) -> usize {
        let text: usize = self.pages.iter().map(|p| p.text.chars().count()).sum();
        text + self.pages.len().saturating_sub(1) * PAGE_SEPARATOR.chars().count()
    }
}

/// Inclusive range of page indices a chunk was taken from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRange {
    /// Index of the first page.
    pub first: usize,
    /// Index of the last page.
    pub last: usize,
}

impl fmt::Display for PageRange {
    // Pages are displayed one-based.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "page {}", self.first + 1)
        } else {
            write!(f, "pages {}-{}", self.first + 1, self.last + 1)
        }
    }
}

/// A bounded-size segment of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Zero-based position of the chunk within its document.
    pub ordinal: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Pages this chunk's text was taken from.
    pub pages: PageRange,
}

impl Chunk {
    /// Stable identifier of the form `{document_id}_{ordinal}`.
    pub fn id(&self) -> String {
        format!("{}_{}", self.document_id, self.ordinal)
    }

    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}
