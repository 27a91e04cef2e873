//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] — cuts at the highest-priority separator that fits the window
//! - [`FixedSizeChunker`] — cuts purely by character count
//!
//! Both measure sizes in characters (Unicode scalar values), so multi-byte text
//! such as Chinese is never split inside a character. Consecutive chunks share
//! exactly `chunk_overlap` characters, and chunks cover the document text with no
//! gaps: dropping the first `chunk_overlap` characters of every chunk after the
//! first and concatenating reproduces [`Document::text`].

use crate::document::{Chunk, Document, PAGE_SEPARATOR, Page, PageRange};
use crate::error::{RagError, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Default separators, highest priority first. Tuned for mixed Chinese/English papers.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n", "。", "！", "？", "，", "、", ""];

/// A strategy for splitting documents into chunks.
///
/// Chunk parameters are validated when the chunker is constructed, so
/// chunking itself cannot fail. Returns an empty `Vec` for an empty document.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered chunks.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Check that `chunk_overlap < chunk_size`.
pub(crate) fn validate_sizes(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::InvalidConfig("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidConfig(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Splits text at the highest-priority separator that keeps each chunk within
/// `chunk_size`, falling back to a hard cut.
///
/// For every window `[start, start + chunk_size]` the separators are tried in
/// order. The cut goes right after the last occurrence of the separator in the
/// window, as long as it lies past `start + chunk_overlap`. The empty separator
/// cuts at the window end. The next chunk starts `chunk_overlap` characters
/// before the cut.
///
/// # Example
///
/// ```rust
/// use scholar_rag::{Chunker, Document, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(1000, 50, ["\n", "。", ""]).unwrap();
/// let chunks = chunker.chunk(&Document::from_text("paper", "第一句。第二句。"));
/// assert_eq!(chunks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of characters shared by consecutive chunks
    /// * `separators` — cut boundaries, highest priority first
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `chunk_overlap >= chunk_size`.
    pub fn new(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        validate_sizes(chunk_size, chunk_overlap)?;
        let separators = separators.into_iter().map(Into::into).collect();
        Ok(Self { chunk_size, chunk_overlap, separators })
    }

    /// A chunker with [`DEFAULT_CHUNK_SIZE`], [`DEFAULT_CHUNK_OVERLAP`] and [`DEFAULT_SEPARATORS`].
    pub fn with_defaults() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Maximum chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Separators in priority order.
    pub fn separators(&self) -> &[String] {
        &self.separators
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        chunk_document(document, self.chunk_size, self.chunk_overlap, &self.separators)
    }
}

/// Splits text into fixed-size chunks by character count with overlap.
///
/// # Example
///
/// ```rust
/// use scholar_rag::{Chunker, Document, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4, 1).unwrap();
/// let chunks = chunker.chunk(&Document::from_text("d", "abcdefg"));
/// let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["abcd", "defg"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_sizes(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        chunk_document(document, self.chunk_size, self.chunk_overlap, &[])
    }
}

/// Chunk a sequence of pages without constructing a chunker first.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfig`] if `chunk_overlap >= chunk_size`.
pub fn chunk_pages(
    document_id: &str,
    pages: &[Page],
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Result<Vec<Chunk>> {
    let chunker = RecursiveChunker::new(chunk_size, chunk_overlap, separators.iter().copied())?;
    let document = Document::new(document_id, pages.to_vec());
    Ok(chunker.chunk(&document))
}

fn chunk_document(
    document: &Document,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[String],
) -> Vec<Chunk> {
    let text = document.text();
    // Byte offset of every character, plus the end of the text.
    let offsets: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();

    let page_starts = page_start_offsets(&document.pages);
    let page_at = |pos: usize| {
        let slot = page_starts.partition_point(|&start| start <= pos).saturating_sub(1);
        document.pages.get(slot).map_or(0, |p| p.index)
    };

    split_spans(&text, &offsets, chunk_size, chunk_overlap, separators)
        .into_iter()
        .enumerate()
        .map(|(ordinal, (start, end))| Chunk {
            document_id: document.id.clone(),
            ordinal,
            text: text[offsets[start]..offsets[end]].to_string(),
            pages: PageRange { first: page_at(start), last: page_at(end - 1) },
        })
        .collect()
}

/// Character offset at which each page begins in [`Document::text`].
fn page_start_offsets(pages: &[Page]) -> Vec<usize> {
    let separator_len = PAGE_SEPARATOR.chars().count();
    let mut starts = Vec::with_capacity(pages.len());
    let mut offset = 0;
    for page in pages {
        starts.push(offset);
        offset += page.text.chars().count() + separator_len;
    }
    starts
}

/// Compute half-open character spans `[start, end)` for each chunk.
fn split_spans(
    text: &str,
    offsets: &[usize],
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[String],
) -> Vec<(usize, usize)> {
    let total = offsets.len() - 1;
    let mut spans = Vec::new();
    if total == 0 {
        return spans;
    }

    let mut start = 0;
    loop {
        if total - start <= chunk_size {
            spans.push((start, total));
            break;
        }

        let window_end = start + chunk_size;
        // The cut must leave the next chunk starting after this one.
        let min_end = start + chunk_overlap + 1;
        let end = find_cut(text, offsets, start, min_end, window_end, separators)
            .unwrap_or(window_end);

        spans.push((start, end));
        start = end - chunk_overlap;
    }

    spans
}

/// Find the cut position for the window `[start, window_end]` using the first
/// separator that yields one at or after `min_end`.
fn find_cut(
    text: &str,
    offsets: &[usize],
    start: usize,
    min_end: usize,
    window_end: usize,
    separators: &[String],
) -> Option<usize> {
    let window = &text[offsets[start]..offsets[window_end]];

    for separator in separators {
        if separator.is_empty() {
            return Some(window_end);
        }

        // Matches come back last-first, so the first one is the latest possible cut.
        let Some((pos, _)) = window.rmatch_indices(separator.as_str()).next() else {
            continue;
        };
        let cut_byte = offsets[start] + pos + separator.len();
        if let Ok(cut) = offsets.binary_search(&cut_byte) {
            if cut >= min_end {
                return Some(cut);
            }
        }
    }

    None
}
