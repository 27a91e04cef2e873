//! Per-user session state: one indexed document plus conversation memory.
//!
//! A [`Session`] is owned by its caller and passed explicitly; sessions share
//! no mutable state. Methods that change the session take `&mut self`, so a
//! session serves one request at a time. Read-only queries can run against
//! an [`Arc<VectorIndex>`] snapshot from [`Session::index`]; loading a new
//! document builds the replacement index first and then swaps the `Arc`, so
//! snapshot holders never observe a half-built index.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scholar_memory::{ConversationMemory, Turn};
use scholar_rag::{Document, DocumentLoader, VectorIndex, load_path, loader_for_path};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AssistantError, Result};
use crate::qa::{Answer, PresetQuestion, QaOrchestrator};

/// What is currently indexed in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document identifier.
    pub id: String,
    /// Where the document was loaded from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
    /// Number of pages.
    pub page_count: usize,
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// When the index was built.
    pub indexed_at: DateTime<Utc>,
}

/// A question answering session over one document at a time.
///
/// ```rust,ignore
/// let mut session = Session::new(Arc::new(qa));
/// session.load_path(Path::new("paper.pdf")).await?;
/// let answer = session.ask_preset(PresetQuestion::Summary).await?;
/// std::fs::write("chat_history.txt", session.export_history())?;
/// ```
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    qa: Arc<QaOrchestrator>,
    memory: ConversationMemory,
    index: Arc<VectorIndex>,
    document: Option<DocumentSummary>,
}

impl Session {
    /// Start an empty session with a fresh id.
    pub fn new(qa: Arc<QaOrchestrator>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            qa,
            memory: ConversationMemory::new(),
            index: Arc::new(VectorIndex::empty()),
            document: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The currently indexed document, if any.
    pub fn document(&self) -> Option<&DocumentSummary> {
        self.document.as_ref()
    }

    /// A snapshot of the current index.
    pub fn index(&self) -> Arc<VectorIndex> {
        Arc::clone(&self.index)
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Completed turns, oldest first.
    pub fn history(&self) -> &[Turn] {
        self.memory.history()
    }

    /// The conversation as a plain-text transcript.
    pub fn export_history(&self) -> String {
        self.memory.export_text()
    }

    /// Index `document`, replacing the previous one.
    ///
    /// The new index is built before anything is replaced: on failure the
    /// previous document stays loaded. Conversation memory is kept.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::EmptyIndex`] if the document has no text.
    /// - [`AssistantError::EmbeddingFailure`] if embedding fails.
    #[instrument(skip_all, fields(session.id = %self.id, document.id = %document.id))]
    pub async fn load_document(&mut self, document: &Document) -> Result<&DocumentSummary> {
        let index = self.qa.pipeline().ingest(document).await?;

        let summary = DocumentSummary {
            id: document.id.clone(),
            source_uri: document.source_uri.clone(),
            page_count: document.page_count(),
            chunk_count: index.len(),
            indexed_at: Utc::now(),
        };
        self.index = Arc::new(index);
        info!(chunk_count = summary.chunk_count, page_count = summary.page_count, "document indexed");

        Ok(self.document.insert(summary))
    }

    /// Parse `bytes` with `loader` and index the result.
    ///
    /// The bytes are only borrowed for parsing; nothing is written to disk.
    pub async fn load_bytes(
        &mut self,
        id: &str,
        bytes: &[u8],
        loader: &dyn DocumentLoader,
    ) -> Result<&DocumentSummary> {
        let document = loader.load(id, bytes)?;
        self.load_document(&document).await
    }

    /// Read a PDF or text file and index it.
    pub async fn load_path(&mut self, path: &Path) -> Result<&DocumentSummary> {
        let loader = loader_for_path(path);
        let document = load_path(loader.as_ref(), path)?;
        self.load_document(&document).await
    }

    /// Answer a question about the loaded document.
    ///
    /// # Errors
    ///
    /// [`AssistantError::EmptyIndex`] if no document is loaded, otherwise see
    /// [`QaOrchestrator::answer`]. Memory is unchanged on any error.
    #[instrument(skip_all, fields(session.id = %self.id))]
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        if self.document.is_none() {
            return Err(AssistantError::EmptyIndex);
        }
        let index = Arc::clone(&self.index);
        self.qa.answer(question, &mut self.memory, &index).await
    }

    /// Ask one of the canned questions.
    pub async fn ask_preset(&mut self, preset: PresetQuestion) -> Result<Answer> {
        self.ask(preset.question()).await
    }

    /// Forget the conversation and drop the indexed document.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.index = Arc::new(VectorIndex::empty());
        self.document = None;
        info!(session.id = %self.id, "session reset");
    }
}
