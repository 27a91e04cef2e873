//! # scholar-memory
//!
//! Conversation memory for document Q&A sessions.
//!
//! A [`ConversationMemory`] is an ordered, append-only list of [`Turn`]s. A
//! turn is only ever appended once its answer exists, so a failed or cancelled
//! generation leaves the memory exactly as it was. Memory is cleared only when
//! the owning session is reset.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// One-based position of the turn in the conversation.
    pub ordinal: usize,
    /// The question as asked by the user.
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// When the turn was recorded.
    pub asked_at: DateTime<Utc>,
}

/// Ordered history of question/answer turns for one session.
///
/// ```rust
/// use scholar_memory::ConversationMemory;
///
/// let mut memory = ConversationMemory::new();
/// memory.append("What dataset is used?", "ImageNet.");
/// memory.append("How large is it?", "1.2M images.");
///
/// let ordinals: Vec<usize> = memory.history().iter().map(|t| t.ordinal).collect();
/// assert_eq!(ordinals, [1, 2]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed turn and return it.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) -> &Turn {
        let turn = Turn {
            ordinal: self.turns.len() + 1,
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        };
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// All turns, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Render the history as a plain-text transcript.
    ///
    /// Each turn is written as a `Q:` line and an `A:` line followed by a
    /// blank line. An empty memory renders as an empty string.
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            let _ = writeln!(out, "[{}] {}", turn.ordinal, turn.asked_at.format("%Y-%m-%d %H:%M:%S UTC"));
            let _ = writeln!(out, "Q: {}", turn.question);
            let _ = writeln!(out, "A: {}", turn.answer);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_memory_is_empty() {
        let memory = ConversationMemory::new();
        assert!(memory.is_empty());
        assert_eq!(memory.len(), 0);
        assert!(memory.last().is_none());
        assert_eq!(memory.export_text(), "");
    }

    #[test]
    fn append_assigns_consecutive_ordinals() {
        let mut memory = ConversationMemory::new();
        for i in 0..3 {
            let turn = memory.append(format!("q{i}"), format!("a{i}"));
            assert_eq!(turn.ordinal, i + 1);
        }
        assert_eq!(memory.len(), 3);
        assert_eq!(memory.last().map(|t| t.question.as_str()), Some("q2"));
    }

    #[test]
    fn clear_restarts_numbering() {
        let mut memory = ConversationMemory::new();
        memory.append("q", "a");
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.append("again", "yes").ordinal, 1);
    }

    #[test]
    fn export_lists_questions_and_answers_in_order() {
        let mut memory = ConversationMemory::new();
        memory.append("这篇文章的创新点是什么？", "提出了新的量化方法。");
        memory.append("Which dataset?", "CIFAR-10.");

        let text = memory.export_text();
        let first = text.find("Q: 这篇文章的创新点是什么？").unwrap();
        let second = text.find("Q: Which dataset?").unwrap();
        assert!(first < second);
        assert!(text.contains("A: 提出了新的量化方法。\n"));
        assert!(text.starts_with("[1] "));
    }

    #[test]
    fn serde_round_trip_preserves_turns() {
        let mut memory = ConversationMemory::new();
        memory.append("q", "a");
        let json = serde_json::to_string(&memory).unwrap();
        let back: ConversationMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, memory);
    }
}
