//! Prompt assembly for question answering.

use std::fmt::Write as _;

use scholar_memory::Turn;
use scholar_rag::SearchResult;

const QA_INSTRUCTION: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

const CONDENSE_INSTRUCTION: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

/// Build the answer prompt: instruction, retrieved context, prior turns, question.
///
/// Context blocks are numbered in retrieval order and labelled with their pages.
/// The history section is left out when there are no prior turns.
pub fn qa_prompt(context: &[SearchResult], history: &[Turn], question: &str) -> String {
    let mut prompt = String::from(QA_INSTRUCTION);
    prompt.push_str("\n\n");

    for (i, hit) in context.iter().enumerate() {
        let _ = writeln!(prompt, "[{}] ({})", i + 1, hit.chunk.pages);
        prompt.push_str(hit.chunk.text.trim_end());
        prompt.push_str("\n\n");
    }

    if !history.is_empty() {
        prompt.push_str("Chat History:\n");
        write_history(&mut prompt, history);
        prompt.push('\n');
    }

    let _ = write!(prompt, "Question: {question}\nHelpful Answer:");
    prompt
}

/// Build the prompt that rewrites a follow-up into a standalone question.
pub fn condense_prompt(history: &[Turn], question: &str) -> String {
    let mut prompt = String::from(CONDENSE_INSTRUCTION);
    prompt.push_str("\n\nChat History:\n");
    write_history(&mut prompt, history);
    let _ = write!(prompt, "Follow Up Input: {question}\nStandalone question:");
    prompt
}

fn write_history(out: &mut String, history: &[Turn]) {
    for turn in history {
        let _ = writeln!(out, "Human: {}", turn.question);
        let _ = writeln!(out, "Assistant: {}", turn.answer);
    }
}
