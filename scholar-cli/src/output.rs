//! Terminal rendering of answers and load results.

use scholar_assistant::{Answer, DocumentSummary};

pub fn print_summary(summary: &DocumentSummary) {
    println!(
        "loaded {} ({} pages, {} chunks)",
        summary.source_uri.as_deref().unwrap_or(&summary.id),
        summary.page_count,
        summary.chunk_count
    );
}

pub fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text.trim());
    if let Some(sources) = sources_line(answer) {
        println!("{sources}\n");
    }
}

/// `Sources: page 2, pages 3-4` in retrieval order, or `None` without sources.
fn sources_line(answer: &Answer) -> Option<String> {
    if answer.sources.is_empty() {
        return None;
    }
    let pages: Vec<String> = answer.sources.iter().map(|hit| hit.chunk.pages.to_string()).collect();
    Some(format!("Sources: {}", pages.join(", ")))
}

#[cfg(test)]
mod tests {
    use scholar_rag::{Chunk, PageRange, SearchResult};

    use super::*;

    fn answer(ranges: &[(usize, usize)]) -> Answer {
        Answer {
            text: "A tiny detector.".into(),
            sources: ranges
                .iter()
                .enumerate()
                .map(|(ordinal, &(first, last))| SearchResult {
                    chunk: Chunk {
                        document_id: "paper".into(),
                        ordinal,
                        text: "text".into(),
                        pages: PageRange { first, last },
                    },
                    score: 0.5,
                })
                .collect(),
            turn: 1,
            standalone_question: None,
        }
    }

    #[test]
    fn sources_are_listed_one_based() {
        assert_eq!(sources_line(&answer(&[(1, 1), (2, 3)])).as_deref(), Some("Sources: page 2, pages 3-4"));
        assert_eq!(sources_line(&answer(&[])), None);
    }
}
