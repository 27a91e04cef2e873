//! Question answering behaviour against scripted models.

use std::sync::Arc;
use std::time::Duration;

use scholar_assistant::{AssistantError, QaOrchestrator};
use scholar_memory::ConversationMemory;
use scholar_model::MockLlm;
use scholar_rag::{Document, HashingEmbeddingProvider, Page, RagConfig, RagPipeline, VectorIndex};

mod common;

use common::OutageEmbedder;

const PAPER: &[&str] = &[
    "TinyissimoYOLO is a quantized object detection network for microcontrollers.",
    "The network is deployed on the MAX78000 and reaches 180 frames per second.",
    "Quantization-aware training with 8-bit weights keeps accuracy close to float.",
];

fn pipeline() -> Arc<RagPipeline> {
    let config = RagConfig::builder().chunk_size(120).chunk_overlap(10).top_k(2).build().unwrap();
    Arc::new(
        RagPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
            .build()
            .unwrap(),
    )
}

async fn index(pipeline: &RagPipeline) -> VectorIndex {
    let pages = PAPER.iter().enumerate().map(|(i, t)| Page::new(i, *t)).collect();
    pipeline.ingest(&Document::new("tinyissimo", pages)).await.unwrap()
}

fn orchestrator(llm: Arc<MockLlm>) -> QaOrchestrator {
    QaOrchestrator::builder().pipeline(pipeline()).llm(llm).build().unwrap()
}

#[tokio::test]
async fn n_successful_answers_leave_n_turns_in_call_order() {
    let llm = Arc::new(MockLlm::new("mock").with_reply("a1").with_reply("a2").with_reply("a3"));
    let qa = orchestrator(llm.clone());
    let index = index(qa.pipeline()).await;
    let mut memory = ConversationMemory::new();

    for (i, question) in ["q1", "q2", "q3"].iter().enumerate() {
        let answer = qa.answer(question, &mut memory, &index).await.unwrap();
        assert_eq!(answer.turn, i + 1);
        assert_eq!(answer.text, format!("a{}", i + 1));
    }

    let history = memory.history();
    assert_eq!(history.len(), 3);
    let questions: Vec<&str> = history.iter().map(|t| t.question.as_str()).collect();
    assert_eq!(questions, ["q1", "q2", "q3"]);
}

#[tokio::test]
async fn failed_generation_leaves_memory_unchanged() {
    let llm = Arc::new(MockLlm::new("mock").with_reply("first").with_failure("rate limit exceeded"));
    let qa = orchestrator(llm);
    let index = index(qa.pipeline()).await;
    let mut memory = ConversationMemory::new();

    qa.answer("What hardware is used?", &mut memory, &index).await.unwrap();
    let before = memory.clone();

    let err = qa.answer("And the frame rate?", &mut memory, &index).await.unwrap_err();
    assert!(matches!(err, AssistantError::GenerationFailure(ref m) if m.contains("rate limit")));
    assert_eq!(memory, before);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_a_generation_failure_and_records_nothing() {
    let llm = Arc::new(MockLlm::new("slow").with_delay(Duration::from_secs(30)));
    let qa = QaOrchestrator::builder()
        .pipeline(pipeline())
        .llm(llm)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let index = index(qa.pipeline()).await;
    let mut memory = ConversationMemory::new();

    let err = qa.answer("What is it?", &mut memory, &index).await.unwrap_err();
    assert!(matches!(err, AssistantError::GenerationFailure(_)));
    assert!(memory.is_empty());
}

#[tokio::test]
async fn dropped_call_records_nothing() {
    let llm = Arc::new(MockLlm::new("slow").with_delay(Duration::from_secs(60)));
    let qa = orchestrator(llm);
    let index = index(qa.pipeline()).await;
    let mut memory = ConversationMemory::new();

    let call = qa.answer("What is it?", &mut memory, &index);
    assert!(tokio::time::timeout(Duration::from_millis(10), call).await.is_err());
    assert!(memory.is_empty());
}

#[tokio::test]
async fn prompt_carries_context_history_and_question() {
    let llm = Arc::new(MockLlm::new("mock").with_reply("The MAX78000.").with_reply("180 fps."));
    let qa = orchestrator(llm.clone());
    let index = index(qa.pipeline()).await;
    let mut memory = ConversationMemory::new();

    qa.answer("Which microcontroller is used?", &mut memory, &index).await.unwrap();
    let answer = qa.answer("How fast is the MAX78000 deployment?", &mut memory, &index).await.unwrap();

    let prompts = llm.prompts();
    let second = &prompts[1];
    assert!(second.contains("Human: Which microcontroller is used?\nAssistant: The MAX78000."));
    assert!(second.contains("Question: How fast is the MAX78000 deployment?"));
    assert!(second.contains("180 frames per second"));
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources[0].score >= answer.sources[1].score);

    let temperature = llm.requests()[1].config.as_ref().and_then(|c| c.temperature);
    assert_eq!(temperature, Some(0.7));
}

#[tokio::test]
async fn condensed_question_drives_retrieval_only() {
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_reply("It detects objects on microcontrollers.")
            .with_reply("What frame rate does TinyissimoYOLO reach on the MAX78000?")
            .with_reply("Up to 180 fps."),
    );
    let qa = QaOrchestrator::builder()
        .pipeline(pipeline())
        .llm(llm.clone())
        .condense_question(true)
        .build()
        .unwrap();
    let index = index(qa.pipeline()).await;
    let mut memory = ConversationMemory::new();

    let first = qa.answer("What is TinyissimoYOLO?", &mut memory, &index).await.unwrap();
    assert!(first.standalone_question.is_none());

    let second = qa.answer("How fast is it?", &mut memory, &index).await.unwrap();
    assert_eq!(
        second.standalone_question.as_deref(),
        Some("What frame rate does TinyissimoYOLO reach on the MAX78000?")
    );
    assert_eq!(second.text, "Up to 180 fps.");
    assert_eq!(llm.call_count(), 3);
    assert!(llm.prompts()[1].ends_with("Follow Up Input: How fast is it?\nStandalone question:"));
    assert_eq!(memory.last().map(|t| t.question.as_str()), Some("How fast is it?"));
}

#[tokio::test]
async fn embedding_failure_on_question_leaves_memory_and_model_untouched() {
    let embedder = Arc::new(OutageEmbedder::default());
    let pipeline = Arc::new(RagPipeline::builder().embedding_provider(embedder.clone()).build().unwrap());
    let index = index(&pipeline).await;
    let llm = Arc::new(MockLlm::new("mock").with_reply("first answer"));
    let qa = QaOrchestrator::builder().pipeline(pipeline).llm(llm.clone()).build().unwrap();

    let mut memory = ConversationMemory::new();
    qa.answer("Which hardware?", &mut memory, &index).await.unwrap();
    let before = memory.history().to_vec();
    embedder.go_down();

    let err = qa.answer("How fast is it?", &mut memory, &index).await.unwrap_err();

    assert!(matches!(err, AssistantError::EmbeddingFailure { .. }));
    assert_eq!(memory.history(), before.as_slice());
    assert_eq!(llm.call_count(), 1);
}
