//! Polishing prompts and generation settings.

use std::sync::Arc;
use std::time::Duration;

use scholar_assistant::{
    AssistantError, OutputLanguage, PolishOptions, PolishOrchestrator, PolishStyle, build_polish_prompt,
};
use scholar_model::MockLlm;

const ABSTRACT: &str = "This paper introduces a highly flexible, quantized, memory-efficient, \
and ultra-lightweight object detection network, called TinyissimoYOLO.";

#[test]
fn custom_requirements_are_numbered_with_length_directive() {
    let options = PolishOptions::default()
        .with_max_length(500)
        .with_requirement("提高学术性")
        .with_requirement("改善语法");

    let prompt = build_polish_prompt(ABSTRACT, PolishStyle::Custom, &options).unwrap();

    assert!(prompt.starts_with("请对以下文本进行润色，要求：\n"));
    assert!(prompt.contains("1. 提高学术性\n"));
    assert!(prompt.contains("2. 改善语法\n"));
    assert!(prompt.contains("3. 请用中文回复。\n\n文本内容："));
    assert!(prompt.contains(ABSTRACT));
    assert!(prompt.ends_with("\n\n请确保润色后的文本不超过500字。"));
}

#[test]
fn every_preset_style_has_six_numbered_items() {
    for style in [PolishStyle::Academic, PolishStyle::Grammar, PolishStyle::Light] {
        let options = PolishOptions::default().with_language(OutputLanguage::Bilingual);
        let prompt = build_polish_prompt(ABSTRACT, style, &options).unwrap();
        assert!(prompt.contains("5. "), "{style}");
        assert!(prompt.contains("6. 请同时用中文和英文回复，先中文后英文。"), "{style}");
        assert!(!prompt.contains("7. "), "{style}");
    }
}

#[test]
fn unknown_style_labels_fail() {
    assert!(matches!("fancy".parse::<PolishStyle>(), Err(AssistantError::UnknownStyle(_))));
}

#[tokio::test]
async fn polish_sends_prompt_and_limits() {
    let llm = Arc::new(MockLlm::new("mock").with_reply("润色后的文本"));
    let polisher = PolishOrchestrator::new(llm.clone()).with_temperature(0.3);
    let options = PolishOptions::default().with_max_length(800).with_language(OutputLanguage::English);

    let polished = polisher.polish(ABSTRACT, PolishStyle::Academic, &options).await.unwrap();
    assert_eq!(polished, "润色后的文本");

    let request = &llm.requests()[0];
    assert!(request.prompt.contains("6. Please respond in English."));
    let config = request.config.as_ref().unwrap();
    assert_eq!(config.max_output_tokens, Some(800));
    assert_eq!(config.temperature, Some(0.3));
}

#[tokio::test]
async fn custom_without_requirements_never_calls_the_model() {
    let llm = Arc::new(MockLlm::new("mock"));
    let polisher = PolishOrchestrator::new(llm.clone());

    let err = polisher.polish(ABSTRACT, PolishStyle::Custom, &PolishOptions::default()).await.unwrap_err();
    assert!(matches!(err, AssistantError::UnknownStyle(_)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn generation_errors_surface_as_generation_failure() {
    let llm = Arc::new(MockLlm::new("mock").with_failure("invalid api key"));
    let polisher = PolishOrchestrator::new(llm);
    let err = polisher.polish(ABSTRACT, PolishStyle::Light, &PolishOptions::default()).await.unwrap_err();
    assert!(matches!(err, AssistantError::GenerationFailure(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_model_times_out() {
    let llm = Arc::new(MockLlm::new("slow").with_delay(Duration::from_secs(120)));
    let polisher = PolishOrchestrator::new(llm).with_timeout(Duration::from_secs(10));
    let err = polisher.polish(ABSTRACT, PolishStyle::Grammar, &PolishOptions::default()).await.unwrap_err();
    assert!(matches!(err, AssistantError::GenerationFailure(_)));
}
