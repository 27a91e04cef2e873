//! Retrieval-augmented question answering over one indexed document.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use scholar_memory::ConversationMemory;
use scholar_model::{GenerateConfig, Llm, LlmRequest};
use scholar_rag::{RagPipeline, SearchResult, VectorIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::error::{AssistantError, Result};
use crate::generation::generate;
use crate::prompt::{condense_prompt, qa_prompt};

/// Default sampling temperature for answers.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Canned questions offered next to free-form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetQuestion {
    /// Summarise the main content.
    Summary,
    /// Ask for the novel contributions.
    Innovation,
    /// Ask for the research method.
    Method,
    /// Ask for the experimental results.
    Results,
}

impl PresetQuestion {
    /// Every preset, in menu order.
    pub const ALL: [PresetQuestion; 4] = [Self::Summary, Self::Innovation, Self::Method, Self::Results];

    /// The question text sent to the model.
    pub fn question(self) -> &'static str {
        match self {
            Self::Summary => "总结这篇文章的主要内容",
            Self::Innovation => "这篇文章的创新点是什么？",
            Self::Method => "这篇文章的研究方法是什么？",
            Self::Results => "这篇文章的实验结果如何？",
        }
    }

    /// Short name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Innovation => "innovation",
            Self::Method => "method",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for PresetQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetQuestion {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s) || p.question() == s)
            .ok_or_else(|| AssistantError::InvalidConfig(format!("unknown preset question '{s}'")))
    }
}

/// The outcome of a successful [`QaOrchestrator::answer`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// The generated answer.
    pub text: String,
    /// Chunks the answer was conditioned on, best first.
    pub sources: Vec<SearchResult>,
    /// Ordinal of the turn recorded in memory.
    pub turn: usize,
    /// The standalone question used for retrieval, when condensing rewrote it.
    pub standalone_question: Option<String>,
}

/// Answers questions about an indexed document, keeping conversation memory.
///
/// Each call embeds the question with the pipeline's provider, retrieves the
/// top chunks, builds a prompt from them plus the whole prior conversation and
/// asks the model. The turn is recorded only after the answer exists, so a
/// failed, timed-out or dropped call leaves memory unchanged.
///
/// # Example
///
/// ```rust,ignore
/// let qa = QaOrchestrator::builder()
///     .pipeline(Arc::new(pipeline))
///     .llm(Arc::new(model))
///     .timeout(Duration::from_secs(60))
///     .build()?;
///
/// let answer = qa.answer("这篇文章的创新点是什么？", &mut memory, &index).await?;
/// ```
pub struct QaOrchestrator {
    pipeline: Arc<RagPipeline>,
    llm: Arc<dyn Llm>,
    generate_config: GenerateConfig,
    timeout: Option<Duration>,
    condense_question: bool,
}

impl fmt::Debug for QaOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QaOrchestrator")
            .field("model", &self.llm.name())
            .field("generate_config", &self.generate_config)
            .field("timeout", &self.timeout)
            .field("condense_question", &self.condense_question)
            .finish_non_exhaustive()
    }
}

impl QaOrchestrator {
    /// Create a new [`QaOrchestratorBuilder`].
    pub fn builder() -> QaOrchestratorBuilder {
        QaOrchestratorBuilder::default()
    }

    /// The retrieval pipeline used for indexing and retrieval.
    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    /// The language model answering questions.
    pub fn llm(&self) -> &Arc<dyn Llm> {
        &self.llm
    }

    /// Answer `question` about the document in `index`.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::InvalidConfig`] for a blank question.
    /// - [`AssistantError::EmptyIndex`] when `index` holds no chunks.
    /// - [`AssistantError::EmbeddingFailure`] when the question cannot be embedded.
    /// - [`AssistantError::GenerationFailure`] when the model fails or times out.
    #[instrument(skip_all, fields(turn = memory.len() + 1, model = self.llm.name()))]
    pub async fn answer(
        &self,
        question: &str,
        memory: &mut ConversationMemory,
        index: &VectorIndex,
    ) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::InvalidConfig("question must not be empty".to_string()));
        }
        if index.is_empty() {
            return Err(AssistantError::EmptyIndex);
        }

        let standalone_question = if self.condense_question && !memory.is_empty() {
            Some(self.condense(question, memory).await?)
        } else {
            None
        };
        let retrieval_query = standalone_question.as_deref().unwrap_or(question);

        let sources = self.pipeline.retrieve(index, retrieval_query).await.inspect_err(|e| {
            error!(error = %e, "retrieval failed");
        })?;
        debug!(source_count = sources.len(), "retrieved context");

        let prompt = qa_prompt(&sources, memory.history(), question);
        let request = LlmRequest::new(prompt).with_config(self.generate_config.clone());
        let response = generate(self.llm.as_ref(), request, self.timeout).await.inspect_err(|e| {
            error!(error = %e, "answer generation failed");
        })?;

        let turn = memory.append(question, response.text.clone()).ordinal;
        info!(turn, source_count = sources.len(), answer_len = response.text.chars().count(), "answered question");

        Ok(Answer { text: response.text, sources, turn, standalone_question })
    }

    /// Rewrite a follow-up question into a standalone one using the history.
    async fn condense(&self, question: &str, memory: &ConversationMemory) -> Result<String> {
        let prompt = condense_prompt(memory.history(), question);
        // Greedy sampling for the rewrite; token cap is shared with answers.
        let config = GenerateConfig { temperature: Some(0.0), ..self.generate_config.clone() };
        let response =
            generate(self.llm.as_ref(), LlmRequest::new(prompt).with_config(config), self.timeout).await?;
        let rewritten = response.text.trim().to_string();
        debug!(question_len = rewritten.chars().count(), "condensed follow-up question");
        Ok(rewritten)
    }
}

/// Builder for [`QaOrchestrator`]. `pipeline` and `llm` are required.
#[derive(Default)]
pub struct QaOrchestratorBuilder {
    pipeline: Option<Arc<RagPipeline>>,
    llm: Option<Arc<dyn Llm>>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    timeout: Option<Duration>,
    condense_question: bool,
}

impl QaOrchestratorBuilder {
    /// Set the retrieval pipeline.
    pub fn pipeline(mut self, pipeline: Arc<RagPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the language model.
    pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Sampling temperature; defaults to [`DEFAULT_TEMPERATURE`].
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap on generated tokens per answer.
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Fail generation calls that take longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub fn condense_question(mut self, enabled: bool) -> Self {
        self.condense_question = enabled;
        self
    }

    /// Build the [`QaOrchestrator`].
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::InvalidConfig`] if a required component is
    /// missing, the sampling parameters are out of range or the timeout is zero.
    pub fn build(self) -> Result<QaOrchestrator> {
        let pipeline = self
            .pipeline
            .ok_or_else(|| AssistantError::InvalidConfig("pipeline is required".to_string()))?;
        let llm = self.llm.ok_or_else(|| AssistantError::InvalidConfig("llm is required".to_string()))?;

        let generate_config = GenerateConfig {
            temperature: Some(self.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            max_output_tokens: self.max_output_tokens,
        };
        generate_config.validate().map_err(|e| AssistantError::InvalidConfig(e.to_string()))?;

        if self.timeout == Some(Duration::ZERO) {
            return Err(AssistantError::InvalidConfig("timeout must be greater than zero".to_string()));
        }

        Ok(QaOrchestrator {
            pipeline,
            llm,
            generate_config,
            timeout: self.timeout,
            condense_question: self.condense_question,
        })
    }
}

#[cfg(test)]
mod tests {
    use scholar_model::MockLlm;
    use scholar_rag::HashingEmbeddingProvider;

    use super::*;

    fn pipeline() -> Arc<RagPipeline> {
        Arc::new(
            RagPipeline::builder()
                .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn builder_requires_llm_and_pipeline() {
        assert!(matches!(QaOrchestrator::builder().build(), Err(AssistantError::InvalidConfig(_))));
        assert!(matches!(
            QaOrchestrator::builder().pipeline(pipeline()).build(),
            Err(AssistantError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builder_rejects_bad_sampling_and_timeout() {
        let base = || QaOrchestrator::builder().pipeline(pipeline()).llm(Arc::new(MockLlm::new("m")));
        assert!(base().temperature(3.0).build().is_err());
        assert!(base().max_output_tokens(0).build().is_err());
        assert!(base().timeout(Duration::ZERO).build().is_err());
        assert!(base().temperature(0.2).timeout(Duration::from_secs(1)).build().is_ok());
    }

    #[test]
    fn presets_parse_from_name_or_question() {
        assert_eq!("summary".parse::<PresetQuestion>().unwrap(), PresetQuestion::Summary);
        assert_eq!("Method".parse::<PresetQuestion>().unwrap(), PresetQuestion::Method);
        assert_eq!("这篇文章的实验结果如何？".parse::<PresetQuestion>().unwrap(), PresetQuestion::Results);
        assert!("weather".parse::<PresetQuestion>().is_err());
        assert_eq!(PresetQuestion::Innovation.to_string(), "innovation");
    }

    #[tokio::test]
    async fn blank_question_is_rejected_without_calling_the_model() {
        let llm = Arc::new(MockLlm::new("m"));
        let qa = QaOrchestrator::builder().pipeline(pipeline()).llm(llm.clone()).build().unwrap();
        let mut memory = ConversationMemory::new();

        let err = qa.answer("   ", &mut memory, &VectorIndex::empty()).await.unwrap_err();
        assert!(matches!(err, AssistantError::InvalidConfig(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_index_is_rejected() {
        let qa = QaOrchestrator::builder().pipeline(pipeline()).llm(Arc::new(MockLlm::new("m"))).build().unwrap();
        let mut memory = ConversationMemory::new();
        let err = qa.answer("what?", &mut memory, &VectorIndex::empty()).await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyIndex));
        assert!(memory.is_empty());
    }
}
