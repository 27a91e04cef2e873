//! # scholar-assistant
//!
//! Question answering over a loaded paper and template-based text polishing.
//!
//! ## Overview
//!
//! - [`Session`] - owns one indexed document and the conversation memory
//! - [`QaOrchestrator`] - retrieve, prompt, generate, then record the turn
//! - [`PolishOrchestrator`] - polish text with a [`PolishStyle`] template
//!
//! Both orchestrators talk to any [`scholar_model::Llm`], and retrieval goes
//! through a [`scholar_rag::RagPipeline`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scholar_assistant::{QaOrchestrator, Session};
//! use scholar_rag::{HashingEmbeddingProvider, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .build()?;
//! let qa = QaOrchestrator::builder().pipeline(Arc::new(pipeline)).llm(llm).build()?;
//!
//! let mut session = Session::new(Arc::new(qa));
//! session.load_path("paper.pdf".as_ref()).await?;
//! let answer = session.ask("这篇文章的研究方法是什么？").await?;
//! println!("{}", answer.text);
//! ```

pub mod error;
mod generation;
pub mod polish;
pub mod prompt;
pub mod qa;
pub mod session;

pub use error::{AssistantError, Result};
pub use polish::{
    DEFAULT_MAX_LENGTH, MAX_CUSTOM_REQUIREMENTS, OutputLanguage, PRESET_REQUIREMENTS, PolishOptions,
    PolishOrchestrator, PolishStyle, build_polish_prompt,
};
pub use qa::{Answer, DEFAULT_TEMPERATURE, PresetQuestion, QaOrchestrator, QaOrchestratorBuilder};
pub use session::{DocumentSummary, Session};
