//! # scholar-model
//!
//! Language model integrations for Scholar.
//!
//! ## Overview
//!
//! Everything that generates text implements the [`Llm`] trait, so the
//! question answering and polishing orchestrators never depend on a concrete
//! provider:
//!
//! - [`OpenAIClient`] - OpenAI and OpenAI-compatible chat APIs (feature `openai`)
//! - [`MockLlm`] - scripted replies for tests and offline runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scholar_model::{GenerateConfig, Llm, LlmRequest};
//! use scholar_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(api_key, "gpt-3.5-turbo"))?;
//! let request = LlmRequest::new("Summarise this abstract: ...")
//!     .with_config(GenerateConfig::default().with_temperature(0.7));
//! let response = model.generate(request).await?;
//! println!("{}", response.text);
//! ```

pub mod error;
pub mod llm;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use error::{ModelError, Result};
pub use llm::{GenerateConfig, Llm, LlmRequest, LlmResponse, Usage};
pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::{OpenAIClient, OpenAIConfig};
