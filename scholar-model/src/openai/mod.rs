//! OpenAI-compatible chat completion provider.
//!
//! Works with the OpenAI API and any server exposing the same
//! `/chat/completions` surface (vLLM, Ollama, LM Studio, ...).
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY")?,
//!     "gpt-3.5-turbo",
//! ))?;
//! ```

mod client;
mod config;

pub use client::OpenAIClient;
pub use config::{DEFAULT_MODEL, OPENAI_API_BASE, OpenAIConfig};
