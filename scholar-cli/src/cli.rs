use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scholar_assistant::{DEFAULT_MAX_LENGTH, OutputLanguage, PolishStyle, PresetQuestion};
use scholar_model::openai::{DEFAULT_MODEL, OPENAI_API_BASE};
use scholar_telemetry::LogFormat;

/// Default `--timeout`, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Parser)]
#[command(name = "scholar")]
#[command(about = "Ask questions about a paper and polish academic text", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Console log format.
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and sampling settings shared by every command.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// API key for the OpenAI-compatible service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible service.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_API_BASE, global = true)]
    pub base_url: String,

    /// Chat model name.
    #[arg(long, default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Sampling temperature, between 0.0 and 1.0.
    #[arg(long, default_value_t = 0.7, value_parser = parse_temperature, global = true)]
    pub temperature: f32,

    /// Give up on a generation call after this many seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..), global = true)]
    pub timeout: u64,

    /// Embedding backend used to index documents.
    #[arg(long, value_enum, default_value_t = Embedder::Openai, global = true)]
    pub embedder: Embedder,

    /// Embedding model name for the OpenAI backend.
    #[arg(long, global = true)]
    pub embedding_model: Option<String>,
}

impl ModelArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Embedder {
    /// Remote `/embeddings` endpoint.
    Openai,
    /// Local feature hashing, no network.
    Hashing,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a paper and ask questions about it.
    Ask(AskArgs),

    /// Polish a piece of text.
    Polish(PolishArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    /// PDF or plain-text file to load.
    pub file: PathBuf,

    /// Ask one question and exit.
    #[arg(long, short, conflicts_with = "preset")]
    pub question: Option<String>,

    /// Ask a canned question (summary, innovation, method, results) and exit.
    #[arg(long, short)]
    pub preset: Option<PresetQuestion>,

    /// Rewrite follow-up questions into standalone ones before retrieval.
    #[arg(long)]
    pub condense: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PolishArgs {
    /// Polishing style: academic, grammar, light or custom.
    #[arg(long, short)]
    pub style: PolishStyle,

    /// A requirement for the custom style. Repeat for several.
    #[arg(long = "require", short = 'r')]
    pub requirements: Vec<String>,

    /// Reply language: chinese, english or bilingual.
    #[arg(long, short, default_value = "chinese")]
    pub language: OutputLanguage,

    /// Maximum length of the polished text.
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: u32,

    /// Read the text from this file instead of stdin.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Write the result to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn parse_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be between 0.0 and 1.0, got {value}"))
    }
}
