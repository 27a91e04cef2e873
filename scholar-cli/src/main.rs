//! `scholar`: question answering over papers and academic text polishing.
//!
//! ```text
//! scholar ask paper.pdf                       # interactive
//! scholar ask paper.pdf --preset summary      # one-shot
//! scholar polish --style academic -i draft.txt -o polished.txt
//! ```
//!
//! Settings come from flags, the environment (`OPENAI_API_KEY`,
//! `OPENAI_BASE_URL`) and a `.env` file in the working directory.

mod cli;
mod output;
mod repl;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use scholar_assistant::{PolishOptions, PolishOrchestrator, PolishStyle, QaOrchestrator, Session};
use scholar_model::{Llm, OpenAIClient, OpenAIConfig};
use scholar_rag::{EmbeddingProvider, HashingEmbeddingProvider, OpenAIEmbeddingProvider, RagPipeline};
use scholar_telemetry::{LogTarget, TelemetryConfig};
use tracing::{info, warn};

use crate::cli::{AskArgs, Cli, Commands, Embedder, ModelArgs, PolishArgs};

/// Log filter when `RUST_LOG` is unset.
const CLI_LOG_FILTER: &str = "warn";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    scholar_telemetry::init_with_config(
        TelemetryConfig::new("scholar")
            .with_format(cli.log_format)
            .with_target(LogTarget::Stderr)
            .with_default_filter(CLI_LOG_FILTER),
    )?;

    match cli.command {
        Commands::Ask(args) => ask(&cli.model, args).await,
        Commands::Polish(args) => polish(&cli.model, args).await,
    }
}

async fn ask(model: &ModelArgs, args: AskArgs) -> Result<()> {
    let llm = build_llm(model)?;
    let pipeline = RagPipeline::builder()
        .embedding_provider(build_embedder(model)?)
        .build()
        .context("invalid retrieval settings")?;
    let qa = QaOrchestrator::builder()
        .pipeline(Arc::new(pipeline))
        .llm(llm)
        .temperature(model.temperature)
        .timeout(model.timeout())
        .condense_question(args.condense)
        .build()
        .context("invalid question answering settings")?;

    let mut session = Session::new(Arc::new(qa));
    let summary = session
        .load_path(&args.file)
        .await
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    output::print_summary(summary);
    info!(session.id = %session.id(), "session started");

    let answer = match (args.question, args.preset) {
        (Some(question), _) => session.ask(&question).await?,
        (None, Some(preset)) => session.ask_preset(preset).await?,
        (None, None) => return repl::run(&mut session).await,
    };
    output::print_answer(&answer);
    Ok(())
}

async fn polish(model: &ModelArgs, args: PolishArgs) -> Result<()> {
    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("nothing to polish: the input is empty");
    }
    if args.style != PolishStyle::Custom && !args.requirements.is_empty() {
        warn!(style = %args.style, "--require only applies to the custom style; ignoring");
    }

    let options = args
        .requirements
        .iter()
        .fold(PolishOptions::default(), |options, r| options.with_requirement(r.as_str()))
        .with_max_length(args.max_length)
        .with_language(args.language);

    let orchestrator = PolishOrchestrator::new(build_llm(model)?)
        .with_temperature(model.temperature)
        .with_timeout(model.timeout());
    let polished = orchestrator.polish(&text, args.style, &options).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &polished).with_context(|| format!("failed to write {}", path.display()))?;
            println!("polished text written to {}", path.display());
        }
        None => println!("{polished}"),
    }
    Ok(())
}

fn api_key(model: &ModelArgs) -> Result<&str> {
    model
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .context("no API key: pass --api-key or set OPENAI_API_KEY")
}

fn build_llm(model: &ModelArgs) -> Result<Arc<dyn Llm>> {
    let config = OpenAIConfig::new(api_key(model)?, &model.model).with_base_url(&model.base_url);
    let client = OpenAIClient::new(config).context("failed to create chat client")?;
    Ok(Arc::new(client))
}

fn build_embedder(model: &ModelArgs) -> Result<Arc<dyn EmbeddingProvider>> {
    match model.embedder {
        Embedder::Hashing => Ok(Arc::new(HashingEmbeddingProvider::default())),
        Embedder::Openai => {
            let mut provider = OpenAIEmbeddingProvider::new(api_key(model)?)
                .context("failed to create embedding client")?
                .with_base_url(&model.base_url);
            if let Some(name) = &model.embedding_model {
                provider = provider.with_model(name);
            }
            Ok(Arc::new(provider))
        }
    }
}
