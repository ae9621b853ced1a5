use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::llm::{AnthropicAdapter, FakeLlmAdapter, LlmAdapter, OpenAiAdapter};
use crate::memory::{ContextManager, ContextManagerConfig};

#[derive(Args)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub command: MemoryCommands,
}

#[derive(Subcommand)]
pub enum MemoryCommands {
    /// Write a manual observation (optionally prefixed with 🔴/🟡/🟢)
    Observe {
        text: String,

        /// Event date in YYYY-MM-DD form, defaults to today
        #[arg(long)]
        event_date: Option<String>,
    },

    /// Consolidate the observation journal via the configured LLM provider
    Reflect,

    /// Print the Block 1 context prefix
    Prefix,

    /// Verify the journal against the last recorded audit snapshot
    Verify,
}

pub async fn run(args: MemoryArgs) -> Result<()> {
    let config = Config::load(crate::paths::Paths::resolve()?)?;
    let ctx = build_context_manager(&config)?;

    match args.command {
        MemoryCommands::Observe { text, event_date } => observe(&ctx, &text, event_date.as_deref()),
        MemoryCommands::Reflect => reflect(&ctx).await,
        MemoryCommands::Prefix => prefix(&ctx),
        MemoryCommands::Verify => verify(&ctx),
    }
}

fn build_context_manager(config: &Config) -> Result<ContextManager> {
    let llm: Box<dyn LlmAdapter> = if let Some(anthropic) = &config.providers.anthropic {
        Box::new(AnthropicAdapter::new(
            anthropic.api_key.clone(),
            anthropic.base_url.clone(),
            anthropic.model.clone(),
        ))
    } else if let Some(openai) = &config.providers.openai {
        Box::new(OpenAiAdapter::new(openai.api_key.clone(), openai.base_url.clone(), openai.model.clone()))
    } else {
        Box::new(FakeLlmAdapter::new(""))
    };

    let manager_config = ContextManagerConfig {
        observer_threshold: config.memory.observer_threshold,
        reflector_threshold: config.memory.reflector_threshold,
        max_entry_chars: config.memory.max_entry_chars,
        dir_mode: config.memory.dir_mode,
    };

    Ok(ContextManager::new(config.storage_path(), llm, manager_config, ""))
}

fn observe(ctx: &ContextManager, text: &str, event_date: Option<&str>) -> Result<()> {
    let event_date = event_date
        .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?;
    let entry = ctx.observe(text, event_date)?;
    println!("recorded: {}", entry.serialize());
    Ok(())
}

async fn reflect(ctx: &ContextManager) -> Result<()> {
    let rewrote = ctx.force_reflect().await?;
    if rewrote {
        println!("journal consolidated");
    } else {
        println!("nothing to consolidate");
    }
    Ok(())
}

fn prefix(ctx: &ContextManager) -> Result<()> {
    let prefix = ctx.build_prefix(None)?;
    if prefix.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", prefix);
    }
    Ok(())
}

fn verify(ctx: &ContextManager) -> Result<()> {
    if ctx.verify_integrity()? {
        println!("ok");
        Ok(())
    } else {
        anyhow::bail!("journal integrity check failed: on-disk content does not match the last audit snapshot")
    }
}
