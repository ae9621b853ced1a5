use clap::{Parser, Subcommand};

pub mod memory;

#[derive(Parser)]
#[command(name = "memoryctx", about = "Tamper-evident observation journaling for agentic LLM pipelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Observation journal operations
    Memory(memory::MemoryArgs),
}
