//! memoryctx - tamper-evident observation journaling and context assembly
//! for agentic LLM pipelines.
//!
//! A `ContextManager` owns a markdown observation journal, a hash-snapshot
//! audit trail, a prompt-injection sanitizer, and two LLM-driven
//! compression stages (Observer, Reflector) that keep that journal within a
//! token budget across long-running sessions.

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod paths;

pub use config::Config;
pub use memory::{ContextManager, ContextManagerConfig};
