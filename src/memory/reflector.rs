//! Consolidates the observation journal in place.

use anyhow::Result;
use tracing::warn;

use crate::llm::{LlmAdapter, Message};

use super::journal::ObservationJournal;

const SYSTEM_PROMPT: &str = "\
You are a memory consolidation agent for an AI agent system.

You will receive an observation log. Your job is to consolidate it:
1. Merge related or redundant observations into single, more precise entries
2. Remove observations that have been fully superseded by newer ones
3. Preserve all three priority markers (🔴, 🟡, 🟢) exactly as-is
4. For merged entries, keep the most recent observed_on date and the earliest event_date
5. Keep every 🔴 entry unless it is genuinely superseded and resolved

Return the consolidated log in EXACTLY this format — no other text:

PRIORITY observed_on:YYYY-MM-DD event_date:YYYY-MM-DD
Observation text here

PRIORITY observed_on:YYYY-MM-DD event_date:YYYY-MM-DD [EXT]
External observation text here

Separate each entry with a single blank line.";

pub struct Reflector<'a> {
    llm: &'a dyn LlmAdapter,
    journal: &'a ObservationJournal,
}

impl<'a> Reflector<'a> {
    pub fn new(llm: &'a dyn LlmAdapter, journal: &'a ObservationJournal) -> Self {
        Self { llm, journal }
    }

    /// Consolidate the journal in place. Returns `false` (and leaves the
    /// journal untouched) if it was already empty, or if the LLM response
    /// produced zero parseable entries — the one safety gate standing
    /// between a malformed response and silently wiping the journal.
    pub async fn reflect(&self) -> Result<bool> {
        let raw = self.journal.read_raw()?;
        if raw.trim().is_empty() {
            return Ok(false);
        }

        let original_entries = self.journal.entries()?;
        if original_entries.is_empty() {
            return Ok(false);
        }

        let response = self.llm.call(&[Message::user(raw)], SYSTEM_PROMPT).await?;
        let new_entries = ObservationJournal::parse(&response);

        if new_entries.is_empty() {
            warn!("reflector response parsed to zero entries, skipping journal rewrite");
            return Ok(false);
        }

        self.journal.overwrite(&new_entries)?;
        Ok(true)
    }
}
