//! Compresses a session's transcript into observation entries.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

use crate::llm::{LlmAdapter, Message};

use super::entry::{ObservationEntry, today};
use super::journal::ObservationJournal;
use super::priority::Priority;
use super::sanitizer::Sanitizer;

const SYSTEM_PROMPT: &str = "\
You are a memory extraction agent for an AI agent system.

Read the conversation messages below and extract key observations: facts, decisions, \
errors, warnings, and patterns that would be useful in future runs.

Format each observation as a single line starting with a priority marker:
  🔴  critical issues that MUST influence the next run (errors, failures, expired tokens, \
blocked paths)
  🟡  patterns and signals worth tracking (trends, anomalies, recurring themes)
  🟢  routine context (timing, metadata, completions, normal outcomes)

Rules:
- One observation per line, maximum ~200 characters
- Start each line with the emoji and a space, then the observation text
- Only include observations useful in future runs — skip pleasantries and ephemeral details
- If nothing is worth recording, return an empty response";

pub struct Observer<'a> {
    llm: &'a dyn LlmAdapter,
    journal: &'a ObservationJournal,
    sanitizer: &'a Sanitizer,
}

impl<'a> Observer<'a> {
    pub fn new(llm: &'a dyn LlmAdapter, journal: &'a ObservationJournal, sanitizer: &'a Sanitizer) -> Self {
        Self { llm, journal, sanitizer }
    }

    /// Compress `messages` into observations and append them to the journal.
    /// Makes no LLM call and returns an empty vec if `messages` is empty.
    pub async fn compress(
        &self,
        messages: &[Message],
        event_date: Option<NaiveDate>,
    ) -> Result<Vec<ObservationEntry>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let today = today();
        let event_date = event_date.unwrap_or(today);

        let formatted = messages
            .iter()
            .map(|m| format!("[{}]: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let response = self
            .llm
            .call(&[Message::user(formatted)], SYSTEM_PROMPT)
            .await?;

        Ok(self.parse_and_write(&response, today, event_date))
    }

    fn parse_and_write(&self, response: &str, today: NaiveDate, event_date: NaiveDate) -> Vec<ObservationEntry> {
        let mut written = Vec::new();

        for line in response.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((priority, text)) = Priority::strip_prefix(line) else {
                debug!(line = %line, "discarding observer line without a priority marker");
                continue;
            };

            let result = self.sanitizer.sanitize_for_observation(text, None);
            let priority = if result.was_truncated { Priority::Critical } else { priority };

            let entry = ObservationEntry {
                priority,
                observed_on: today,
                event_date,
                text: result.text,
                external: false,
            };

            if self.journal.append(&entry).is_ok() {
                written.push(entry);
            }
        }

        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeLlmAdapter;

    fn journal(dir: &std::path::Path) -> ObservationJournal {
        ObservationJournal::new(dir.join("observations.md"), 0o700)
    }

    #[tokio::test]
    async fn empty_messages_short_circuits_without_llm_call() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = FakeLlmAdapter::new("🟢 should not be seen");
        let j = journal(tmp.path());
        let sanitizer = Sanitizer::new(super::super::sanitizer::DEFAULT_MAX_ENTRY_CHARS);
        let observer = Observer::new(&llm, &j, &sanitizer);

        let entries = observer.compress(&[], None).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn parses_multiple_priority_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = FakeLlmAdapter::new("🔴 token expired\n🟢 run completed\nno marker here");
        let j = journal(tmp.path());
        let sanitizer = Sanitizer::new(super::super::sanitizer::DEFAULT_MAX_ENTRY_CHARS);
        let observer = Observer::new(&llm, &j, &sanitizer);

        let entries = observer.compress(&[Message::user("did stuff")], None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].priority, Priority::Critical);
        assert_eq!(entries[0].text, "token expired");
        assert_eq!(entries[1].priority, Priority::Routine);

        let persisted = j.entries().unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[tokio::test]
    async fn truncated_entry_is_upgraded_to_critical() {
        let tmp = tempfile::tempdir().unwrap();
        let long_text = "a".repeat(3_000);
        let llm = FakeLlmAdapter::new(format!("🟢 {}", long_text));
        let j = journal(tmp.path());
        let sanitizer = Sanitizer::new(100);
        let observer = Observer::new(&llm, &j, &sanitizer);

        let entries = observer.compress(&[Message::user("hi")], None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].priority, Priority::Critical);
        assert!(entries[0].text.ends_with("… [TRUNCATED]"));
    }
}
