//! Assembles the two-block context prefix: a stable observation log block
//! (cache-friendly across a session) plus the mutable current-session block.

use anyhow::Result;
use chrono::NaiveDate;

use crate::llm::Message;

use super::entry::today;
use super::journal::ObservationJournal;

const BLOCK1_HEADER: &str = "## Observation Log\n\n";
const BLOCK2_HEADER: &str = "## Current Session\n\n";

pub struct ContextBuilder<'a> {
    journal: &'a ObservationJournal,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(journal: &'a ObservationJournal) -> Self {
        Self { journal }
    }

    /// Block 1: the stable, cacheable observation log prefix. Empty string
    /// if the journal has no entries.
    pub fn build_prefix(&self, today_override: Option<NaiveDate>) -> Result<String> {
        let entries = self.journal.entries()?;
        if entries.is_empty() {
            return Ok(String::new());
        }
        let today = today_override.unwrap_or_else(today);
        let rendered = entries
            .iter()
            .map(|e| e.render(today))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(format!("{}{}", BLOCK1_HEADER, rendered))
    }

    /// Block 1 + Block 2 (current session transcript).
    pub fn build(&self, session_messages: &[Message], today_override: Option<NaiveDate>) -> Result<String> {
        let prefix = self.build_prefix(today_override)?;
        let session_text = format_session(session_messages);

        Ok(match (prefix.is_empty(), session_text.is_empty()) {
            (false, false) => format!("{}\n\n{}{}", prefix, BLOCK2_HEADER, session_text),
            (false, true) => prefix,
            (true, false) => format!("{}{}", BLOCK2_HEADER, session_text),
            (true, true) => String::new(),
        })
    }
}

pub fn format_session(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}]: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::entry::ObservationEntry;
    use crate::memory::priority::Priority;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn journal(dir: &std::path::Path) -> ObservationJournal {
        ObservationJournal::new(dir.join("observations.md"), 0o700)
    }

    fn entry(text: &str) -> ObservationEntry {
        ObservationEntry {
            priority: Priority::Routine,
            observed_on: date("2026-02-20"),
            event_date: date("2026-02-20"),
            text: text.to_string(),
            external: false,
        }
    }

    #[test]
    fn empty_journal_and_session_produce_empty_string() {
        let tmp = tempfile::tempdir().unwrap();
        let j = journal(tmp.path());
        let builder = ContextBuilder::new(&j);
        assert_eq!(builder.build(&[], Some(date("2026-02-20"))).unwrap(), "");
    }

    #[test]
    fn prefix_only_when_session_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let j = journal(tmp.path());
        j.append(&entry("first")).unwrap();
        let builder = ContextBuilder::new(&j);

        let built = builder.build(&[], Some(date("2026-02-20"))).unwrap();
        assert!(built.starts_with(BLOCK1_HEADER));
        assert!(!built.contains(BLOCK2_HEADER));
    }

    #[test]
    fn session_only_when_journal_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let j = journal(tmp.path());
        let builder = ContextBuilder::new(&j);

        let built = builder
            .build(&[Message::user("hello")], Some(date("2026-02-20")))
            .unwrap();
        assert!(built.starts_with(BLOCK2_HEADER));
    }

    #[test]
    fn both_blocks_joined_with_blank_line() {
        let tmp = tempfile::tempdir().unwrap();
        let j = journal(tmp.path());
        j.append(&entry("first")).unwrap();
        let builder = ContextBuilder::new(&j);

        let built = builder
            .build(&[Message::user("hello")], Some(date("2026-02-20")))
            .unwrap();
        assert!(built.contains(BLOCK1_HEADER));
        assert!(built.contains(BLOCK2_HEADER));
        assert!(built.contains("\n\n## Current Session"));
    }
}
