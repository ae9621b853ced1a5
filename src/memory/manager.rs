//! Top-level coordinator: wires together the observation journal, audit
//! chain, sanitizer, observer, reflector, and context builder behind one
//! API surface.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

use crate::llm::{LlmAdapter, Message, Role};

use super::anchor::Anchor;
use super::audit::{AuditChain, AuditSource};
use super::context_builder::{ContextBuilder, format_session};
use super::entry::{ObservationEntry, today};
use super::journal::ObservationJournal;
use super::observer::Observer;
use super::priority::Priority;
use super::reflector::Reflector;
use super::sanitizer::Sanitizer;

/// Tuning knobs mirroring [`crate::config::MemoryCoreConfig`], duplicated
/// here so `ContextManager` can be constructed without a full `Config`.
pub struct ContextManagerConfig {
    pub observer_threshold: usize,
    pub reflector_threshold: usize,
    pub max_entry_chars: usize,
    pub dir_mode: u32,
}

impl Default for ContextManagerConfig {
    fn default() -> Self {
        Self {
            observer_threshold: 30_000,
            reflector_threshold: 40_000,
            max_entry_chars: 2_000,
            dir_mode: 0o700,
        }
    }
}

/// Coordinates the observation journal, audit chain, sanitizer, Observer,
/// Reflector, and context builder for a single agent session.
///
/// ```ignore
/// let ctx = ContextManager::new(
///     "./memory",
///     Box::new(AnthropicAdapter::new(api_key, base_url, model)),
///     ContextManagerConfig::default(),
///     "Summarize security news into a episode script",
/// );
///
/// let system_prompt = ctx.build_prefix(None)? + "\n\nYour task: ...";
/// ctx.add_message("assistant", &response).await?;
/// ```
pub struct ContextManager {
    journal: ObservationJournal,
    audit: AuditChain,
    sanitizer: Sanitizer,
    anchor: Anchor,
    llm: Box<dyn LlmAdapter>,
    config: ContextManagerConfig,
    session_messages: Mutex<Vec<Message>>,
}

impl ContextManager {
    pub fn new(
        storage_path: impl AsRef<Path>,
        llm: Box<dyn LlmAdapter>,
        config: ContextManagerConfig,
        task_anchor: impl Into<String>,
    ) -> Self {
        let storage_path = storage_path.as_ref();
        let journal = ObservationJournal::new(storage_path.join("observations.md"), config.dir_mode);
        let audit = AuditChain::new(storage_path.join("audit.jsonl"));
        let sanitizer = Sanitizer::new(config.max_entry_chars);
        let anchor = Anchor::new(task_anchor);

        Self {
            journal,
            audit,
            sanitizer,
            anchor,
            llm,
            config,
            session_messages: Mutex::new(Vec::new()),
        }
    }

    /// Block 1 only: anchor (if any) + observation log prefix.
    pub fn build_prefix(&self, today_override: Option<NaiveDate>) -> Result<String> {
        let mut parts = Vec::new();
        let anchor_text = self.anchor.render();
        if !anchor_text.is_empty() {
            parts.push(anchor_text);
        }
        let obs_prefix = ContextBuilder::new(&self.journal).build_prefix(today_override)?;
        if !obs_prefix.is_empty() {
            parts.push(obs_prefix);
        }
        Ok(parts.join("\n\n"))
    }

    /// Block 1 + Block 2 (the current, in-memory session transcript).
    pub fn build(&self, today_override: Option<NaiveDate>) -> Result<String> {
        let prefix = self.build_prefix(today_override)?;
        let session_text = {
            let messages = self.session_messages.lock().expect("session lock poisoned");
            format_session(&messages)
        };

        Ok(if !prefix.is_empty() && !session_text.is_empty() {
            format!("{}\n\n## Current Session\n\n{}", prefix, session_text)
        } else if !prefix.is_empty() {
            prefix
        } else if !session_text.is_empty() {
            format!("## Current Session\n\n{}", session_text)
        } else {
            String::new()
        })
    }

    /// Record a message in the current session; auto-triggers the Observer
    /// (and, transitively, the Reflector) once the session token estimate
    /// crosses `observer_threshold`.
    pub async fn add_message(&self, role: Role, content: impl Into<String>) -> Result<()> {
        {
            let mut messages = self.session_messages.lock().expect("session lock poisoned");
            messages.push(Message { role, content: content.into() });
        }

        if self.session_token_count() >= self.config.observer_threshold {
            self.run_observer().await?;
        }
        Ok(())
    }

    /// Manually write an observation to the journal, bypassing the Observer
    /// (and its LLM call). `text` may begin with a priority marker; defaults
    /// to routine if omitted.
    pub fn observe(&self, text: &str, event_date: Option<NaiveDate>) -> Result<ObservationEntry> {
        let (priority, text) = Priority::strip_prefix(text).unwrap_or((Priority::Routine, text));
        let event_date = event_date.unwrap_or_else(today);
        let result = self.sanitizer.sanitize_for_observation(text, None);

        let entry = ObservationEntry {
            priority: if result.was_truncated { Priority::Critical } else { priority },
            observed_on: today(),
            event_date,
            text: result.text,
            external: false,
        };

        let prev = self.journal.read_raw()?;
        self.journal.append(&entry)?;
        self.audit.append(AuditSource::Manual, &prev, &self.journal.read_raw()?)?;
        Ok(entry)
    }

    /// `true` if the journal's current content hashes to the last recorded
    /// audit snapshot.
    pub fn verify_integrity(&self) -> Result<bool> {
        let ok = self.audit.verify(&self.journal.read_raw()?)?;
        if !ok {
            warn!(path = %self.journal.path().display(), "observation journal content does not match last audit snapshot. Tamper detected.");
        }
        Ok(ok)
    }

    /// Run the Reflector unconditionally, bypassing `reflector_threshold`.
    /// For explicit operator-triggered consolidation, as opposed to the
    /// threshold-driven path in `add_message`.
    pub async fn force_reflect(&self) -> Result<bool> {
        let prev = self.journal.read_raw()?;
        let reflector = Reflector::new(self.llm.as_ref(), &self.journal);
        let rewrote = reflector.reflect().await?;
        if rewrote {
            let new = self.journal.read_raw()?;
            self.audit.append(AuditSource::Reflector, &prev, &new)?;
        }
        Ok(rewrote)
    }

    fn session_token_count(&self) -> usize {
        let messages = self.session_messages.lock().expect("session lock poisoned");
        messages.iter().map(|m| m.content.len()).sum::<usize>() / 4
    }

    async fn run_observer(&self) -> Result<()> {
        let messages = {
            let mut messages = self.session_messages.lock().expect("session lock poisoned");
            std::mem::take(&mut *messages)
        };

        let prev = self.journal.read_raw()?;
        let observer = Observer::new(self.llm.as_ref(), &self.journal, &self.sanitizer);
        observer.compress(&messages, None).await?;

        let new = self.journal.read_raw()?;
        if new != prev {
            self.audit.append(AuditSource::Observer, &prev, &new)?;
        }

        self.maybe_reflect().await
    }

    async fn maybe_reflect(&self) -> Result<()> {
        if self.journal.token_count_approx()? >= self.config.reflector_threshold {
            let prev = self.journal.read_raw()?;
            let reflector = Reflector::new(self.llm.as_ref(), &self.journal);
            if reflector.reflect().await? {
                let new = self.journal.read_raw()?;
                self.audit.append(AuditSource::Reflector, &prev, &new)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeLlmAdapter;

    fn manager(dir: &Path, llm: FakeLlmAdapter, config: ContextManagerConfig) -> ContextManager {
        ContextManager::new(dir, Box::new(llm), config, "")
    }

    #[test]
    fn observe_writes_entry_and_records_audit() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path(), FakeLlmAdapter::new(""), ContextManagerConfig::default());

        let entry = mgr.observe("🔴 token expired", None).unwrap();
        assert_eq!(entry.priority, Priority::Critical);
        assert!(mgr.verify_integrity().unwrap());
    }

    #[test]
    fn verify_integrity_fails_after_out_of_band_tamper() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path(), FakeLlmAdapter::new(""), ContextManagerConfig::default());
        mgr.observe("run completed", None).unwrap();

        std::fs::write(tmp.path().join("observations.md"), "tampered\n").unwrap();
        assert!(!mgr.verify_integrity().unwrap());
    }

    #[test]
    fn build_prefix_includes_anchor_and_observations() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = ContextManager::new(
            tmp.path(),
            Box::new(FakeLlmAdapter::new("")),
            ContextManagerConfig::default(),
            "write a summary",
        );
        mgr.observe("🟢 started run", None).unwrap();

        let prefix = mgr.build_prefix(None).unwrap();
        assert!(prefix.starts_with("## Task Anchor"));
        assert!(prefix.contains("## Observation Log"));
    }

    #[tokio::test]
    async fn add_message_triggers_observer_past_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = FakeLlmAdapter::new("🟢 summarized session");
        let mut config = ContextManagerConfig::default();
        config.observer_threshold = 1;
        let mgr = manager(tmp.path(), llm, config);

        mgr.add_message(Role::User, "hello there").await.unwrap();

        let entries = mgr.build_prefix(None).unwrap();
        assert!(entries.contains("summarized session"));
    }
}
