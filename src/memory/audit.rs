//! Append-only, snapshot-hashed audit log.
//!
//! Each entry records the SHA-256 of the journal's raw content *after* a
//! mutation. `verify` re-hashes the current journal and compares against the
//! last recorded hash — this detects edits made outside the supported API,
//! but (deliberately, unlike `localgpt::security::audit`'s `prev_entry_sha256`
//! chain) does not itself chain entries together: each snapshot stands
//! alone, verified against the journal as it exists right now.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Who triggered a journal mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSource {
    Observer,
    Reflector,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO 8601 UTC timestamp of the mutation.
    pub timestamp: String,
    pub source: AuditSource,
    /// `len(new_content) - len(previous_content)`, in chars.
    pub char_delta: i64,
    /// Hex-encoded SHA-256 of the journal content after the write.
    pub sha256: String,
}

/// Append-only JSONL log of journal snapshot hashes.
pub struct AuditChain {
    path: PathBuf,
}

impl AuditChain {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn ensure_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        if !self.path.exists() {
            fs::write(&self.path, "")
                .with_context(|| format!("failed to touch {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Record a snapshot of `new_content` after a mutation attributed to
    /// `source`.
    pub fn append(
        &self,
        source: AuditSource,
        previous_content: &str,
        new_content: &str,
    ) -> Result<AuditEntry> {
        self.ensure_file()?;

        let entry = AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source,
            char_delta: new_content.chars().count() as i64 - previous_content.chars().count() as i64,
            sha256: hash_content(new_content),
        };

        let json = serde_json::to_string(&entry).context("failed to serialize audit entry")?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{}", json).context("failed to write audit entry")?;

        Ok(entry)
    }

    /// Read and parse every entry. Corrupted lines are skipped (the audit
    /// log never fails a caller over its own malformed history).
    pub fn all_entries(&self) -> Result<Vec<AuditEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        Ok(content
            .lines()
            .filter(|l| !l.is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }

    pub fn last_entry(&self) -> Result<Option<AuditEntry>> {
        Ok(self.all_entries()?.into_iter().next_back())
    }

    pub fn last_hash(&self) -> Result<Option<String>> {
        Ok(self.last_entry()?.map(|e| e.sha256))
    }

    /// `true` if `current_content` hashes to the last recorded snapshot, or
    /// if no audit history exists yet (nothing to verify against).
    pub fn verify(&self, current_content: &str) -> Result<bool> {
        match self.last_hash()? {
            None => Ok(true),
            Some(last) => Ok(hash_content(current_content) == last),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(dir: &Path) -> AuditChain {
        AuditChain::new(dir.join("audit.jsonl"))
    }

    #[test]
    fn append_records_post_mutation_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        let entry = c.append(AuditSource::Manual, "", "hello").unwrap();
        assert_eq!(entry.sha256, hash_content("hello"));
        assert_eq!(entry.char_delta, 5);
    }

    #[test]
    fn verify_true_when_no_history() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        assert!(c.verify("anything").unwrap());
    }

    #[test]
    fn verify_true_after_matching_mutation() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        c.append(AuditSource::Observer, "", "journal contents").unwrap();
        assert!(c.verify("journal contents").unwrap());
    }

    #[test]
    fn verify_false_after_out_of_band_edit() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        c.append(AuditSource::Observer, "", "journal contents").unwrap();
        assert!(!c.verify("tampered content").unwrap());
    }

    #[test]
    fn entries_serialize_snake_case_source() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        c.append(AuditSource::Reflector, "a", "ab").unwrap();
        let raw = fs::read_to_string(c.path()).unwrap();
        assert!(raw.contains("\"reflector\""));
    }

    #[test]
    fn corrupted_line_skipped_on_read() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        c.append(AuditSource::Manual, "", "one").unwrap();
        let mut file = fs::OpenOptions::new().append(true).open(c.path()).unwrap();
        writeln!(file, "not json").unwrap();
        drop(file);
        c.append(AuditSource::Manual, "one", "one two").unwrap();

        let entries = c.all_entries().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn last_hash_tracks_most_recent_append() {
        let tmp = tempfile::tempdir().unwrap();
        let c = chain(tmp.path());
        c.append(AuditSource::Manual, "", "a").unwrap();
        c.append(AuditSource::Manual, "a", "ab").unwrap();
        assert_eq!(c.last_hash().unwrap().unwrap(), hash_content("ab"));
    }
}
