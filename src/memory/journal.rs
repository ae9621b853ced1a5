//! The observation journal: an ordered, append/overwrite-only sequence of
//! [`ObservationEntry`] backed by a single markdown file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::MemoryCoreError;

use super::entry::ObservationEntry;

/// Persistent, ordered list of observations.
///
/// Exclusively owned by the [`super::manager::ContextManager`] for the
/// lifetime of the process; distinct `ObservationJournal`s must not point at
/// the same path, since neither the file nor this type takes any lock.
pub struct ObservationJournal {
    path: PathBuf,
    dir_mode: u32,
}

impl ObservationJournal {
    pub fn new(path: PathBuf, dir_mode: u32) -> Self {
        Self { path, dir_mode }
    }

    fn ensure_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|_| MemoryCoreError::StorageUnavailable(parent.to_path_buf()))?;
                tighten_permissions(parent, self.dir_mode)?;
            }
        }
        if !self.path.exists() {
            fs::write(&self.path, "").with_context(|| format!("failed to touch {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Read the raw file contents, or `""` if the journal does not exist yet.
    pub fn read_raw(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))
    }

    /// Parse the current contents into entries. Unparseable blocks are
    /// skipped silently — this is load-bearing robustness against operator
    /// hand-edits and partial LLM output.
    pub fn entries(&self) -> Result<Vec<ObservationEntry>> {
        Ok(Self::parse(&self.read_raw()?))
    }

    pub fn parse(raw: &str) -> Vec<ObservationEntry> {
        split_blocks(raw)
            .iter()
            .filter_map(|block| match ObservationEntry::parse_block(block) {
                Some(entry) => {
                    debug!(text = %entry.text, "parsed observation block");
                    Some(entry)
                }
                None => {
                    warn!(block = %block, "skipping malformed observation block");
                    None
                }
            })
            .collect()
    }

    /// Append a single entry, separated from the existing tail by exactly
    /// one blank line. O(n) in current file size by design — the journal is
    /// expected to stay well under ~100 KB.
    pub fn append(&self, entry: &ObservationEntry) -> Result<()> {
        self.ensure_file()?;
        let raw = self.read_raw()?;
        let trimmed_end = raw.trim_end_matches('\n');
        let mut new_content = String::with_capacity(trimmed_end.len() + entry.text.len() + 64);
        new_content.push_str(trimmed_end);
        if !trimmed_end.is_empty() {
            new_content.push_str("\n\n");
        }
        new_content.push_str(&entry.serialize());
        new_content.push('\n');
        self.write_atomic(&new_content)
    }

    /// Replace the entire journal contents. Used exclusively by the
    /// Reflector. An empty list produces an empty file.
    pub fn overwrite(&self, entries: &[ObservationEntry]) -> Result<()> {
        self.ensure_file()?;
        let content = if entries.is_empty() {
            String::new()
        } else {
            let mut joined = entries
                .iter()
                .map(|e| e.serialize())
                .collect::<Vec<_>>()
                .join("\n\n");
            joined.push('\n');
            joined
        };
        self.write_atomic(&content)
    }

    /// Cheap trigger signal: `len(bytes) / 4`, never a correctness quantity.
    pub fn token_count_approx(&self) -> Result<usize> {
        Ok(self.read_raw()?.len() / 4)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write-to-temp-then-rename so a crash mid-write never leaves the
    /// journal truncated or half-written.
    fn write_atomic(&self, content: &str) -> Result<()> {
        let tmp_path = self.path.with_extension("md.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to rename into {}", self.path.display()))
    }
}

fn split_blocks(raw: &str) -> Vec<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut blocks = Vec::new();
    let mut start = 0;
    let bytes = trimmed.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut j = i;
            while j < bytes.len() && bytes[j] == b'\n' {
                j += 1;
            }
            if j - i >= 2 {
                blocks.push(trimmed[start..i].trim());
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    blocks.push(trimmed[start..].trim());
    blocks.into_iter().filter(|b| !b.is_empty()).collect()
}

#[cfg(unix)]
fn tighten_permissions(dir: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(mode);
    fs::set_permissions(dir, perms)
        .with_context(|| format!("failed to set permissions on {}", dir.display()))
}

#[cfg(not(unix))]
fn tighten_permissions(_dir: &Path, _mode: u32) -> Result<()> {
    // Owner-only directory permissions are a POSIX concept; best-effort no-op
    // elsewhere.
    Ok(())
}
