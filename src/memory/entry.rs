//! The atomic unit of the observation journal.

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use super::priority::{Priority, RelativeLag};

/// Matches: `<GLYPH> observed_on:DATE event_date:DATE [relative:X]? [EXT]?`
///
/// The `relative:` group is accepted and discarded on parse (legacy content
/// may carry it) but is never emitted by [`ObservationEntry::serialize`].
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?P<glyph>🔴|🟡|🟢)
        \s+observed_on:(?P<observed_on>\d{4}-\d{2}-\d{2})
        \s+event_date:(?P<event_date>\d{4}-\d{2}-\d{2})
        (?:\s+relative:\S+)?
        (?P<ext>\s+\[EXT\])?
        \s*$
        ",
    )
    .expect("header regex is a compile-time constant")
});

/// A single priority-tagged observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationEntry {
    pub priority: Priority,
    pub observed_on: NaiveDate,
    pub event_date: NaiveDate,
    pub text: String,
    pub external: bool,
}

impl ObservationEntry {
    /// Days between `event_date` and `today`, mapped to a `RelativeLag`.
    pub fn relative_lag(&self, today: NaiveDate) -> RelativeLag {
        let delta = (today - self.event_date).num_days();
        RelativeLag::from_delta_days(delta)
    }

    /// Storage form written to the journal file. Never includes `relative:`
    /// — that field is computed fresh on every render (invariant 4).
    pub fn serialize(&self) -> String {
        let ext = if self.external { " [EXT]" } else { "" };
        format!(
            "{} observed_on:{} event_date:{}{}\n{}",
            self.priority, self.observed_on, self.event_date, ext, self.text
        )
    }

    /// Rendered form injected into the context window — includes the
    /// dynamically computed `relative:` lag.
    pub fn render(&self, today: NaiveDate) -> String {
        let ext = if self.external { " [EXT]" } else { "" };
        let relative = self.relative_lag(today);
        format!(
            "{} observed_on:{} event_date:{} relative:{}{}\n{}",
            self.priority, self.observed_on, self.event_date, relative, ext, self.text
        )
    }

    /// Parse one journal block (header line + rest-of-block text) into an
    /// entry. Returns `None` on any mismatch — the journal parser skips
    /// unparseable blocks silently rather than failing the whole read.
    pub fn parse_block(block: &str) -> Option<ObservationEntry> {
        let mut parts = block.splitn(2, '\n');
        let header = parts.next()?.trim_end();
        let text = parts.next().unwrap_or("").trim().to_string();

        let caps = HEADER_RE.captures(header)?;
        let priority = Priority::from_glyph(&caps["glyph"])?;
        let observed_on = NaiveDate::parse_from_str(&caps["observed_on"], "%Y-%m-%d").ok()?;
        let event_date = NaiveDate::parse_from_str(&caps["event_date"], "%Y-%m-%d").ok()?;
        let external = caps.name("ext").is_some();

        Some(ObservationEntry {
            priority,
            observed_on,
            event_date,
            text,
            external,
        })
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
