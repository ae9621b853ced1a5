//! Observation priority and relative date lag.
//!
//! The on-disk and wire format for priority is a fixed unicode glyph, but a
//! stringly-typed field invites a whole class of bugs (typos, case drift,
//! unordered comparisons). `Priority` is the internal sum type; glyphs only
//! exist at the parse/render boundary in [`super::entry`].

use std::cmp::Ordering;
use std::fmt;

/// Severity of an observation. `Ord` follows declaration order, so
/// `Priority::Critical > Priority::Signal > Priority::Routine` — the order
/// is semantic, not a hint about display position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Routine,
    Signal,
    Critical,
}

impl Priority {
    pub const ROUTINE_GLYPH: &'static str = "🟢";
    pub const SIGNAL_GLYPH: &'static str = "🟡";
    pub const CRITICAL_GLYPH: &'static str = "🔴";

    /// The fixed unicode glyph for this priority.
    pub fn glyph(self) -> &'static str {
        match self {
            Priority::Critical => Self::CRITICAL_GLYPH,
            Priority::Signal => Self::SIGNAL_GLYPH,
            Priority::Routine => Self::ROUTINE_GLYPH,
        }
    }

    /// Parse a leading glyph off of `text`, returning the priority and the
    /// remainder with the glyph and any `:`/`-` separator stripped.
    ///
    /// Returns `None` if `text` does not start with one of the three
    /// glyphs — the caller decides the default in that case.
    pub fn strip_prefix(text: &str) -> Option<(Priority, &str)> {
        for priority in [Priority::Critical, Priority::Signal, Priority::Routine] {
            if let Some(rest) = text.strip_prefix(priority.glyph()) {
                let rest = rest.trim_start_matches([' ', ':', '-']).trim_start();
                return Some((priority, rest));
            }
        }
        None
    }

    /// Parse a bare glyph (no trailing text) into a `Priority`.
    pub fn from_glyph(glyph: &str) -> Option<Priority> {
        match glyph {
            Self::CRITICAL_GLYPH => Some(Priority::Critical),
            Self::SIGNAL_GLYPH => Some(Priority::Signal),
            Self::ROUTINE_GLYPH => Some(Priority::Routine),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// How long ago an event occurred, relative to "today". Derived at render
/// time from `event_date`; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeLag {
    Today,
    OneDayAgo,
    DaysAgo(i64),
}

impl RelativeLag {
    /// Compute the lag for an event that happened `delta_days` days before
    /// `today`. Assumes `event_date <= observed_on` (invariant 1); a
    /// negative `delta_days` is out-of-invariant input and renders as a
    /// negative `N_days_ago`, matching upstream behavior rather than
    /// silently clamping it.
    pub fn from_delta_days(delta_days: i64) -> Self {
        match delta_days.cmp(&1) {
            Ordering::Less if delta_days == 0 => RelativeLag::Today,
            Ordering::Equal => RelativeLag::OneDayAgo,
            _ => RelativeLag::DaysAgo(delta_days),
        }
    }
}

impl fmt::Display for RelativeLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeLag::Today => write!(f, "today"),
            RelativeLag::OneDayAgo => write!(f, "1_day_ago"),
            RelativeLag::DaysAgo(n) => write!(f, "{}_days_ago", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_severity() {
        assert!(Priority::Critical > Priority::Signal);
        assert!(Priority::Signal > Priority::Routine);
    }

    #[test]
    fn strip_prefix_handles_colon_dash_and_plain() {
        assert_eq!(
            Priority::strip_prefix("🟢: done"),
            Some((Priority::Routine, "done"))
        );
        assert_eq!(
            Priority::strip_prefix("🔴- failed"),
            Some((Priority::Critical, "failed"))
        );
        assert_eq!(
            Priority::strip_prefix("🟡 trending up"),
            Some((Priority::Signal, "trending up"))
        );
    }

    #[test]
    fn strip_prefix_none_without_glyph() {
        assert_eq!(Priority::strip_prefix("no glyph here"), None);
    }

    #[test]
    fn relative_lag_boundaries() {
        assert_eq!(RelativeLag::from_delta_days(0), RelativeLag::Today);
        assert_eq!(RelativeLag::from_delta_days(1), RelativeLag::OneDayAgo);
        assert_eq!(RelativeLag::from_delta_days(3), RelativeLag::DaysAgo(3));
        assert_eq!(RelativeLag::from_delta_days(3).to_string(), "3_days_ago");
    }
}
