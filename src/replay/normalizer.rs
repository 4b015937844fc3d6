//! Timestamp normalization.
//!
//! Maps a recorded timestamp onto an anchor instant:
//! `anchor + (recorded - baseline)`. Only the absolute epoch moves; ordering
//! and inter-record deltas are kept exactly.

use chrono::{DateTime, Utc};

/// Normalizer for one replay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    baseline: DateTime<Utc>,
    anchor: DateTime<Utc>,
}

impl Normalizer {
    pub fn new(baseline: DateTime<Utc>, anchor: DateTime<Utc>) -> Self {
        Self { baseline, anchor }
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn baseline(&self) -> DateTime<Utc> {
        self.baseline
    }

    /// Moves the anchor to `now` for the next pass, never backwards.
    pub fn reanchor(&mut self, now: DateTime<Utc>) {
        self.anchor = self.anchor.max(now);
    }

    /// Returns the replayed time, or `None` if it falls outside the
    /// representable range.
    pub fn normalize(&self, recorded: DateTime<Utc>) -> Option<DateTime<Utc>> {
        normalize(recorded, self.baseline, self.anchor)
    }
}

pub fn normalize(
    recorded: DateTime<Utc>,
    baseline: DateTime<Utc>,
    anchor: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    anchor.checked_add_signed(recorded.signed_duration_since(baseline))
}
