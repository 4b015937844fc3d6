//! Shared replay types and time helpers.

use chrono::{DateTime, Utc};
use prost_types::Timestamp;

/// Delivery mode of one replay session, fixed when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Loop over the recording forever, re-anchoring on every pass.
    Follow,
    /// Replay this many records from the start, then complete.
    Bounded(usize),
}

impl ReplayMode {
    /// Derives the mode from a request's `follow` flag and `number` cap.
    ///
    /// `number == 0` means the whole recording; larger caps are clamped to
    /// `available` since a bounded session never wraps.
    pub fn from_request(follow: bool, number: u64, available: usize) -> Self {
        if follow {
            return ReplayMode::Follow;
        }

        let cap = usize::try_from(number).unwrap_or(usize::MAX);
        if cap == 0 {
            ReplayMode::Bounded(available)
        } else {
            ReplayMode::Bounded(cap.min(available))
        }
    }

    pub fn is_follow(&self) -> bool {
        matches!(self, ReplayMode::Follow)
    }
}

/// Lifecycle of a replay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Active)
    }
}

/// Source of wall-clock time for anchoring replayed timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Converts a protobuf timestamp, rejecting out-of-range values.
pub fn to_datetime(ts: &Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(ts.nanos).ok()?;
    DateTime::from_timestamp(ts.seconds, nanos)
}

pub fn to_timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_ignores_number() {
        assert_eq!(ReplayMode::from_request(true, 5, 10), ReplayMode::Follow);
    }

    #[test]
    fn test_bounded_caps() {
        assert_eq!(ReplayMode::from_request(false, 0, 10), ReplayMode::Bounded(10));
        assert_eq!(ReplayMode::from_request(false, 3, 10), ReplayMode::Bounded(3));
        assert_eq!(ReplayMode::from_request(false, 50, 10), ReplayMode::Bounded(10));
    }

    #[test]
    fn test_timestamp_conversion() {
        let ts = Timestamp {
            seconds: 1_623_801_600,
            nanos: 123_456_789,
        };
        let dt = to_datetime(&ts).unwrap();
        assert_eq!(to_timestamp(dt), ts);

        let negative_nanos = Timestamp {
            seconds: 0,
            nanos: -1,
        };
        assert!(to_datetime(&negative_nanos).is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::Active.is_terminal());
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
        assert!(SessionState::Failed.is_terminal());
    }
}
