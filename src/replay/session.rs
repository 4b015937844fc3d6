//! Per-client replay session.
//!
//! A session is a restartable lazy sequence over the shared recording. It owns
//! its cursor and its normalizer, so sessions never observe each other. All
//! wrap and re-anchor handling lives in [`ReplaySession::next_step`].

use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::normalizer::Normalizer;
use crate::error::SessionFault;
use crate::proto::Flow;
use crate::source::RecordedSequence;
use crate::types::{to_timestamp, Clock, ReplayMode, SessionState};

/// A record emitted by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Replayed {
    /// The flow with its timestamp rewritten
    pub flow: Flow,
    /// Position in the recording
    pub index: usize,
    /// Replay pass, starting at 0 and incremented on every wrap
    pub pass: u64,
    /// Recorded time since the previous record of the same pass
    pub gap: Duration,
}

/// Outcome of one pull.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Record(Replayed),
    /// Bounded replay exhausted. End of stream, not an error.
    Completed,
    /// The session was cancelled. Not an error.
    Cancelled,
}

/// Replay cursor and state machine for one client.
pub struct ReplaySession {
    id: String,
    sequence: Arc<RecordedSequence>,
    clock: Arc<dyn Clock>,
    mode: ReplayMode,
    state: SessionState,
    cursor: usize,
    pass: u64,
    emitted: u64,
    normalizer: Normalizer,
    previous: Option<DateTime<Utc>>,
    fault: Option<SessionFault>,
}

impl ReplaySession {
    /// Starts a session at index 0, anchored at the clock's current time.
    pub fn new(sequence: Arc<RecordedSequence>, mode: ReplayMode, clock: Arc<dyn Clock>) -> Self {
        let normalizer = Normalizer::new(sequence.baseline(), clock.now());
        Self {
            id: Uuid::new_v4().to_string(),
            sequence,
            clock,
            mode,
            state: SessionState::Active,
            cursor: 0,
            pass: 0,
            emitted: 0,
            normalizer,
            previous: None,
            fault: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> ReplayMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Anchor of the current pass.
    pub fn anchor(&self) -> DateTime<Utc> {
        self.normalizer.anchor()
    }

    /// Stops the session. No-op once the session is terminal.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Active {
            debug!("session {} cancelled at record {}", self.id, self.cursor);
            self.state = SessionState::Cancelled;
        }
    }

    /// Pulls the next step.
    ///
    /// Terminal states are sticky: a completed or cancelled session keeps
    /// returning the same step, a failed one keeps returning its fault.
    pub fn next_step(&mut self) -> Result<Step, SessionFault> {
        match self.state {
            SessionState::Active => {}
            SessionState::Completed => return Ok(Step::Completed),
            SessionState::Cancelled => return Ok(Step::Cancelled),
            SessionState::Failed => {
                return Err(self
                    .fault
                    .clone()
                    .unwrap_or(SessionFault::MissingTimestamp { index: self.cursor }))
            }
        }

        let limit = match self.mode {
            ReplayMode::Follow => self.sequence.len(),
            ReplayMode::Bounded(count) => count.min(self.sequence.len()),
        };

        if self.cursor >= limit {
            match self.mode {
                ReplayMode::Bounded(_) => return Ok(self.complete()),
                ReplayMode::Follow => self.wrap(),
            }
        }

        let index = self.cursor;
        let Some(record) = self.sequence.get(index) else {
            return Ok(self.complete());
        };

        let Some(recorded) = record.recorded_at() else {
            return Err(self.fail(SessionFault::MissingTimestamp { index }));
        };
        let Some(replayed_at) = self.normalizer.normalize(recorded) else {
            return Err(self.fail(SessionFault::TimestampOverflow { index }));
        };

        let gap = self
            .previous
            .and_then(|prev| recorded.signed_duration_since(prev).to_std().ok())
            .unwrap_or(Duration::ZERO);
        self.previous = Some(recorded);

        let mut flow = record.flow().clone();
        flow.time = Some(to_timestamp(replayed_at));

        self.cursor += 1;
        self.emitted += 1;

        Ok(Step::Record(Replayed {
            flow,
            index,
            pass: self.pass,
            gap,
        }))
    }

    fn wrap(&mut self) {
        self.cursor = 0;
        self.pass += 1;
        self.previous = None;
        self.normalizer.reanchor(self.clock.now());
        debug!(
            "session {} starting pass {} anchored at {}",
            self.id,
            self.pass,
            self.normalizer.anchor().to_rfc3339()
        );
    }

    fn complete(&mut self) -> Step {
        debug!("session {} completed after {} records", self.id, self.emitted);
        self.state = SessionState::Completed;
        Step::Completed
    }

    fn fail(&mut self, fault: SessionFault) -> SessionFault {
        self.state = SessionState::Failed;
        self.fault = Some(fault.clone());
        fault
    }
}

impl Iterator for ReplaySession {
    type Item = Result<Replayed, SessionFault>;

    /// Yields records until the session terminates; a fault is yielded once.
    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_terminal() {
            return None;
        }
        match self.next_step() {
            Ok(Step::Record(replayed)) => Some(Ok(replayed)),
            Ok(Step::Completed) | Ok(Step::Cancelled) => None,
            Err(fault) => Some(Err(fault)),
        }
    }
}
