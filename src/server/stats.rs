//! # Replay Statistics
//!
//! Thread-safe counters shared by every stream pump and read by
//! `ServerStatus`.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

use crate::types::SessionState;

/// Process-wide replay counters.
#[derive(Debug, Clone)]
pub struct ReplayStats {
    started_at: Instant,

    /// Sessions ever started
    sessions_started: Arc<RwLock<u64>>,

    /// Sessions currently streaming
    sessions_active: Arc<RwLock<u64>>,

    /// Sessions that ended with a fault
    sessions_failed: Arc<RwLock<u64>>,

    /// Flows handed to the transport across all sessions
    flows_sent: Arc<RwLock<u64>>,
}

impl Default for ReplayStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayStats {
    pub fn new() -> Self {
        ReplayStats {
            started_at: Instant::now(),
            sessions_started: Arc::new(RwLock::new(0)),
            sessions_active: Arc::new(RwLock::new(0)),
            sessions_failed: Arc::new(RwLock::new(0)),
            flows_sent: Arc::new(RwLock::new(0)),
        }
    }

    pub fn session_started(&self) {
        *self.sessions_started.write() += 1;
        *self.sessions_active.write() += 1;
    }

    pub fn session_finished(&self, state: SessionState) {
        {
            let mut active = self.sessions_active.write();
            *active = active.saturating_sub(1);
        }
        if state == SessionState::Failed {
            *self.sessions_failed.write() += 1;
        }
    }

    pub fn flow_sent(&self) {
        *self.flows_sent.write() += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sessions_started: *self.sessions_started.read(),
            sessions_active: *self.sessions_active.read(),
            sessions_failed: *self.sessions_failed.read(),
            flows_sent: *self.flows_sent.read(),
            uptime_ns: self.started_at.elapsed().as_nanos() as u64,
        }
    }
}

/// Point-in-time copy of [`ReplayStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sessions_started: u64,
    pub sessions_active: u64,
    pub sessions_failed: u64,
    pub flows_sent: u64,
    pub uptime_ns: u64,
}
