//! Fatal fault reporting.
//!
//! The server hands faults that make it unusable as a whole (unreadable
//! recording, failed bind, transport failure) to its owner over a bounded
//! channel. Reporting never blocks: if the owner is slow or gone the fault is
//! logged and dropped. Per-session faults never come through here.

use crate::error::ServerError;
use log::{error, warn};
use std::fmt;
use tokio::sync::mpsc;

/// Where a fatal fault originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOrigin {
    Load,
    Bind,
    Serve,
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultOrigin::Load => write!(f, "load"),
            FaultOrigin::Bind => write!(f, "bind"),
            FaultOrigin::Serve => write!(f, "serve"),
        }
    }
}

/// A fatal fault and where it came from.
#[derive(Debug)]
pub struct FaultSignal {
    pub origin: FaultOrigin,
    pub error: ServerError,
}

/// Sending half, cloned into whatever needs to report.
#[derive(Debug, Clone)]
pub struct FaultReporter {
    tx: mpsc::Sender<FaultSignal>,
}

/// Receiving half, owned by the process.
pub type FaultReceiver = mpsc::Receiver<FaultSignal>;

/// Creates a fault channel buffering up to `capacity` faults (at least one).
pub fn fault_channel(capacity: usize) -> (FaultReporter, FaultReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (FaultReporter { tx }, rx)
}

impl FaultReporter {
    /// Reports a fatal fault without waiting for the consumer.
    ///
    /// Returns `false` when the fault was dropped.
    pub fn report(&self, origin: FaultOrigin, err: ServerError) -> bool {
        error!("fatal {} fault: {}", origin, err);
        match self.tx.try_send(FaultSignal { origin, error: err }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(signal)) => {
                warn!("fault buffer full, dropping {} fault", signal.origin);
                false
            }
            Err(mpsc::error::TrySendError::Closed(signal)) => {
                warn!("fault receiver gone, dropping {} fault", signal.origin);
                false
            }
        }
    }
}
