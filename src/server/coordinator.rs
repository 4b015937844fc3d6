//! Streaming coordinator - one pump task per `GetFlows` request.
//!
//! Each request gets a fresh [`ReplaySession`] and a tokio task that moves
//! session output into a bounded outbound channel. The task reserves channel
//! capacity *before* pulling the next record, so a slow client only ever
//! throttles its own session.
//!
//! A pump ends when:
//! 1. The session completes (channel closed cleanly: end of stream)
//! 2. The session fails (one `Status::internal` item, then closed)
//! 3. The client goes away (receiver dropped)
//! 4. The process-wide shutdown signal fires (`Status::cancelled`, delivered
//!    within the shutdown grace period while the client is still connected)
//!
//! Cases 3 and 4 both end the session as `Cancelled`. A client only sees a
//! clean end of stream when its bounded replay completed.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tonic::Status;

use super::stats::ReplayStats;
use crate::proto::{GetFlowsRequest, GetFlowsResponse};
use crate::replay::{ReplaySession, Step};
use crate::source::RecordedSequence;
use crate::types::{Clock, ReplayMode, SessionState};

pub(crate) const SHUTDOWN_MESSAGE: &str = "server shutting down";

/// Item type of the outbound stream handed to the transport.
pub type FlowStreamItem = Result<GetFlowsResponse, Status>;

/// Configuration for per-client streaming.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Outbound messages buffered per client
    pub channel_capacity: usize,
    /// Follow-mode pacing factor, 0 = unpaced
    pub rate_adjustment: u32,
    /// How long a shutting-down session waits for buffer space to deliver
    /// its cancellation status
    pub shutdown_grace: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            rate_adjustment: 0,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// How a session's stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub session_id: String,
    pub state: SessionState,
    /// Flows handed to the client's stream
    pub flows_sent: u64,
}

/// Outbound half of one client stream plus the task feeding it.
pub struct FlowStream {
    pub receiver: mpsc::Receiver<FlowStreamItem>,
    pub task: JoinHandle<SessionOutcome>,
}

/// Creates and drives replay sessions for incoming requests.
pub struct StreamCoordinator {
    sequence: Arc<RecordedSequence>,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
    stats: ReplayStats,
    config: StreamConfig,
}

impl StreamCoordinator {
    pub fn new(
        sequence: Arc<RecordedSequence>,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
        config: StreamConfig,
    ) -> Self {
        Self {
            sequence,
            clock,
            shutdown,
            stats: ReplayStats::new(),
            config,
        }
    }

    pub fn sequence(&self) -> &Arc<RecordedSequence> {
        &self.sequence
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// Starts streaming for one request. Must be called inside a tokio runtime.
    pub fn handle(&self, request: &GetFlowsRequest) -> FlowStream {
        let mode = ReplayMode::from_request(request.follow, request.number, self.sequence.len());
        if !request.whitelist.is_empty() || !request.blacklist.is_empty() {
            debug!(
                "ignoring {} allow and {} deny filters",
                request.whitelist.len(),
                request.blacklist.len()
            );
        }

        let session = ReplaySession::new(Arc::clone(&self.sequence), mode, Arc::clone(&self.clock));
        let (tx, receiver) = mpsc::channel(self.config.channel_capacity.max(1));

        let pump = Pump {
            session,
            tx,
            shutdown: self.shutdown.clone(),
            stats: self.stats.clone(),
            pacing: Pacing::new(self.config.rate_adjustment, mode),
            shutdown_grace: self.config.shutdown_grace,
            sent: 0,
        };

        self.stats.session_started();
        let task = tokio::spawn(pump.run());

        FlowStream { receiver, task }
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let sender_gone = shutdown.wait_for(|stop| *stop).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    rate_adjustment: u32,
}

impl Pacing {
    /// Only follow-mode streams are paced.
    fn new(rate_adjustment: u32, mode: ReplayMode) -> Self {
        let rate_adjustment = if mode.is_follow() { rate_adjustment } else { 0 };
        Self { rate_adjustment }
    }

    fn delay_for(&self, gap: Duration) -> Duration {
        if self.rate_adjustment == 0 {
            Duration::ZERO
        } else {
            gap / self.rate_adjustment
        }
    }
}

struct Pump {
    session: ReplaySession,
    tx: mpsc::Sender<FlowStreamItem>,
    shutdown: watch::Receiver<bool>,
    stats: ReplayStats,
    pacing: Pacing,
    shutdown_grace: Duration,
    sent: u64,
}

impl Pump {
    async fn run(mut self) -> SessionOutcome {
        info!(
            "session {} started ({:?})",
            self.session.id(),
            self.session.mode()
        );

        let state = self.pump().await;
        self.stats.session_finished(state);

        info!(
            "session {} finished: {:?} after {} flows",
            self.session.id(),
            state,
            self.sent
        );

        SessionOutcome {
            session_id: self.session.id().to_string(),
            state,
            flows_sent: self.sent,
        }
    }

    /// Waits for buffer space to deliver the shutdown status, up to the grace
    /// period. A client that is gone or never reads again gets nothing.
    async fn send_cancelled(&self) {
        let status = Err(Status::cancelled(SHUTDOWN_MESSAGE));
        match tokio::time::timeout(self.shutdown_grace, self.tx.send(status)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => debug!("session {} client gone before cancellation", self.session.id()),
            Err(_) => warn!(
                "session {} cancellation not delivered within {:?}",
                self.session.id(),
                self.shutdown_grace
            ),
        }
    }

    async fn pump(&mut self) -> SessionState {
        loop {
            let permit = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut self.shutdown) => {
                    self.send_cancelled().await;
                    self.session.cancel();
                    return SessionState::Cancelled;
                }
                reserved = self.tx.reserve() => match reserved {
                    Ok(permit) => permit,
                    Err(_) => {
                        self.session.cancel();
                        return SessionState::Cancelled;
                    }
                },
            };

            let replayed = match self.session.next_step() {
                Ok(Step::Record(replayed)) => replayed,
                Ok(Step::Completed) => return SessionState::Completed,
                Ok(Step::Cancelled) => return SessionState::Cancelled,
                Err(fault) => {
                    warn!("session {} failed: {}", self.session.id(), fault);
                    permit.send(Err(fault.into()));
                    return SessionState::Failed;
                }
            };

            let delay = self.pacing.delay_for(replayed.gap);
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut self.shutdown) => {
                        permit.send(Err(Status::cancelled(SHUTDOWN_MESSAGE)));
                        self.session.cancel();
                        return SessionState::Cancelled;
                    }
                    _ = self.tx.closed() => {
                        self.session.cancel();
                        return SessionState::Cancelled;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            permit.send(Ok(GetFlowsResponse::from_flow(replayed.flow)));
            self.sent += 1;
            self.stats.flow_sent();
        }
    }
}
