//! # Mock Observer
//!
//! Replays a recorded corpus of network flows over the Hubble-compatible
//! `observer.Observer` gRPC API, so flow-streaming clients can be tested
//! without a live cluster.
//!
//! # Architecture
//! - **Source**: the recording, loaded once and shared read-only
//! - **Replay**: per-client sessions with timestamp normalization; follow mode
//!   loops forever and re-anchors each pass at "now", bounded mode ends with a
//!   clean end of stream
//! - **Server**: one pump task per client with bounded outbound buffering,
//!   cancelled by client disconnect or process shutdown
//! - **Fault**: fatal startup/serving faults handed to the process owner

pub mod config;
pub mod error;
pub mod fault;
pub mod proto;
pub mod replay;
pub mod server;
pub mod source;
pub mod types;

pub use config::ServerConfig;
pub use error::{LoadError, ServerError, SessionFault};
pub use fault::{fault_channel, FaultOrigin, FaultReceiver, FaultReporter, FaultSignal};
pub use replay::{Normalizer, ReplaySession, Replayed, Step};
pub use server::{run, ReplayServer, SessionOutcome, StreamConfig, StreamCoordinator};
pub use source::{FlowRecord, RecordReader, RecordedSequence};
pub use types::{Clock, ReplayMode, SessionState, SystemClock};
