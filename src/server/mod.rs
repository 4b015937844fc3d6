//! Streaming server - per-client replay delivery over gRPC.
//!
//! - **Coordinator** (`StreamCoordinator`): one pump task per request
//! - **gRPC** (`ObserverService`, `ReplayServer`, `run`): transport surface
//! - **Stats** (`ReplayStats`): counters behind `ServerStatus`

pub mod coordinator;
pub mod grpc;
pub mod stats;

pub use coordinator::{
    wait_for_shutdown, FlowStream, FlowStreamItem, SessionOutcome, StreamConfig,
    StreamCoordinator,
};
pub use grpc::{run, ObserverService, ReplayServer};
pub use stats::{ReplayStats, StatsSnapshot};
