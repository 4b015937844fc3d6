//! Server configuration, read once at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the replay server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the gRPC listener binds to
    pub address: String,
    /// Flow recording: a JSON-lines file or a directory of them
    pub flows_path: PathBuf,
    /// Follow-mode pacing factor; recorded inter-flow gaps are divided by
    /// this value. 0 replays as fast as the client reads.
    pub rate_adjustment: u32,
    /// Outbound messages buffered per client before the session waits
    pub channel_capacity: usize,
    /// Fatal faults buffered for the process owner
    pub fault_buffer: usize,
    /// How long each stream may wait to deliver its cancellation status on
    /// shutdown
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:4245".to_string(),
            flows_path: PathBuf::from("./testdata"),
            rate_adjustment: 0,
            channel_capacity: 1,
            fault_buffer: 1,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn with_flows(flows_path: impl Into<PathBuf>) -> Self {
        Self {
            flows_path: flows_path.into(),
            ..Self::default()
        }
    }
}
