//! End-to-end tests for the observer gRPC surface.
//!
//! Tests verify:
//! - Bounded replay delivers the recording once, then a clean end of stream
//! - Follow replay wraps and re-anchors timestamps at "now"
//! - Concurrent clients are isolated, and shutdown ends every follow stream
//!   with a `Cancelled` status even when the client had stopped reading
//! - Startup faults are reported to the owner instead of panicking

use chrono::Utc;
use mock_observer::proto::observer_client::ObserverClient;
use mock_observer::proto::{Flow, GetFlowsRequest, ServerStatusRequest};
use mock_observer::types::to_datetime;
use mock_observer::{
    fault_channel, run, FaultOrigin, LoadError, RecordedSequence, ReplayServer, ServerConfig,
    ServerError, StreamCoordinator, SystemClock,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tonic::transport::Channel;
use tonic::Code;

const TIMEOUT: Duration = Duration::from_secs(5);

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/three_flows.json")
}

struct TestServer {
    addr: SocketAddr,
    coordinator: Arc<StreamCoordinator>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<mock_observer::error::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let mut config = ServerConfig::with_flows(fixture());
        config.address = "127.0.0.1:0".to_string();

        let sequence = Arc::new(RecordedSequence::load(&config.flows_path).unwrap());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let server = ReplayServer::bind(&config, sequence, Arc::new(SystemClock), shutdown_rx)
            .await
            .unwrap();

        let addr = server.local_addr();
        let coordinator = Arc::clone(server.coordinator());
        let handle = tokio::spawn(server.serve());

        Self {
            addr,
            coordinator,
            shutdown,
            handle,
        }
    }

    async fn client(&self) -> ObserverClient<Channel> {
        ObserverClient::connect(format!("http://{}", self.addr))
            .await
            .unwrap()
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        tokio::time::timeout(TIMEOUT, self.handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

fn seconds(flow: &Flow) -> i64 {
    flow.time.as_ref().unwrap().seconds
}

fn source_mac(flow: &Flow) -> &str {
    flow.ethernet
        .as_ref()
        .map(|e| e.source.as_str())
        .unwrap_or_default()
}

// ============================================================================
// BOUNDED REPLAY
// ============================================================================

#[tokio::test]
async fn test_bounded_replay_ends_cleanly() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let mut stream = client
        .get_flows(GetFlowsRequest::default())
        .await
        .unwrap()
        .into_inner();

    let mut flows = Vec::new();
    while let Some(response) = stream.message().await.unwrap() {
        assert_eq!(response.node_name, "kind-worker");
        assert_eq!(response.time, response.flow().unwrap().time);
        flows.push(response.flow().cloned().unwrap());
    }

    assert_eq!(flows.len(), 3);
    assert_eq!(source_mac(&flows[0]), "46:e5:ea:1f:95:ff");
    assert_eq!(seconds(&flows[1]) - seconds(&flows[0]), 5);
    assert_eq!(seconds(&flows[2]) - seconds(&flows[0]), 9);

    let drift = Utc::now() - to_datetime(flows[0].time.as_ref().unwrap()).unwrap();
    assert!(drift.num_seconds().abs() < 60);

    server.stop().await;
}

#[tokio::test]
async fn test_bounded_replay_honors_number() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let mut stream = client
        .get_flows(GetFlowsRequest {
            number: 2,
            ..Default::default()
        })
        .await
        .unwrap()
        .into_inner();

    let mut received = 0;
    while stream.message().await.unwrap().is_some() {
        received += 1;
    }
    assert_eq!(received, 2);

    server.stop().await;
}

#[tokio::test]
async fn test_server_status_counts_sent_flows() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let mut stream = client
        .get_flows(GetFlowsRequest::default())
        .await
        .unwrap()
        .into_inner();
    while stream.message().await.unwrap().is_some() {}

    let status = client
        .server_status(ServerStatusRequest {})
        .await
        .unwrap()
        .into_inner();
    assert_eq!(status.num_flows, 3);
    assert_eq!(status.max_flows, 3);
    assert_eq!(status.seen_flows, 3);
    assert!(status.uptime_ns > 0);

    server.stop().await;
}

// ============================================================================
// FOLLOW REPLAY
// ============================================================================

#[tokio::test]
async fn test_follow_wraps_and_reanchors() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let mut stream = client
        .get_flows(GetFlowsRequest {
            follow: true,
            ..Default::default()
        })
        .await
        .unwrap()
        .into_inner();

    let mut flows = Vec::new();
    for _ in 0..4 {
        let response = tokio::time::timeout(TIMEOUT, stream.message())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        flows.push(response.flow().cloned().unwrap());
    }

    // The fourth flow is the first record again, anchored no earlier than
    // the first pass.
    assert_eq!(source_mac(&flows[3]), "46:e5:ea:1f:95:ff");
    assert!(seconds(&flows[3]) >= seconds(&flows[0]));
    assert_eq!(flows[3].summary, flows[0].summary);

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let server = TestServer::start().await;
    let mut first = server.client().await;
    let mut second = server.client().await;

    let follow = GetFlowsRequest {
        follow: true,
        ..Default::default()
    };
    let mut a = first.get_flows(follow.clone()).await.unwrap().into_inner();

    // Advance the first session into its second pass.
    for _ in 0..5 {
        a.message().await.unwrap().unwrap();
    }

    // A new session still starts at the beginning of the recording.
    let mut b = second.get_flows(follow).await.unwrap().into_inner();
    let head = b.message().await.unwrap().unwrap();
    assert_eq!(source_mac(head.flow().unwrap()), "46:e5:ea:1f:95:ff");

    drop(a);
    drop(b);
    server.stop().await;
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[tokio::test]
async fn test_shutdown_cancels_all_follow_streams() {
    let server = TestServer::start().await;
    let coordinator = Arc::clone(&server.coordinator);

    let follow = GetFlowsRequest {
        follow: true,
        ..Default::default()
    };
    let mut streams = Vec::new();
    let mut received = 0u64;
    for _ in 0..2 {
        let mut client = server.client().await;
        let mut stream = client.get_flows(follow.clone()).await.unwrap().into_inner();
        stream.message().await.unwrap().unwrap();
        received += 1;
        streams.push(stream);
    }
    assert_eq!(coordinator.stats().snapshot().sessions_active, 2);

    // Neither client reads, so both outbound buffers fill up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown.send(true).unwrap();

    for mut stream in streams {
        let (flows, ended) = tokio::time::timeout(TIMEOUT, async move {
            let mut flows = 0u64;
            loop {
                match stream.message().await {
                    Ok(Some(_)) => flows += 1,
                    Ok(None) => return (flows, None),
                    Err(status) => return (flows, Some(status.code())),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(ended, Some(Code::Cancelled));
        received += flows;
    }

    tokio::time::timeout(TIMEOUT, server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let snapshot = coordinator.stats().snapshot();
    assert_eq!(snapshot.sessions_started, 2);
    assert_eq!(snapshot.sessions_active, 0);
    assert_eq!(snapshot.sessions_failed, 0);
    assert_eq!(snapshot.flows_sent, received);
}

// ============================================================================
// LOADING AND FAULTS
// ============================================================================

#[test]
fn test_loading_is_idempotent() {
    let first = RecordedSequence::load(fixture()).unwrap();
    let second = RecordedSequence::load(fixture()).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first.baseline(), second.baseline());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.flow(), b.flow());
    }
}

#[tokio::test]
async fn test_run_reports_load_fault() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::with_flows(dir.path().join("missing.json"));
    config.address = "127.0.0.1:0".to_string();

    let (faults, mut fault_rx) = fault_channel(1);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::time::timeout(TIMEOUT, run(config, shutdown_rx, faults))
        .await
        .unwrap();

    let fault = fault_rx.recv().await.unwrap();
    assert_eq!(fault.origin, FaultOrigin::Load);
    assert!(matches!(
        fault.error,
        ServerError::Load(LoadError::Io { .. })
    ));
}

#[tokio::test]
async fn test_run_reports_bind_fault() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = ServerConfig::with_flows(fixture());
    config.address = occupied.local_addr().unwrap().to_string();

    let (faults, mut fault_rx) = fault_channel(1);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::time::timeout(TIMEOUT, run(config, shutdown_rx, faults))
        .await
        .unwrap();

    let fault = fault_rx.recv().await.unwrap();
    assert_eq!(fault.origin, FaultOrigin::Bind);
    assert!(matches!(fault.error, ServerError::Bind { .. }));
}
