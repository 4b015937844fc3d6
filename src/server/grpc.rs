//! gRPC surface: the `observer.Observer` service and the listener.

use log::info;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tokio_stream::Stream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use super::coordinator::{wait_for_shutdown, FlowStreamItem, StreamConfig, StreamCoordinator};
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::fault::{FaultOrigin, FaultReporter};
use crate::proto::observer_server::{Observer, ObserverServer};
use crate::proto::{GetFlowsRequest, ServerStatusRequest, ServerStatusResponse};
use crate::source::RecordedSequence;
use crate::types::{Clock, SystemClock};

/// Outbound stream type of `GetFlows`.
pub type GetFlowsStream = Pin<Box<dyn Stream<Item = FlowStreamItem> + Send + 'static>>;

/// `observer.Observer` implementation backed by the stream coordinator.
pub struct ObserverService {
    coordinator: Arc<StreamCoordinator>,
}

impl ObserverService {
    pub fn new(coordinator: Arc<StreamCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[tonic::async_trait]
impl Observer for ObserverService {
    type GetFlowsStream = GetFlowsStream;

    async fn get_flows(
        &self,
        request: Request<GetFlowsRequest>,
    ) -> std::result::Result<Response<Self::GetFlowsStream>, Status> {
        let peer = request
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let request = request.into_inner();
        info!(
            "GetFlows from {} (follow={}, number={})",
            peer, request.follow, request.number
        );

        // The pump task outlives this handler; its outcome is logged there.
        let stream = self.coordinator.handle(&request);
        Ok(Response::new(
            Box::pin(ReceiverStream::new(stream.receiver)) as Self::GetFlowsStream
        ))
    }

    async fn server_status(
        &self,
        _request: Request<ServerStatusRequest>,
    ) -> std::result::Result<Response<ServerStatusResponse>, Status> {
        let recorded = self.coordinator.sequence().len() as u64;
        let stats = self.coordinator.stats().snapshot();

        Ok(Response::new(ServerStatusResponse {
            num_flows: recorded,
            max_flows: recorded,
            seen_flows: stats.flows_sent,
            uptime_ns: stats.uptime_ns,
        }))
    }
}

/// A bound, not yet serving, replay server.
pub struct ReplayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    coordinator: Arc<StreamCoordinator>,
    shutdown: watch::Receiver<bool>,
}

impl ReplayServer {
    /// Binds the configured address around an already loaded recording.
    pub async fn bind(
        config: &ServerConfig,
        sequence: Arc<RecordedSequence>,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let bind_err = |source| ServerError::Bind {
            address: config.address.clone(),
            source,
        };
        let listener = TcpListener::bind(&config.address).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let stream_config = StreamConfig {
            channel_capacity: config.channel_capacity,
            rate_adjustment: config.rate_adjustment,
            shutdown_grace: config.shutdown_grace,
        };
        let coordinator = Arc::new(StreamCoordinator::new(
            sequence,
            clock,
            shutdown.clone(),
            stream_config,
        ));

        Ok(Self {
            listener,
            local_addr,
            coordinator,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn coordinator(&self) -> &Arc<StreamCoordinator> {
        &self.coordinator
    }

    /// Serves until the shutdown signal fires.
    pub async fn serve(self) -> Result<()> {
        info!("Serving observer API on {}", self.local_addr);

        let mut shutdown = self.shutdown;
        Server::builder()
            .add_service(ObserverServer::new(ObserverService::new(self.coordinator)))
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), async move {
                wait_for_shutdown(&mut shutdown).await;
            })
            .await?;

        info!("Observer API on {} shut down", self.local_addr);
        Ok(())
    }
}

/// Loads the recording, binds and serves until shutdown.
///
/// Fatal failures are reported on `faults` rather than returned; the owner
/// decides whether to abort. Returns when serving stops for any reason.
pub async fn run(config: ServerConfig, shutdown: watch::Receiver<bool>, faults: FaultReporter) {
    let sequence = match RecordedSequence::load(&config.flows_path) {
        Ok(sequence) => Arc::new(sequence),
        Err(e) => {
            faults.report(FaultOrigin::Load, e.into());
            return;
        }
    };

    let server = match ReplayServer::bind(&config, sequence, Arc::new(SystemClock), shutdown).await {
        Ok(server) => server,
        Err(e) => {
            faults.report(FaultOrigin::Bind, e);
            return;
        }
    };

    if let Err(e) = server.serve().await {
        faults.report(FaultOrigin::Serve, e);
    }
}
