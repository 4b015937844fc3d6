//! # Mock Observer Entry Point
//!
//! Loads the flow recording, starts the gRPC server and waits for either a
//! fatal fault or Ctrl-C. Both trigger a graceful shutdown of every stream.

use clap::Parser;
use log::{error, info};
use mock_observer::{fault_channel, run, ServerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "mock-observer", about = "Replay recorded flows over the observer gRPC API")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "MOCK_OBSERVER_ADDRESS", default_value = "localhost:4245")]
    address: String,

    /// Flow recording: a JSON-lines file or a directory of `*.json` files
    #[arg(long, env = "MOCK_OBSERVER_FLOWS", default_value = "./testdata")]
    flows: PathBuf,

    /// Divide recorded inter-flow gaps by this factor in follow mode (0 = no pacing)
    #[arg(long, env = "MOCK_OBSERVER_RATE_ADJUSTMENT", default_value_t = 0)]
    rate_adjustment: u32,

    /// Responses buffered per client stream
    #[arg(long, default_value_t = 1)]
    channel_capacity: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            address: self.address,
            flows_path: self.flows,
            rate_adjustment: self.rate_adjustment,
            channel_capacity: self.channel_capacity,
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with_target(true)
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    let config = args.into_config();

    println!("=================================================");
    println!("  Mock Observer - Recorded Flow Replay          ");
    println!("=================================================");
    println!("  - Flows:           {}", config.flows_path.display());
    println!("  - Listening on:    {}", config.address);
    println!("  - Rate adjustment: {}", config.rate_adjustment);
    println!();

    let (faults, mut fault_rx) = fault_channel(config.fault_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut server = tokio::spawn(run(config, shutdown_rx, faults));

    let exit = tokio::select! {
        Some(fault) = fault_rx.recv() => {
            error!("aborting on {} fault: {}", fault.origin, fault.error);
            ExitCode::FAILURE
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            ExitCode::SUCCESS
        }
        joined = &mut server => {
            joined?;
            // `run` only returns early after reporting a fault.
            match fault_rx.try_recv() {
                Ok(fault) => {
                    error!("aborting on {} fault: {}", fault.origin, fault.error);
                    ExitCode::FAILURE
                }
                Err(_) => ExitCode::SUCCESS,
            }
        }
    };

    let _ = shutdown_tx.send(true);
    if !server.is_finished() {
        server.await?;
    }

    println!("=================================================");
    println!("  Mock Observer Shut Down");
    println!("=================================================");

    Ok(exit)
}
