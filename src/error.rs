//! Error types for the replay server.
//!
//! Two scopes are kept apart: [`ServerError`] (and the [`LoadError`] it
//! wraps) makes the whole server unusable and travels on the fault channel,
//! while [`SessionFault`] only ever ends the stream of the client it belongs
//! to. End-of-stream and cancellation are not errors and have no variant here.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to materialize the recorded flow corpus at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read flow records from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed flow record at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("no flow records found in {0}")]
    Empty(PathBuf),

    #[error("first flow record has no timestamp to use as replay baseline")]
    MissingBaseline,
}

/// Fault scoped to a single replay session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionFault {
    #[error("flow record {index} has no timestamp")]
    MissingTimestamp { index: usize },

    #[error("flow record {index} timestamp is out of range after normalization")]
    TimestampOverflow { index: usize },
}

impl From<SessionFault> for tonic::Status {
    fn from(fault: SessionFault) -> Self {
        tonic::Status::internal(fault.to_string())
    }
}

/// Fatal server condition, surfaced through the fault reporter.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC server failed: {0}")]
    Serve(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
