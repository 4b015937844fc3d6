//! Replay engine: timestamp normalization and per-client sessions.

pub mod normalizer;
pub mod session;

pub use normalizer::Normalizer;
pub use session::{ReplaySession, Replayed, Step};
