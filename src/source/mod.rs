//! Record source - the recorded flow corpus.
//!
//! Loading is eager: the whole recording is materialized before the server
//! accepts its first client, so that every session can loop over it and
//! start from the same first record.

mod json;
pub mod reader;
pub mod sequence;

pub use reader::{JsonLinesReader, RecordReader, VecReader};
pub use sequence::{FlowRecord, RecordedSequence};
