//! The recorded flow corpus shared by every replay session.

use chrono::{DateTime, Utc};
use log::info;
use std::path::Path;
use std::slice::Iter;

use super::reader::{JsonLinesReader, RecordReader, VecReader};
use crate::error::LoadError;
use crate::proto::Flow;
use crate::types::to_datetime;

/// One recorded flow with its decoded capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    flow: Flow,
    recorded_at: Option<DateTime<Utc>>,
}

impl FlowRecord {
    pub fn new(flow: Flow) -> Self {
        let recorded_at = flow.time.as_ref().and_then(to_datetime);
        Self { flow, recorded_at }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// Capture time, or `None` when the record carries no usable timestamp.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.recorded_at
    }
}

/// Ordered, immutable set of flow records loaded once at startup.
///
/// Insertion order is replay order. The first record's timestamp is the
/// baseline every replayed timestamp is measured from.
#[derive(Debug, Clone)]
pub struct RecordedSequence {
    records: Vec<FlowRecord>,
    baseline: DateTime<Utc>,
}

impl RecordedSequence {
    /// Loads the whole recording at `path` (file or directory).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mut reader = JsonLinesReader::open(path)?;
        let sequence = Self::from_reader(&mut reader).map_err(|e| match e {
            LoadError::Empty(_) => LoadError::Empty(path.to_path_buf()),
            other => other,
        })?;

        info!(
            "Loaded {} flow records from {} (baseline {})",
            sequence.len(),
            path.display(),
            sequence.baseline.to_rfc3339()
        );
        Ok(sequence)
    }

    /// Materializes every record the reader yields.
    pub fn from_reader<R: RecordReader + ?Sized>(reader: &mut R) -> Result<Self, LoadError> {
        let mut records = Vec::new();
        while let Some(flow) = reader.next_record()? {
            records.push(FlowRecord::new(flow));
        }

        let first = records
            .first()
            .ok_or_else(|| LoadError::Empty(Default::default()))?;
        let baseline = first.recorded_at().ok_or(LoadError::MissingBaseline)?;

        Ok(Self { records, baseline })
    }

    pub fn from_flows(flows: Vec<Flow>) -> Result<Self, LoadError> {
        Self::from_reader(&mut VecReader::new(flows))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// A loaded sequence is never empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FlowRecord> {
        self.records.get(index)
    }

    pub fn baseline(&self) -> DateTime<Utc> {
        self.baseline
    }

    pub fn iter(&self) -> Iter<'_, FlowRecord> {
        self.records.iter()
    }
}
