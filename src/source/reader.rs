//! Record readers: decoding of recorded flows, one at a time.

use log::debug;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use super::json::JsonEvent;
use crate::error::LoadError;
use crate::proto::Flow;

/// Yields recorded flows in capture order.
pub trait RecordReader {
    /// Returns the next flow, or `None` once the recording is exhausted.
    fn next_record(&mut self) -> Result<Option<Flow>, LoadError>;
}

/// Reads Hubble JSON exports from a file or a directory of `*.json` files.
///
/// Directory entries are read in lexical file-name order.
pub struct JsonLinesReader {
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<OpenFile>,
}

struct OpenFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl JsonLinesReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(path).map_err(io_err)?;
        let files = if metadata.is_dir() {
            let entries = fs::read_dir(path)
                .map_err(io_err)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<PathBuf>, _>>()
                .map_err(io_err)?;
            // Anything named `*.json` that is not a directory is part of the
            // recording; an unreadable one fails the load when opened.
            let mut files: Vec<PathBuf> = entries
                .into_iter()
                .filter(|p| !p.is_dir() && p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        debug!("reading flows from {} file(s) under {}", files.len(), path.display());

        Ok(Self {
            pending: files.into_iter(),
            current: None,
        })
    }

    fn open_next_file(&mut self) -> Result<bool, LoadError> {
        let Some(path) = self.pending.next() else {
            return Ok(false);
        };

        let file = File::open(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;

        self.current = Some(OpenFile {
            path,
            lines: BufReader::new(file).lines(),
            line: 0,
        });
        Ok(true)
    }
}

impl RecordReader for JsonLinesReader {
    fn next_record(&mut self) -> Result<Option<Flow>, LoadError> {
        loop {
            let Some(open) = self.current.as_mut() else {
                if self.open_next_file()? {
                    continue;
                }
                return Ok(None);
            };

            let Some(line) = open.lines.next() else {
                self.current = None;
                continue;
            };
            open.line += 1;

            let line = line.map_err(|source| LoadError::Io {
                path: open.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let event: JsonEvent =
                serde_json::from_str(&line).map_err(|source| LoadError::Malformed {
                    path: open.path.clone(),
                    line: open.line,
                    source,
                })?;

            match event.into_flow() {
                Some(flow) => return Ok(Some(flow)),
                None => debug!("{}:{}: skipping non-flow event", open.path.display(), open.line),
            }
        }
    }
}

/// Replays an in-memory list of flows; used to build sequences directly.
pub struct VecReader {
    flows: std::vec::IntoIter<Flow>,
}

impl VecReader {
    pub fn new(flows: Vec<Flow>) -> Self {
        Self {
            flows: flows.into_iter(),
        }
    }
}

impl RecordReader for VecReader {
    fn next_record(&mut self) -> Result<Option<Flow>, LoadError> {
        Ok(self.flows.next())
    }
}
