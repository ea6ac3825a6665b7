//! Vehicle feed ingestion
//!
//! The feed is a newline-delimited text file of `<id>:<road>[:<lane>]`
//! records that an external generator keeps appending to. `FeedTailer`
//! remembers how far it has read and only hands back complete new lines.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::config::MAX_LANES;
use super::intersection::Intersection;
use super::road_queue::QueueError;
use super::stats::JunctionStats;
use super::types::{Road, SimTime, VehicleRecord};

/// Longest accepted vehicle id
pub const MAX_ID_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("malformed feed line {line:?}: {reason}")]
    Malformed { line: String, reason: &'static str },
}

fn malformed(line: &str, reason: &'static str) -> FeedError {
    FeedError::Malformed {
        line: line.to_string(),
        reason,
    }
}

/// Parse one feed line into a vehicle that arrived at `arrival_time`
pub fn parse_feed_line(line: &str, arrival_time: SimTime) -> Result<VehicleRecord, FeedError> {
    let trimmed = line.trim();
    let mut fields = trimmed.split(':');

    let id = fields.next().unwrap_or_default();
    let road = fields
        .next()
        .ok_or_else(|| malformed(line, "missing road"))?;
    let lane = fields.next();
    if fields.next().is_some() {
        return Err(malformed(line, "too many fields"));
    }

    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(malformed(line, "vehicle id must be 1-12 characters"));
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(malformed(line, "vehicle id contains whitespace"));
    }

    let mut road_chars = road.chars();
    let road = match (road_chars.next(), road_chars.next()) {
        (Some(c), None) => Road::from_char(c).ok_or_else(|| malformed(line, "unknown road"))?,
        _ => return Err(malformed(line, "road must be a single letter A-D")),
    };

    let lane = match lane {
        None => None,
        Some(lane) => {
            let lane: u8 = lane
                .parse()
                .map_err(|_| malformed(line, "lane is not a number"))?;
            if lane == 0 || lane > MAX_LANES {
                return Err(malformed(line, "lane out of range"));
            }
            Some(lane)
        }
    };

    Ok(VehicleRecord::new(id, road, lane, arrival_time))
}

/// Parse a feed line and queue the vehicle, recording the outcome
///
/// Malformed lines and full queues are logged and counted, never fatal.
pub fn ingest_line(intersection: &Intersection, line: &str, stats: &mut JunctionStats) {
    if line.trim().is_empty() {
        return;
    }

    let record = match parse_feed_line(line, intersection.board().now()) {
        Ok(record) => record,
        Err(e) => {
            warn!("{}", e);
            stats.record_malformed();
            return;
        }
    };

    let road = record.road();
    let id = record.id().clone();
    stats.record_arrival(road);
    match intersection.enqueue(record) {
        Ok(()) => debug!("+ Vehicle {} added to road {} queue", id, road),
        Err(e @ QueueError::Full { .. }) => {
            warn!("Dropping vehicle {}: {}", id, e);
            stats.record_rejected(road);
        }
        Err(e) => warn!("Dropping vehicle {}: {}", id, e),
    }
}

/// Incremental reader over an append-only feed file
#[derive(Debug)]
pub struct FeedTailer {
    path: PathBuf,
    offset: u64,
}

impl FeedTailer {
    /// Read the whole file, starting at its first byte
    pub fn from_start(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset: 0,
        }
    }

    /// Skip whatever the file already holds and only report later lines
    pub fn from_end(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let offset = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to stat feed file {}", path.display()))
            }
        };
        Ok(Self { path, offset })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Return every complete line appended since the last poll
    ///
    /// A missing file yields no lines. A trailing line without a newline is
    /// left in place until it is finished.
    pub fn poll(&mut self) -> Result<Vec<String>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open feed file {}", self.path.display()))
            }
        };

        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat feed file {}", self.path.display()))?
            .len();
        if len < self.offset {
            warn!(
                "Feed file {} shrank from {} to {} bytes, reading from the start",
                self.path.display(),
                self.offset,
                len
            );
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))
            .context("Failed to seek feed file")?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .context("Failed to read feed file")?;

        let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &buf[..=last_newline];
        self.offset += complete.len() as u64;

        Ok(complete
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect())
    }
}
