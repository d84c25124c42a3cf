//! Write-Ahead Log implementation with segmented storage

use crate::segment::{Segment, SegmentReader};
use anyhow::{Context, Result, anyhow};
use common::Ts;
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default segment size (64 MB)
pub const DEFAULT_SEGMENT_SIZE: u64 = 64 * BYTES_PER_MB;

/// Bytes in a megabyte
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// WAL entry trait
pub trait WalEntry: Serialize + DeserializeOwned + Send + Sync {
    /// Get the timestamp of the entry
    fn timestamp(&self) -> Ts;
}

/// Write-Ahead Log
pub struct Wal {
    dir: PathBuf,
    segment_size: u64,
    current_segment: Option<Segment>,
    segment_counter: u64,
}

impl Wal {
    /// Open (or create) a WAL in the specified directory
    ///
    /// New appends always go to a fresh segment after the highest existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or listed.
    pub fn new(dir: &Path, segment_size: Option<u64>) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create WAL directory {}", dir.display()))?;
        }

        let segment_size = segment_size.unwrap_or(DEFAULT_SEGMENT_SIZE);
        let segment_counter = Self::find_latest_segment(dir)?;

        info!(
            "Initialized WAL at {} with segment size {} MB",
            dir.display(),
            segment_size / BYTES_PER_MB
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            segment_size,
            current_segment: None,
            segment_counter,
        })
    }

    /// Append an entry to the WAL
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, segment rotation or the write fails.
    pub fn append<T: WalEntry>(&mut self, entry: &T) -> Result<()> {
        let data = bincode::serialize(entry)?;

        let needs_rotation = self
            .current_segment
            .as_ref()
            .is_none_or(|s| s.is_full(data.len()));
        if needs_rotation {
            self.rotate_segment()?;
        }

        let segment = self
            .current_segment
            .as_mut()
            .ok_or_else(|| anyhow!("Failed to create segment"))?;
        if let Err(e) = segment.append(&data) {
            self.discard_unsynced();
            return Err(e);
        }
        Ok(())
    }

    /// Flush the WAL to disk
    ///
    /// On failure every entry appended since the last successful flush is
    /// discarded and the next append starts a fresh segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the current segment cannot be synced.
    pub fn flush(&mut self) -> Result<()> {
        let Some(segment) = &mut self.current_segment else {
            return Ok(());
        };
        if let Err(e) = segment.flush() {
            self.discard_unsynced();
            return Err(e);
        }
        Ok(())
    }

    /// Create an iterator to stream entries, optionally skipping those before a timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the WAL directory cannot be listed.
    pub fn stream<T: WalEntry>(&self, from_ts: Option<Ts>) -> Result<WalIterator<T>> {
        WalIterator::new(&self.dir, from_ts)
    }

    /// Get statistics about the WAL
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a segment's metadata cannot be read.
    pub fn stats(&self) -> Result<WalStats> {
        let segments = Self::list_segments(&self.dir)?;
        let segment_count = segments.len() as u64;

        let mut total_size = 0;
        let mut total_entries = 0;

        for segment_path in segments {
            total_size += fs::metadata(&segment_path)?.len();

            // The header count is stale for the open segment, so count frames
            let mut reader = Segment::open(&segment_path)
                .with_context(|| format!("Failed to open segment {}", segment_path.display()))?;
            while reader.read_next()?.is_some() {}
            total_entries += reader.entries_read();
        }

        Ok(WalStats {
            segment_count,
            total_size,
            total_entries,
            current_segment_size: self.current_segment.as_ref().map(Segment::size),
        })
    }

    fn discard_unsynced(&mut self) {
        if let Some(segment) = self.current_segment.take() {
            if let Err(e) = segment.abandon() {
                warn!("Failed to truncate abandoned segment: {}", e);
            }
        }
    }

    fn rotate_segment(&mut self) -> Result<()> {
        if let Some(segment) = self.current_segment.take() {
            segment.close()?;
        }

        self.segment_counter += 1;
        let segment_path = self.segment_path(self.segment_counter);
        self.current_segment = Some(Segment::create(&segment_path, self.segment_size)?);

        debug!("Rotated to new segment: {}", segment_path.display());
        Ok(())
    }

    fn segment_path(&self, counter: u64) -> PathBuf {
        self.dir.join(format!("{counter:010}.wal"))
    }

    fn find_latest_segment(dir: &Path) -> Result<u64> {
        let segments = Self::list_segments(dir)?;

        Ok(segments
            .iter()
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u64>().ok())
            })
            .max()
            .unwrap_or(0))
    }

    fn list_segments(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut segments: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("wal"))
            .collect();

        segments.sort();
        Ok(segments)
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        if let Some(segment) = self.current_segment.take() {
            if let Err(e) = segment.close() {
                warn!("Failed to close segment on WAL drop: {}", e);
            }
        }
    }
}

/// Statistics about the WAL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalStats {
    /// Number of segments
    pub segment_count: u64,
    /// Total size in bytes
    pub total_size: u64,
    /// Total number of entries
    pub total_entries: u64,
    /// Current segment size
    pub current_segment_size: Option<u64>,
}

/// Iterator for reading WAL entries in append order
pub struct WalIterator<T: WalEntry> {
    segments: Vec<PathBuf>,
    current_reader: Option<SegmentReader>,
    current_index: usize,
    from_ts: Option<Ts>,
    _phantom: PhantomData<T>,
}

impl<T: WalEntry> WalIterator<T> {
    fn new(dir: &Path, from_ts: Option<Ts>) -> Result<Self> {
        Ok(Self {
            segments: Wal::list_segments(dir)?,
            current_reader: None,
            current_index: 0,
            from_ts,
            _phantom: PhantomData,
        })
    }

    /// Read the next entry, `None` once every segment is exhausted
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, CRC mismatch or an undecodable entry.
    pub fn read_next_entry(&mut self) -> Result<Option<T>> {
        loop {
            if self.current_reader.is_none() {
                let Some(path) = self.segments.get(self.current_index) else {
                    return Ok(None);
                };
                self.current_reader = Some(Segment::open(path)?);
                self.current_index += 1;
            }

            let Some(reader) = self.current_reader.as_mut() else {
                continue;
            };

            match reader.read_next()? {
                Some(data) => {
                    let entry: T = bincode::deserialize(&data)
                        .context("Failed to decode WAL entry")?;

                    if self.from_ts.is_some_and(|from| entry.timestamp() < from) {
                        continue;
                    }

                    return Ok(Some(entry));
                }
                None => self.current_reader = None,
            }
        }
    }
}
