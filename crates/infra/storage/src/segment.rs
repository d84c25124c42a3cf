//! WAL segment files with CRC32-framed entries
//!
//! Layout: a 16 byte header `[magic: u32][version: u32][entries: u64]`
//! followed by entries framed as `[length: u32][crc: u32][data]`. The header
//! entry count is only rewritten on a clean close, so readers scan to the end
//! of the file instead of trusting it; a torn final frame left by a crash ends
//! the scan without failing replay.

use anyhow::{Result, anyhow};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Size of segment header in bytes
pub const SEGMENT_HEADER_SIZE: u64 = 16;

/// Per-entry framing overhead in bytes
const FRAME_OVERHEAD: u64 = 8;

/// Magic number for segment files
const SEGMENT_MAGIC: u32 = 0x4E49_4453; // "NIDS"

/// Version of segment format
const SEGMENT_VERSION: u32 = 1;

/// A single WAL segment open for appending
pub struct Segment {
    path: PathBuf,
    file: BufWriter<File>,
    size: u64,
    max_size: u64,
    entries: u64,
    synced_size: u64,
    synced_entries: u64,
}

impl Segment {
    /// Create a new segment file, truncating any previous content
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header cannot be written.
    pub fn create(path: &Path, max_size: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_u32::<LittleEndian>(SEGMENT_MAGIC)?;
        writer.write_u32::<LittleEndian>(SEGMENT_VERSION)?;
        writer.write_u64::<LittleEndian>(0)?;
        writer.flush()?;

        Ok(Self {
            path: path.to_path_buf(),
            file: writer,
            size: SEGMENT_HEADER_SIZE,
            max_size,
            entries: 0,
            synced_size: SEGMENT_HEADER_SIZE,
            synced_entries: 0,
        })
    }

    /// Open an existing segment file for reading
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is not a segment header.
    pub fn open(path: &Path) -> Result<SegmentReader> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != SEGMENT_MAGIC {
            return Err(anyhow!(
                "Invalid segment magic {:#x} in {}",
                magic,
                path.display()
            ));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != SEGMENT_VERSION {
            return Err(anyhow!("Unsupported segment version: {}", version));
        }

        let recorded_entries = reader.read_u64::<LittleEndian>()?;

        Ok(SegmentReader {
            path: path.to_path_buf(),
            reader,
            recorded_entries,
            read: 0,
        })
    }

    /// Append one framed entry
    ///
    /// # Errors
    ///
    /// Returns an error if the segment has no room left or the write fails.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        if self.is_full(data.len()) {
            return Err(anyhow!("Segment is full"));
        }

        let mut hasher = Hasher::new();
        hasher.update(data);
        let crc = hasher.finalize();

        self.file
            .write_u32::<LittleEndian>(u32::try_from(data.len())?)?;
        self.file.write_u32::<LittleEndian>(crc)?;
        self.file.write_all(data)?;

        self.size += FRAME_OVERHEAD + u64::try_from(data.len())?;
        self.entries += 1;

        trace!(
            segment = %self.path.display(),
            entry = self.entries,
            bytes = data.len(),
            "Appended segment entry"
        );
        Ok(())
    }

    /// Check whether an entry of `next_entry_size` bytes would overflow the segment
    ///
    /// An empty segment always accepts one entry so oversized records still land.
    #[must_use]
    pub const fn is_full(&self, next_entry_size: usize) -> bool {
        if self.entries == 0 {
            return false;
        }
        self.size
            .saturating_add(FRAME_OVERHEAD)
            .saturating_add(next_entry_size as u64)
            > self.max_size
    }

    /// Flush buffered frames and fsync the file
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or sync fails.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_mut().sync_all()?;
        self.synced_size = self.size;
        self.synced_entries = self.entries;
        Ok(())
    }

    /// Give up on the segment after a failed write or sync
    ///
    /// Frames appended since the last successful [`Segment::flush`] are
    /// discarded: buffered bytes are dropped unwritten and the file is cut back
    /// to its synced length, so a later replay never sees them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be truncated.
    pub fn abandon(self) -> Result<()> {
        let (file, _unwritten) = self.file.into_parts();
        file.set_len(self.synced_size)?;

        warn!(
            segment = %self.path.display(),
            discarded = self.entries - self.synced_entries,
            "Abandoned segment, unsynced entries dropped"
        );
        Ok(())
    }

    /// Close the segment, recording the final entry count in the header
    ///
    /// # Errors
    ///
    /// Returns an error if the header update or the final sync fails.
    pub fn close(mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(8))?;
        self.file.write_u64::<LittleEndian>(self.entries)?;
        self.flush()?;

        debug!(
            "Closed segment {} with {} entries",
            self.path.display(),
            self.entries
        );
        Ok(())
    }

    /// Number of entries appended to this segment
    #[must_use]
    pub const fn entry_count(&self) -> u64 {
        self.entries
    }

    /// Current size of the segment in bytes, header included
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// Sequential reader over a segment's frames
pub struct SegmentReader {
    path: PathBuf,
    reader: BufReader<File>,
    recorded_entries: u64,
    read: u64,
}

impl SegmentReader {
    /// Read the next entry payload, `None` at the end of the segment
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or when a complete frame fails its CRC check.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>> {
        let length = match self.reader.read_u32::<LittleEndian>() {
            Ok(length) => usize::try_from(length)?,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let expected_crc = match self.reader.read_u32::<LittleEndian>() {
            Ok(crc) => crc,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(self.torn_tail()),
            Err(e) => return Err(e.into()),
        };

        let mut data = vec![0u8; length];
        match self.reader.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(self.torn_tail()),
            Err(e) => return Err(e.into()),
        }

        let mut hasher = Hasher::new();
        hasher.update(&data);
        let actual_crc = hasher.finalize();

        if actual_crc != expected_crc {
            return Err(anyhow!(
                "CRC mismatch in {}: expected {:#x}, got {:#x}",
                self.path.display(),
                expected_crc,
                actual_crc
            ));
        }

        self.read += 1;
        Ok(Some(data))
    }

    /// Entry count stored in the header (zero for segments that were never closed)
    #[must_use]
    pub const fn recorded_entries(&self) -> u64 {
        self.recorded_entries
    }

    /// Number of entries read so far
    #[must_use]
    pub const fn entries_read(&self) -> u64 {
        self.read
    }

    fn torn_tail(&self) -> Option<Vec<u8>> {
        warn!(
            segment = %self.path.display(),
            entries_read = self.read,
            "Truncated frame at end of segment, ignoring tail"
        );
        None
    }
}
