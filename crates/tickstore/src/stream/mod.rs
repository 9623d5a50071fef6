//! Block-framed column stream.
//!
//! A [`ColumnStream`] marshals typed entries through a pluggable
//! [`Codec`] into framed blocks on an underlying [`ByteSink`]. Each
//! frame carries a fixed little-endian header, the codec payload and a
//! trailing sentinel byte:
//!
//! ```text
//! +----------------+----------------+---------+------------------+----------+
//! | payload_len u32| data_len u32   | ver u8  | payload bytes    | check u8 |
//! +----------------+----------------+---------+------------------+----------+
//! ```
//!
//! `data_len` is the decoded entry count, `ver` is [`FRAME_VERSION`] and
//! the final byte is the fixed [`FRAME_CHECKSUM`] sentinel. The sentinel
//! is a corruption tripwire, not a hash: truncated, overwritten or
//! misaligned bytes surface as [`StoreError::CorruptedData`] on read.
//!
//! Frames are strictly append-ordered and read back in write order; the
//! format carries no random-access index of its own. Seeking to a time
//! range is the job of the external time index, consulted before a
//! stream is opened at an offset.

use crate::codec::Codec;
use crate::error::{Result, StoreError};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Current frame format version.
pub const FRAME_VERSION: u8 = 1;

/// Fixed sentinel byte terminating every frame.
pub const FRAME_CHECKSUM: u8 = 12;

/// Bytes of fixed header preceding the payload.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Byte-oriented transport under a [`ColumnStream`].
///
/// `read` fills as much of `buf` as the sink can supply and returns the
/// byte count; a short count signals end of stream. `reset` rewinds to
/// the first byte written so the stream can be re-read.
pub trait ByteSink {
    /// Reads up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Rewinds the sink to its first byte.
    fn reset(&mut self) -> Result<()>;

    /// Forces buffered bytes down to the backing store.
    fn flush(&mut self) -> Result<()>;
}

/// [`ByteSink`] over anything that is `Read + Write + Seek`: a file, or
/// an in-memory cursor in tests.
#[derive(Debug)]
pub struct IoSink<T> {
    inner: T,
}

impl<T> IoSink<T> {
    /// Wraps `inner`.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Returns the wrapped transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek> ByteSink for IoSink<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// In-memory sink used by tests and by callers staging a column before
/// it is written out.
pub type MemorySink = IoSink<std::io::Cursor<Vec<u8>>>;

impl Default for MemorySink {
    fn default() -> Self {
        IoSink::new(std::io::Cursor::new(Vec::new()))
    }
}

/// Tunables for a [`ColumnStream`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Entries buffered before a frame is emitted.
    pub frame_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_capacity: 1024,
        }
    }
}

impl StreamConfig {
    /// Sets the number of entries per frame.
    pub fn with_frame_capacity(mut self, frame_capacity: usize) -> Self {
        self.frame_capacity = frame_capacity.max(1);
        self
    }
}

/// Frames codec-encoded entry blocks over a byte sink.
///
/// The stream owns its sink and its staging buffers outright; it is
/// single-threaded by design. Writers push entries with [`write`] and
/// finish with [`flush`]; readers pull with [`read`] or [`read_entry`]
/// until a short count signals the end.
///
/// [`write`]: ColumnStream::write
/// [`flush`]: ColumnStream::flush
/// [`read`]: ColumnStream::read
/// [`read_entry`]: ColumnStream::read_entry
pub struct ColumnStream<C: Codec, S> {
    codec: C,
    sink: S,
    frame_capacity: usize,
    /// Entries staged for the next outgoing frame.
    pending: Vec<C::Item>,
    /// Entries decoded from the current incoming frame.
    decoded: Vec<C::Item>,
    read_pos: usize,
    scratch: Vec<u8>,
    frames_written: u64,
}

impl<C, S> ColumnStream<C, S>
where
    C: Codec,
    C::Item: Copy,
    S: ByteSink,
{
    /// Creates a stream with default tunables.
    pub fn new(codec: C, sink: S) -> Self {
        Self::with_config(codec, sink, StreamConfig::default())
    }

    /// Creates a stream with explicit tunables.
    pub fn with_config(codec: C, sink: S, config: StreamConfig) -> Self {
        Self {
            codec,
            sink,
            frame_capacity: config.frame_capacity.max(1),
            pending: Vec::new(),
            decoded: Vec::new(),
            read_pos: 0,
            scratch: Vec::new(),
            frames_written: 0,
        }
    }

    /// Stages entries for writing, emitting a frame each time the
    /// staging buffer reaches capacity. Partial fills stay staged until
    /// the next write or an explicit [`flush`](ColumnStream::flush).
    pub fn write(&mut self, entries: &[C::Item]) -> Result<()> {
        for &entry in entries {
            self.pending.push(entry);
            if self.pending.len() >= self.frame_capacity {
                self.write_frame()?;
            }
        }
        Ok(())
    }

    /// Emits any staged entries as a final frame and flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            self.write_frame()?;
        }
        self.sink.flush()
    }

    fn write_frame(&mut self) -> Result<()> {
        let count = self.pending.len();
        let reserve = self
            .codec
            .max_encoded_size(count)
            .ok_or(StoreError::Overflow)?;

        self.scratch.clear();
        self.scratch.reserve(reserve);
        self.codec.encode(&self.pending, &mut self.scratch);
        self.pending.clear();

        let payload_len =
            u32::try_from(self.scratch.len()).map_err(|_| StoreError::Overflow)?;
        let data_len = u32::try_from(count).map_err(|_| StoreError::Overflow)?;

        self.sink.write(&payload_len.to_le_bytes())?;
        self.sink.write(&data_len.to_le_bytes())?;
        self.sink.write(&[FRAME_VERSION])?;
        self.sink.write(&self.scratch)?;
        self.sink.write(&[FRAME_CHECKSUM])?;

        self.frames_written += 1;
        debug!(
            frame = self.frames_written,
            entries = count,
            payload_bytes = self.scratch.len(),
            "wrote column frame"
        );
        Ok(())
    }

    /// Reads up to `count` entries into `out`, pulling and decoding
    /// frames from the sink as the internal buffer drains. Returns how
    /// many entries were delivered; fewer than `count` means the stream
    /// is exhausted.
    pub fn read(&mut self, out: &mut Vec<C::Item>, count: usize) -> Result<usize> {
        let mut delivered = 0;
        while delivered < count {
            if self.read_pos == self.decoded.len() && !self.read_frame()? {
                break;
            }
            let available = self.decoded.len() - self.read_pos;
            let take = available.min(count - delivered);
            out.extend_from_slice(&self.decoded[self.read_pos..self.read_pos + take]);
            self.read_pos += take;
            delivered += take;
        }
        Ok(delivered)
    }

    /// Reads the next entry, or `None` at end of stream.
    pub fn read_entry(&mut self) -> Result<Option<C::Item>> {
        if self.read_pos == self.decoded.len() && !self.read_frame()? {
            return Ok(None);
        }
        let entry = self.decoded[self.read_pos];
        self.read_pos += 1;
        Ok(Some(entry))
    }

    /// Pulls one frame from the sink into the decode buffer. Returns
    /// false on a clean end of stream.
    fn read_frame(&mut self) -> Result<bool> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        let n = self.sink.read(&mut header)?;
        if n == 0 {
            return Ok(false);
        }
        if n < FRAME_HEADER_SIZE {
            return Err(StoreError::CorruptedData(format!(
                "truncated frame header: {n} of {FRAME_HEADER_SIZE} bytes"
            )));
        }

        let payload_len = u32::from_le_bytes(
            header[0..4].try_into().expect("header slice is 4 bytes"),
        ) as usize;
        let data_len = u32::from_le_bytes(
            header[4..8].try_into().expect("header slice is 4 bytes"),
        ) as usize;
        let version = header[8];

        self.scratch.clear();
        self.scratch.resize(payload_len + 1, 0);
        let n = self.sink.read(&mut self.scratch)?;
        if n < payload_len + 1 {
            return Err(StoreError::CorruptedData(format!(
                "truncated frame body: {n} of {} bytes",
                payload_len + 1
            )));
        }
        if self.scratch[payload_len] != FRAME_CHECKSUM {
            return Err(StoreError::CorruptedData(format!(
                "bad frame checksum: {:#04x}",
                self.scratch[payload_len]
            )));
        }
        if version != FRAME_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }

        self.decoded.clear();
        self.read_pos = 0;
        self.codec
            .decode(&self.scratch[..payload_len], &mut self.decoded);
        if self.decoded.len() != data_len {
            return Err(StoreError::CorruptedData(format!(
                "frame entry count mismatch: decoded {}, header says {data_len}",
                self.decoded.len()
            )));
        }
        Ok(true)
    }

    /// Rewinds the sink and the internal buffers for re-reading from
    /// the first frame. Staged unwritten entries are discarded.
    pub fn reset(&mut self) -> Result<()> {
        self.pending.clear();
        self.decoded.clear();
        self.read_pos = 0;
        self.sink.reset()
    }

    /// Flushes any staged entries and releases the sink.
    pub fn into_inner(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.sink)
    }
}
