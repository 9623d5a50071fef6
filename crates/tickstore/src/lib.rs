//! Tickstore - Columnar Tick Storage Core
//!
//! This crate provides the storage primitives for a columnar time-series
//! store: compact integer and delta codecs, a block-framed column
//! stream, a B-tree time index, and forward-only cursors that walk many
//! columns in time lock-step.
//!
//! # Components
//!
//! - [`codec::varint`]: length-class variable-width integer codec
//! - [`DeltaCodec`]: minimum-delta chunk compression over the varint codec
//! - [`ColumnStream`]: length-prefixed, versioned, checksummed frames
//!   over a pluggable byte sink
//! - [`BTree`]: arena-backed ordered index mapping slice start times to
//!   [`FileTimeSlice`] descriptors
//! - [`FieldCursor`] / [`MultiFieldCursor`]: lookahead cursors with hold
//!   semantics
//! - [`SymbolLocks`] / [`FileLock`]: the open/close concurrency boundary
//!   around the single-threaded core
//!
//! # Example
//!
//! ```rust,ignore
//! use tickstore::{ColumnStream, DeltaCodec, Entry, FieldCursor, MemorySink};
//!
//! // Encode a column of (ticks, value) samples into framed blocks.
//! let mut stream = ColumnStream::new(DeltaCodec::<i64>::new(), MemorySink::default());
//! stream.write(&[Entry::new(0, 100), Entry::new(10, 101)])?;
//! stream.flush()?;
//! stream.reset()?;
//!
//! // Walk it back with hold semantics.
//! let mut cursor = FieldCursor::new(stream);
//! cursor.move_next(5)?;
//! assert_eq!(cursor.value(), 100);
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod cursor;
pub mod error;
pub mod index;
pub mod lock;
pub mod slice;
pub mod stream;

pub use codec::{
    Codec, DeltaCodec, Entry, FieldScalar, FieldValue, RawCodec, Tick, ValueKind, MAX_TICKS,
    MIN_TICKS,
};
pub use cursor::{FieldCursor, MultiFieldCursor, Snapshot, TimeCursor};
pub use error::{Result, StoreError};
pub use index::BTree;
pub use lock::{FileLock, FileLockConfig, SymbolLocks};
pub use slice::{BlockBreak, FileTimeSlice, TimeSlice};
pub use stream::{
    ByteSink, ColumnStream, IoSink, MemorySink, StreamConfig, FRAME_CHECKSUM, FRAME_HEADER_SIZE,
    FRAME_VERSION,
};
