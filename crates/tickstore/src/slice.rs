//! Physical time-slice descriptors.
//!
//! A [`TimeSlice`] names one contiguous span of time covered by a single
//! encoded unit (a file, or a block within one). [`FileTimeSlice`] adds
//! an ordered list of break points mapping tick boundaries to byte
//! offsets, so a reader can seek straight to the block covering a tick
//! instead of scanning from the start.
//!
//! Slices are plain data: the column layer creates and mutates them, the
//! time index (`index::BTree`) only stores and orders them by `start`.

use crate::codec::Tick;

/// A contiguous `[start, end]` span of time, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlice {
    /// First tick covered by the slice.
    pub start: Tick,
    /// Last tick covered by the slice.
    pub end: Tick,
}

impl TimeSlice {
    /// Creates a slice covering `[start, end]`.
    pub fn new(start: Tick, end: Tick) -> Self {
        Self { start, end }
    }

    /// Returns true if `ticks` falls inside the slice.
    pub fn contains(&self, ticks: Tick) -> bool {
        ticks >= self.start && ticks <= self.end
    }

    /// Returns true if `other` shares any tick with this slice.
    pub fn overlaps(&self, other: &TimeSlice) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Extends the slice forward to cover `end` if it does not already.
    pub fn extend_to(&mut self, end: Tick) {
        if end > self.end {
            self.end = end;
        }
    }
}

/// One break point inside a file: the block starting at `offset` covers
/// ticks from `start` up to the next break point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBreak {
    /// First tick of the block.
    pub start: Tick,
    /// Byte offset of the block's first frame in the file.
    pub offset: u64,
}

/// A [`TimeSlice`] tied to a physical file, carrying the break points of
/// the encoded blocks inside it in ascending tick order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTimeSlice {
    slice: TimeSlice,
    breaks: Vec<BlockBreak>,
}

impl FileTimeSlice {
    /// Creates a slice covering `[start, end]` with no break points yet.
    pub fn new(start: Tick, end: Tick) -> Self {
        Self {
            slice: TimeSlice::new(start, end),
            breaks: Vec::new(),
        }
    }

    /// The time span this file covers.
    pub fn slice(&self) -> &TimeSlice {
        &self.slice
    }

    /// First tick covered by the file.
    pub fn start(&self) -> Tick {
        self.slice.start
    }

    /// Last tick covered by the file.
    pub fn end(&self) -> Tick {
        self.slice.end
    }

    /// The recorded break points, in ascending tick order.
    pub fn breaks(&self) -> &[BlockBreak] {
        &self.breaks
    }

    /// Records a block boundary. Breaks must be appended in ascending
    /// `start` order; out-of-order appends are ignored so a stale
    /// duplicate registration cannot corrupt the lookup order.
    pub fn push_break(&mut self, start: Tick, offset: u64) {
        if let Some(last) = self.breaks.last() {
            if start <= last.start {
                return;
            }
        }
        self.breaks.push(BlockBreak { start, offset });
        self.slice.extend_to(start);
    }

    /// Finds the block covering `ticks`: the last break point whose
    /// `start` is at or before `ticks`. Returns `None` when `ticks`
    /// precedes every recorded block.
    pub fn block_for(&self, ticks: Tick) -> Option<&BlockBreak> {
        let idx = self.breaks.partition_point(|b| b.start <= ticks);
        idx.checked_sub(1).map(|i| &self.breaks[i])
    }
}
