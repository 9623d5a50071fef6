//! Forward-only time cursors over column streams.
//!
//! A [`FieldCursor`] walks one column with a two-entry lookahead window:
//! `current` is the last sample at or before the cursor's time, `next`
//! is the first sample not yet reached. Advancing to a target tick
//! shifts the window forward until `next` lies strictly beyond the
//! target, so the cursor always reports the value that was in effect at
//! the target time (hold semantics).
//!
//! [`MultiFieldCursor`] drives several field cursors in time lock-step:
//! one `move_next` fans out to every column, the cursor's own time is
//! the latest time any column has reached, and `next_ticks` is the
//! nearest upcoming sample across all of them. Repeatedly stepping to
//! `next_ticks` therefore visits every timestamp at which any column
//! changes, without knowing ahead of time which column changes next.
//!
//! Targets must be non-decreasing across calls; the cursors never seek
//! backward (use [`reset`](FieldCursor::reset) to restart from the top).

use crate::codec::{Codec, Entry, FieldScalar, FieldValue, Tick, MAX_TICKS, MIN_TICKS};
use crate::error::Result;
use crate::stream::{ByteSink, ColumnStream};

/// The two-entry lookahead window a field cursor pins in memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot<V> {
    /// Last sample at or before the cursor's time.
    pub current: Entry<V>,
    /// First sample not yet reached; `ticks == MAX_TICKS` at stream end.
    pub next: Entry<V>,
}

impl<V: FieldValue> Snapshot<V> {
    /// The before-any-data window: both entries hold the type's missing
    /// value at `MIN_TICKS`.
    fn initial() -> Self {
        let blank = Entry::new(MIN_TICKS, V::missing());
        Self {
            current: blank,
            next: blank,
        }
    }
}

/// Type-erased cursor surface, letting a [`MultiFieldCursor`] compose
/// columns of different value types.
pub trait TimeCursor {
    /// Advances so `current` holds the last sample at or before
    /// `target`.
    fn move_next(&mut self, target: Tick) -> Result<()>;

    /// Tick of the sample currently held.
    fn ticks(&self) -> Tick;

    /// Tick of the next sample, or `MAX_TICKS` at stream end.
    fn next_ticks(&self) -> Tick;

    /// The held value with its type made explicit.
    fn scalar(&self) -> FieldScalar;

    /// Restarts the cursor from before the first sample.
    fn reset(&mut self) -> Result<()>;
}

/// Forward-only cursor over a single column stream.
///
/// Owns its stream and snapshot outright; single-threaded by design.
/// For multi-threaded fan-out, give each thread its own cursor over its
/// own stream.
pub struct FieldCursor<V, C, S>
where
    V: FieldValue,
    C: Codec<Item = Entry<V>>,
    S: ByteSink,
{
    snapshot: Snapshot<V>,
    stream: ColumnStream<C, S>,
    primed: bool,
}

impl<V, C, S> FieldCursor<V, C, S>
where
    V: FieldValue,
    C: Codec<Item = Entry<V>>,
    S: ByteSink,
{
    /// Creates a cursor positioned before the first sample of `stream`.
    pub fn new(stream: ColumnStream<C, S>) -> Self {
        Self {
            snapshot: Snapshot::initial(),
            stream,
            primed: false,
        }
    }

    /// Loads the first sample into the lookahead slot.
    fn prime(&mut self) -> Result<()> {
        match self.stream.read_entry()? {
            Some(entry) => self.snapshot.next = entry,
            None => self.snapshot.next.ticks = MAX_TICKS,
        }
        self.primed = true;
        Ok(())
    }

    /// Advances so `current` holds the last sample with
    /// `ticks <= target`. With duplicate ticks the last one written
    /// wins. Past the final sample, `current` holds it forever and
    /// `next.ticks` pins to `MAX_TICKS`.
    pub fn move_next(&mut self, target: Tick) -> Result<()> {
        if !self.primed {
            self.prime()?;
        }
        while self.snapshot.next.ticks != MAX_TICKS && target >= self.snapshot.next.ticks {
            self.snapshot.current = self.snapshot.next;
            match self.stream.read_entry()? {
                Some(entry) => self.snapshot.next = entry,
                None => self.snapshot.next.ticks = MAX_TICKS,
            }
        }
        Ok(())
    }

    /// Value in effect at the cursor's time. O(1), no I/O.
    pub fn value(&self) -> V {
        self.snapshot.current.value
    }

    /// Tick of the sample currently held; `MIN_TICKS` before the first.
    pub fn ticks(&self) -> Tick {
        self.snapshot.current.ticks
    }

    /// Tick of the next sample, or `MAX_TICKS` at stream end.
    pub fn next_ticks(&self) -> Tick {
        self.snapshot.next.ticks
    }

    /// The lookahead window.
    pub fn snapshot(&self) -> &Snapshot<V> {
        &self.snapshot
    }

    /// Rewinds the stream and restores the before-any-data window.
    pub fn reset(&mut self) -> Result<()> {
        self.stream.reset()?;
        self.snapshot = Snapshot::initial();
        self.primed = false;
        Ok(())
    }
}

impl<V, C, S> TimeCursor for FieldCursor<V, C, S>
where
    V: FieldValue,
    C: Codec<Item = Entry<V>>,
    S: ByteSink,
{
    fn move_next(&mut self, target: Tick) -> Result<()> {
        FieldCursor::move_next(self, target)
    }

    fn ticks(&self) -> Tick {
        FieldCursor::ticks(self)
    }

    fn next_ticks(&self) -> Tick {
        FieldCursor::next_ticks(self)
    }

    fn scalar(&self) -> FieldScalar {
        self.snapshot.current.value.to_scalar()
    }

    fn reset(&mut self) -> Result<()> {
        FieldCursor::reset(self)
    }
}

/// Cursor over several columns sharing one logical time axis.
pub struct MultiFieldCursor {
    fields: Vec<Box<dyn TimeCursor>>,
    ticks: Tick,
    next_ticks: Tick,
    moved: bool,
}

impl MultiFieldCursor {
    /// Composes the given field cursors. Order is preserved: field `i`
    /// here is field `i` in [`scalar`](MultiFieldCursor::scalar).
    pub fn new(fields: Vec<Box<dyn TimeCursor>>) -> Self {
        Self {
            fields,
            ticks: MIN_TICKS,
            next_ticks: MIN_TICKS,
            moved: false,
        }
    }

    /// Number of composed fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Advances every field to `target`, then recomputes the shared
    /// time axis: `ticks` is the latest time any field has reached,
    /// `next_ticks` the nearest upcoming sample across all fields.
    pub fn move_next(&mut self, target: Tick) -> Result<()> {
        let mut ticks = MIN_TICKS;
        let mut next_ticks = MAX_TICKS;
        for field in &mut self.fields {
            field.move_next(target)?;
            ticks = ticks.max(field.ticks());
            next_ticks = next_ticks.min(field.next_ticks());
        }
        self.ticks = ticks;
        self.next_ticks = next_ticks;
        self.moved = true;
        Ok(())
    }

    /// Steps to the next timestamp at which any field changes and
    /// returns it. Once every field is exhausted,
    /// [`next_ticks`](MultiFieldCursor::next_ticks) reports `MAX_TICKS`
    /// and further steps hold the final values.
    pub fn move_next_tick(&mut self) -> Result<Tick> {
        if !self.moved {
            // Establish the lookahead across all fields without
            // consuming any sample.
            self.move_next(MIN_TICKS)?;
        }
        let target = self.next_ticks;
        if target != MAX_TICKS {
            self.move_next(target)?;
        }
        Ok(self.ticks)
    }

    /// Latest time any field has reached.
    pub fn ticks(&self) -> Tick {
        self.ticks
    }

    /// Nearest upcoming sample across all fields, or `MAX_TICKS` when
    /// every field is exhausted.
    pub fn next_ticks(&self) -> Tick {
        self.next_ticks
    }

    /// Value of field `fields[i]` in effect at the cursor's time.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn scalar(&self, i: usize) -> FieldScalar {
        self.fields[i].scalar()
    }

    /// Restarts every field from before its first sample.
    pub fn reset(&mut self) -> Result<()> {
        for field in &mut self.fields {
            field.reset()?;
        }
        self.ticks = MIN_TICKS;
        self.next_ticks = MIN_TICKS;
        self.moved = false;
        Ok(())
    }
}
