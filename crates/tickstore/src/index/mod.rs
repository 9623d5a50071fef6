//! Ordered time index structures.
//!
//! The [`BTree`] maps slice start timestamps to the physical
//! [`crate::slice::TimeSlice`] covering them; a schema layer consults it
//! to pick which file and byte offset back a time range before a column
//! stream is even opened. It is a pure data structure with no knowledge
//! of the codecs or streams.

pub mod btree;

pub use btree::{BTree, RangeIter};
