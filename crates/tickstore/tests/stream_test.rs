//! Integration tests for the column stream frame format.
//!
//! Covers the wire layout (little-endian header, payload, sentinel
//! byte), corruption detection, multi-frame columns, and file-backed
//! sinks.

use std::io::Cursor;
use tickstore::{
    ColumnStream, DeltaCodec, Entry, IoSink, MemorySink, RawCodec, StoreError, StreamConfig,
    FRAME_CHECKSUM, FRAME_HEADER_SIZE, FRAME_VERSION,
};

fn sample_entries(count: usize) -> Vec<Entry<i64>> {
    (0..count)
        .map(|i| Entry::new(i as i64 * 1_000, 5_000 + (i as i64 % 11)))
        .collect()
}

/// Writes entries through a stream and returns the raw sink bytes.
fn write_column(entries: &[Entry<i64>], frame_capacity: usize) -> Vec<u8> {
    let config = StreamConfig::default().with_frame_capacity(frame_capacity);
    let mut stream =
        ColumnStream::with_config(DeltaCodec::<i64>::new(), MemorySink::default(), config);
    stream.write(entries).unwrap();
    stream.into_inner().unwrap().into_inner().into_inner()
}

fn read_column(bytes: Vec<u8>) -> Result<Vec<Entry<i64>>, StoreError> {
    let mut stream = ColumnStream::new(DeltaCodec::<i64>::new(), IoSink::new(Cursor::new(bytes)));
    let mut out = Vec::new();
    loop {
        let before = out.len();
        let n = stream.read(&mut out, 64)?;
        assert_eq!(out.len(), before + n);
        if n < 64 {
            return Ok(out);
        }
    }
}

#[test]
fn test_wire_layout_of_single_frame() {
    let entries = sample_entries(3);
    let bytes = write_column(&entries, 1024);

    let payload_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let data_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    assert_eq!(data_len, 3);
    assert_eq!(bytes[8], FRAME_VERSION);
    assert_eq!(bytes.len(), FRAME_HEADER_SIZE + payload_len + 1);
    assert_eq!(*bytes.last().unwrap(), FRAME_CHECKSUM);
}

#[test]
fn test_roundtrip_through_separate_instances() {
    for (count, capacity) in [(1usize, 1024usize), (5, 2), (1000, 64), (1000, 1000)] {
        let entries = sample_entries(count);
        let bytes = write_column(&entries, capacity);
        let decoded = read_column(bytes).unwrap();
        assert_eq!(decoded, entries, "count={count} capacity={capacity}");
    }
}

#[test]
fn test_corrupting_any_frame_checksum_fails() {
    let entries = sample_entries(10);
    let bytes = write_column(&entries, 5);

    // Two frames; flip the first frame's sentinel, which sits right
    // after its payload.
    let payload_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let checksum_at = FRAME_HEADER_SIZE + payload_len;
    let mut corrupted = bytes.clone();
    corrupted[checksum_at] = FRAME_CHECKSUM.wrapping_add(1);
    assert!(matches!(
        read_column(corrupted),
        Err(StoreError::CorruptedData(_))
    ));

    // Flip the second (final) frame's sentinel: first frame still reads.
    let mut corrupted = bytes;
    let last = corrupted.len() - 1;
    corrupted[last] = 0;
    assert!(matches!(
        read_column(corrupted),
        Err(StoreError::CorruptedData(_))
    ));
}

#[test]
fn test_truncation_mid_payload_fails() {
    let entries = sample_entries(4);
    let mut bytes = write_column(&entries, 1024);
    bytes.truncate(FRAME_HEADER_SIZE + 2);
    assert!(matches!(
        read_column(bytes),
        Err(StoreError::CorruptedData(_))
    ));
}

#[test]
fn test_truncation_mid_header_fails() {
    let entries = sample_entries(4);
    let mut bytes = write_column(&entries, 1024);
    bytes.truncate(FRAME_HEADER_SIZE - 3);
    assert!(matches!(
        read_column(bytes),
        Err(StoreError::CorruptedData(_))
    ));
}

#[test]
fn test_foreign_version_rejected() {
    let entries = sample_entries(2);
    let mut bytes = write_column(&entries, 1024);
    bytes[8] = FRAME_VERSION + 1;
    assert!(matches!(
        read_column(bytes),
        Err(StoreError::UnsupportedVersion(_))
    ));
}

#[test]
fn test_empty_column_reads_empty() {
    let bytes = write_column(&[], 1024);
    assert!(bytes.is_empty());
    assert_eq!(read_column(bytes).unwrap(), Vec::new());
}

#[test]
fn test_interleaved_write_flush_cycles() {
    let entries = sample_entries(25);
    let mut stream = ColumnStream::new(DeltaCodec::<i64>::new(), MemorySink::default());
    for chunk in entries.chunks(7) {
        stream.write(chunk).unwrap();
        stream.flush().unwrap();
    }
    stream.reset().unwrap();

    let mut out = Vec::new();
    stream.read(&mut out, 1000).unwrap();
    assert_eq!(out, entries);
}

#[test]
fn test_reset_rereads_from_start() {
    let entries = sample_entries(12);
    let config = StreamConfig::default().with_frame_capacity(4);
    let mut stream =
        ColumnStream::with_config(DeltaCodec::<i64>::new(), MemorySink::default(), config);
    stream.write(&entries).unwrap();
    stream.flush().unwrap();

    for _ in 0..3 {
        stream.reset().unwrap();
        let mut out = Vec::new();
        stream.read(&mut out, 100).unwrap();
        assert_eq!(out, entries);
    }
}

#[test]
fn test_file_backed_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bid.col");
    let entries = sample_entries(500);

    {
        let file = std::fs::File::create(&path).unwrap();
        let config = StreamConfig::default().with_frame_capacity(128);
        let mut stream =
            ColumnStream::with_config(DeltaCodec::<i64>::new(), IoSink::new(file), config);
        stream.write(&entries).unwrap();
        stream.flush().unwrap();
    }

    let file = std::fs::File::open(&path).unwrap();
    let mut stream = ColumnStream::new(DeltaCodec::<i64>::new(), IoSink::new(file));
    let mut out = Vec::new();
    stream.read(&mut out, 10_000).unwrap();
    assert_eq!(out, entries);
}

#[test]
fn test_float_column_through_raw_codec() {
    let entries: Vec<Entry<f64>> = (0..50)
        .map(|i| Entry::new(i * 100, i as f64 * 0.25))
        .collect();
    let mut stream = ColumnStream::new(RawCodec::<f64>::new(), MemorySink::default());
    stream.write(&entries).unwrap();
    stream.flush().unwrap();
    stream.reset().unwrap();

    let mut out = Vec::new();
    stream.read(&mut out, 100).unwrap();
    assert_eq!(out, entries);
}
