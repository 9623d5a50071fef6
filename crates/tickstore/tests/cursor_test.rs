//! Integration tests for field and multi-field cursors.
//!
//! Exercises hold semantics over framed columns, restartability, and
//! multi-column time synchronization, end to end through the delta
//! codec and the column stream.

use tickstore::{
    ColumnStream, DeltaCodec, Entry, FieldCursor, FieldScalar, MemorySink, MultiFieldCursor,
    RawCodec, StreamConfig, MAX_TICKS, MIN_TICKS,
};

fn int_cursor(
    samples: &[(i64, i64)],
    frame_capacity: usize,
) -> FieldCursor<i64, DeltaCodec<i64>, MemorySink> {
    let entries: Vec<Entry<i64>> = samples.iter().map(|&(t, v)| Entry::new(t, v)).collect();
    let config = StreamConfig::default().with_frame_capacity(frame_capacity);
    let mut stream =
        ColumnStream::with_config(DeltaCodec::<i64>::new(), MemorySink::default(), config);
    stream.write(&entries).unwrap();
    stream.flush().unwrap();
    stream.reset().unwrap();
    FieldCursor::new(stream)
}

fn float_cursor(samples: &[(i64, f64)]) -> FieldCursor<f64, RawCodec<f64>, MemorySink> {
    let entries: Vec<Entry<f64>> = samples.iter().map(|&(t, v)| Entry::new(t, v)).collect();
    let mut stream = ColumnStream::new(RawCodec::<f64>::new(), MemorySink::default());
    stream.write(&entries).unwrap();
    stream.flush().unwrap();
    stream.reset().unwrap();
    FieldCursor::new(stream)
}

#[test]
fn test_hold_semantics_across_frames() {
    // Frame capacity 2 forces the lookahead to cross frame boundaries.
    let mut cursor = int_cursor(&[(0, 10), (4, 40), (5, 50), (6, 60), (7, 70)], 2);

    cursor.move_next(2).unwrap();
    assert_eq!((cursor.ticks(), cursor.value()), (0, 10));
    assert_eq!(cursor.next_ticks(), 4);

    cursor.move_next(4).unwrap();
    assert_eq!((cursor.ticks(), cursor.value()), (4, 40));

    cursor.move_next(100).unwrap();
    assert_eq!((cursor.ticks(), cursor.value()), (7, 70));
    assert_eq!(cursor.next_ticks(), MAX_TICKS);
}

#[test]
fn test_every_target_in_dense_walk() {
    let samples: Vec<(i64, i64)> = (0..200).map(|i| (i * 3, i)).collect();
    let mut cursor = int_cursor(&samples, 16);

    for target in 0..700 {
        cursor.move_next(target).unwrap();
        let expected = (target / 3).min(199);
        assert_eq!(cursor.value(), expected, "target {target}");
        assert_eq!(cursor.ticks(), expected * 3);
    }
}

#[test]
fn test_reset_reproduces_walk() {
    let samples = [(0i64, 10i64), (4, 40), (5, 50), (6, 60), (7, 70)];
    let targets = [2i64, 4, 6, 100];
    let mut cursor = int_cursor(&samples, 3);

    let walk = |cursor: &mut FieldCursor<i64, DeltaCodec<i64>, MemorySink>| {
        targets
            .iter()
            .map(|&t| {
                cursor.move_next(t).unwrap();
                (cursor.ticks(), cursor.value(), cursor.next_ticks())
            })
            .collect::<Vec<_>>()
    };

    let first = walk(&mut cursor);
    cursor.reset().unwrap();
    assert_eq!(cursor.ticks(), MIN_TICKS);
    assert_eq!(cursor.value(), 0);
    let second = walk(&mut cursor);
    assert_eq!(first, second);
}

#[test]
fn test_multi_field_visits_union_once_in_order() {
    let bid = int_cursor(&[(0, 100), (1, 101), (2, 102), (3, 103), (4, 104)], 1024);
    let bid_size = int_cursor(&[(0, 7), (2, 9)], 1024);
    let mut multi = MultiFieldCursor::new(vec![Box::new(bid), Box::new(bid_size)]);

    let mut visited = Vec::new();
    while multi.next_ticks() != MAX_TICKS {
        visited.push(multi.move_next_tick().unwrap());
    }
    assert_eq!(visited, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_multi_field_mixed_types() {
    let price = float_cursor(&[(0, 1.25), (10, 1.5), (20, 1.75)]);
    let volume = int_cursor(&[(5, 300), (20, 500)], 1024);
    let mut multi = MultiFieldCursor::new(vec![Box::new(price), Box::new(volume)]);

    multi.move_next_tick().unwrap();
    assert_eq!(multi.ticks(), 0);
    assert_eq!(multi.scalar(0), FieldScalar::F64(1.25));
    // Volume column has no sample yet: integer missing value is 0.
    assert_eq!(multi.scalar(1), FieldScalar::I64(0));

    multi.move_next_tick().unwrap();
    assert_eq!(multi.ticks(), 5);
    assert_eq!(multi.scalar(1), FieldScalar::I64(300));

    multi.move_next_tick().unwrap();
    assert_eq!(multi.ticks(), 10);
    assert_eq!(multi.scalar(0), FieldScalar::F64(1.5));
    assert_eq!(multi.scalar(1), FieldScalar::I64(300));

    multi.move_next_tick().unwrap();
    assert_eq!(multi.ticks(), 20);
    assert_eq!(multi.scalar(0), FieldScalar::F64(1.75));
    assert_eq!(multi.scalar(1), FieldScalar::I64(500));
    assert_eq!(multi.next_ticks(), MAX_TICKS);
}

#[test]
fn test_multi_field_explicit_targets() {
    let a = int_cursor(&[(0, 1), (10, 2), (20, 3)], 1024);
    let b = int_cursor(&[(5, 10), (15, 20)], 1024);
    let mut multi = MultiFieldCursor::new(vec![Box::new(a), Box::new(b)]);

    multi.move_next(12).unwrap();
    assert_eq!(multi.ticks(), 10);
    assert_eq!(multi.next_ticks(), 15);
    assert_eq!(multi.scalar(0), FieldScalar::I64(2));
    assert_eq!(multi.scalar(1), FieldScalar::I64(10));

    multi.move_next(1_000).unwrap();
    assert_eq!(multi.ticks(), 20);
    assert_eq!(multi.next_ticks(), MAX_TICKS);
}

#[test]
fn test_multi_field_single_column_degenerate() {
    let only = int_cursor(&[(3, 33), (9, 99)], 1024);
    let mut multi = MultiFieldCursor::new(vec![Box::new(only)]);

    assert_eq!(multi.move_next_tick().unwrap(), 3);
    assert_eq!(multi.move_next_tick().unwrap(), 9);
    assert_eq!(multi.next_ticks(), MAX_TICKS);
    // Further steps hold the final values.
    assert_eq!(multi.move_next_tick().unwrap(), 9);
    assert_eq!(multi.scalar(0), FieldScalar::I64(99));
}
