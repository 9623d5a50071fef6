//! Benchmarks for tickstore codecs, stream framing and the time index.
//!
//! Run with: cargo bench --package tickstore
//!
//! ## Benchmark Categories
//!
//! - **Varint Codec**: Per-value encode/decode across length classes
//! - **Delta Codec**: Chunk encode/decode and compression ratio
//! - **Column Stream**: Frame write/read throughput
//! - **B-Tree Index**: Insert, search, range scan
//! - **Cursor**: Full-column walk through move_next

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tickstore::codec::varint::{decode_i64, encode_i64, Reader};
use tickstore::{
    BTree, Codec, ColumnStream, DeltaCodec, Entry, FieldCursor, MemorySink, StreamConfig,
    MAX_TICKS,
};

/// Generate a typical tick column: regular 1 ms spacing with a slowly
/// drifting integer level.
fn generate_typical_column(count: usize) -> Vec<Entry<i64>> {
    let start = 1_000_000_000_000i64;
    let interval = 10_000i64; // 1 ms in ticks

    let mut value = 50_000i64;
    (0..count)
        .map(|i| {
            value += ((i as f64 * 0.1).sin() * 3.0) as i64;
            Entry::new(start + i as i64 * interval, value)
        })
        .collect()
}

fn bench_varint_encode(c: &mut Criterion) {
    let values: Vec<i64> = generate_typical_column(10_000)
        .iter()
        .map(|e| e.value)
        .collect();

    c.bench_function("varint_encode_10k", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(values.len() * 9);
            for &v in black_box(&values) {
                encode_i64(&mut buf, v);
            }
            black_box(buf)
        })
    });
}

fn bench_varint_decode(c: &mut Criterion) {
    let values: Vec<i64> = generate_typical_column(10_000)
        .iter()
        .map(|e| e.value)
        .collect();
    let mut buf = Vec::new();
    for &v in &values {
        encode_i64(&mut buf, v);
    }

    c.bench_function("varint_decode_10k", |b| {
        b.iter(|| {
            let mut r = Reader::new(black_box(&buf));
            let mut sum = 0i64;
            while !r.is_empty() {
                sum = sum.wrapping_add(decode_i64(&mut r));
            }
            black_box(sum)
        })
    });
}

fn bench_delta_encode_sizes(c: &mut Criterion) {
    let codec = DeltaCodec::<i64>::new();
    let mut group = c.benchmark_group("delta_encode");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let entries = generate_typical_column(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter(|| {
                let mut out = Vec::new();
                codec.encode(black_box(entries), &mut out);
                black_box(out)
            })
        });
    }

    group.finish();
}

fn bench_delta_decode_sizes(c: &mut Criterion) {
    let codec = DeltaCodec::<i64>::new();
    let mut group = c.benchmark_group("delta_decode");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let entries = generate_typical_column(*size);
        let mut encoded = Vec::new();
        codec.encode(&entries, &mut encoded);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut out = Vec::new();
                codec.decode(black_box(encoded), &mut out);
                black_box(out)
            })
        });
    }

    group.finish();
}

fn bench_delta_compression_ratio(c: &mut Criterion) {
    let codec = DeltaCodec::<i64>::new();
    let entries = generate_typical_column(10_000);
    let raw_size = entries.len() * 16;

    c.bench_function("delta_compression_ratio_measurement", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            codec.encode(&entries, &mut out);

            // Return ratio for verification (not part of benchmark timing)
            black_box(raw_size as f64 / out.len() as f64)
        })
    });
}

fn bench_stream_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_write");

    for size in [1_000, 10_000, 100_000].iter() {
        let entries = generate_typical_column(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter(|| {
                let mut stream =
                    ColumnStream::new(DeltaCodec::<i64>::new(), MemorySink::default());
                stream.write(black_box(entries)).unwrap();
                stream.flush().unwrap();
                black_box(stream.into_inner().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_stream_read(c: &mut Criterion) {
    let entries = generate_typical_column(10_000);
    let mut writer = ColumnStream::new(DeltaCodec::<i64>::new(), MemorySink::default());
    writer.write(&entries).unwrap();
    let bytes = writer.into_inner().unwrap().into_inner().into_inner();

    c.bench_function("stream_read_10k", |b| {
        b.iter(|| {
            let sink = MemorySink::new(std::io::Cursor::new(bytes.clone()));
            let mut stream = ColumnStream::new(DeltaCodec::<i64>::new(), sink);
            let mut out = Vec::with_capacity(entries.len());
            stream.read(&mut out, entries.len() + 1).unwrap();
            black_box(out)
        })
    });
}

fn bench_btree_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_insert");

    for size in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut tree = BTree::new(16).unwrap();
                for i in 0..size {
                    // Shuffled key order via a multiplicative stride.
                    let key = (i as i64 * 2654435761) % (size as i64 * 4);
                    tree.insert(key, i as u64);
                }
                black_box(tree)
            })
        });
    }

    group.finish();
}

fn bench_btree_search(c: &mut Criterion) {
    let size = 10_000i64;
    let mut tree = BTree::new(16).unwrap();
    for i in 0..size {
        tree.insert(i * 7, i);
    }

    c.bench_function("btree_search_10k", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for i in 0..size {
                if tree.search(black_box(&(i * 7))).is_some() {
                    hits += 1;
                }
            }
            black_box(hits)
        })
    });
}

fn bench_btree_range(c: &mut Criterion) {
    let size = 10_000i64;
    let mut tree = BTree::new(16).unwrap();
    for i in 0..size {
        tree.insert(i * 7, i);
    }

    let mut group = c.benchmark_group("btree_range");

    group.bench_function("full_10k", |b| {
        b.iter(|| black_box(tree.range(&0, &(size * 7)).count()))
    });

    group.bench_function("partial_1k", |b| {
        b.iter(|| black_box(tree.range(&(4_500 * 7), &(5_500 * 7)).count()))
    });

    group.finish();
}

fn bench_cursor_walk(c: &mut Criterion) {
    let entries = generate_typical_column(10_000);
    let mut writer = ColumnStream::new(DeltaCodec::<i64>::new(), MemorySink::default());
    writer.write(&entries).unwrap();
    let bytes = writer.into_inner().unwrap().into_inner().into_inner();

    c.bench_function("cursor_walk_10k", |b| {
        b.iter(|| {
            let sink = MemorySink::new(std::io::Cursor::new(bytes.clone()));
            let stream = ColumnStream::new(DeltaCodec::<i64>::new(), sink);
            let mut cursor = FieldCursor::new(stream);
            let mut sum = 0i64;
            while cursor.next_ticks() != MAX_TICKS {
                cursor.move_next(cursor.next_ticks()).unwrap();
                sum = sum.wrapping_add(cursor.value());
            }
            black_box(sum)
        })
    });
}

criterion_group!(
    benches,
    // Varint codec
    bench_varint_encode,
    bench_varint_decode,
    // Delta codec
    bench_delta_encode_sizes,
    bench_delta_decode_sizes,
    bench_delta_compression_ratio,
    // Column stream
    bench_stream_write,
    bench_stream_read,
    // B-tree index
    bench_btree_insert,
    bench_btree_search,
    bench_btree_range,
    // Cursor
    bench_cursor_walk,
);
criterion_main!(benches);
