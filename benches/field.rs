use std::hint::black_box;

use compact_binary::{varint, Field, FieldType, IoHash, Writer};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

/// An object holding `n` records, each a small object with a few scalar members and an
/// attachment.
fn sample_document(n: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut writer = Writer::new();
    writer.begin_object_value();
    writer.write_string("name", "bench");
    writer.begin_array("records");
    for i in 0..n {
        writer.begin_object_value();
        writer.write_integer("id", i as u64);
        writer.write_integer("delta", rng.gen_range(-1000i64..1000));
        writer.write_float64("score", rng.gen());
        writer.write_bool("live", rng.gen());
        writer.write_binary_attachment("blob", IoHash::compute(&i.to_le_bytes()));
        writer.end_object();
    }
    writer.end_array();
    writer.begin_uniform_array("ids", FieldType::IntegerPositive);
    for i in 0..n {
        writer.write_integer_value(i as u64);
    }
    writer.end_array();
    writer.end_object();
    writer.to_vec()
}

fn varint_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint");
    let cases = [("1_byte", 0x7fu64), ("4_bytes", 0x0fff_ffff), ("9_bytes", u64::MAX)];
    for (name, value) in cases {
        group.bench_with_input(BenchmarkId::new("write", name), &value, |b, &value| {
            let mut buf = Vec::with_capacity(varint::MAX_VARUINT_LEN);
            b.iter(|| {
                buf.clear();
                varint::write_u64(black_box(&mut buf), black_box(value));
            });
        });
        let mut encoded = Vec::new();
        varint::write_u64(&mut encoded, value);
        group.bench_with_input(BenchmarkId::new("read", name), &encoded, |b, encoded| {
            b.iter(|| varint::read_u64(&mut black_box(&encoded[..])).unwrap());
        });
    }
    group.finish();
}

fn document_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");
    for n in [10usize, 1000] {
        let doc = sample_document(n);

        group.bench_with_input(BenchmarkId::new("write", n), &n, |b, &n| {
            b.iter(|| sample_document(black_box(n)));
        });

        group.bench_with_input(BenchmarkId::new("parse", n), &doc, |b, doc| {
            b.iter(|| Field::new(black_box(doc)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("iterate", n), &doc, |b, doc| {
            let root = Field::new(doc).unwrap();
            b.iter(|| {
                let mut root = root;
                root.as_object()
                    .find("records")
                    .as_array()
                    .iter()
                    .map(|mut rec| rec.as_object().find("id").as_uint64(0))
                    .sum::<u64>()
            });
        });

        group.bench_with_input(BenchmarkId::new("hash", n), &doc, |b, doc| {
            let root = Field::new(doc).unwrap();
            b.iter(|| black_box(root).hash());
        });

        group.bench_with_input(BenchmarkId::new("attachments", n), &doc, |b, doc| {
            let root = Field::new(doc).unwrap();
            b.iter(|| compact_binary::collect_attachments(black_box(&root)).len());
        });
    }
    group.finish();
}

criterion_group!(benches, varint_benchmark, document_benchmark);
criterion_main!(benches);
