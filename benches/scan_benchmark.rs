use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use csvql::plan::ProjectionPlan;
use csvql::scan::{compute_chunks, scan_chunk};
use csvql::scanner::split_row;

fn generate_csv(rows: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..rows {
        data.extend_from_slice(format!("{},name{},{}\n", i, i, i as f64 * 1.5).as_bytes());
    }
    data
}

fn bench_split_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_row");
    for width in [3, 10, 50] {
        let row: Vec<u8> = (0..width)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",")
            .into_bytes();
        group.bench_with_input(BenchmarkId::new("fields", width), &row, |b, row| {
            b.iter(|| split_row(black_box(row)));
        });
    }
    group.finish();
}

fn bench_scan_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_chunk");
    for size_mb in [1, 10] {
        let rows = size_mb * 1024 * 1024 / 20;
        let data = generate_csv(rows);
        group.bench_with_input(
            BenchmarkId::new("no_predicate", format!("{size_mb}MB")),
            &data,
            |b, data| {
                b.iter(|| scan_chunk(black_box(data), None, &ProjectionPlan::All, None));
            },
        );
    }
    group.finish();
}

fn bench_compute_chunks(c: &mut Criterion) {
    let data = generate_csv(500_000);
    c.bench_function("compute_chunks_8way", |b| {
        b.iter(|| compute_chunks(black_box(&data), 8));
    });
}

criterion_group!(benches, bench_split_row, bench_scan_chunk, bench_compute_chunks);
criterion_main!(benches);
