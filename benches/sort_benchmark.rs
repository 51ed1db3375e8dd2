use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use csvql::codec::{apply_direction, encode_f64};
use csvql::query::Direction;
use csvql::sort::{sort_records, SortConfig, SortRecord};

fn generate_records(n: usize) -> Vec<SortRecord<'static>> {
    (0..n)
        .map(|i| {
            // A cheap pseudo-random permutation so the sort can't exploit
            // an already-sorted or reverse-sorted input.
            let v = ((i as u64).wrapping_mul(2654435761) % (n as u64 + 1)) as f64;
            SortRecord {
                radix_key: apply_direction(encode_f64(v), false),
                numeric_key: v,
                sort_bytes: b"",
                row_bytes: b"",
            }
        })
        .collect()
}

fn bench_sort_records_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_records_full");
    for n in [10_000, 100_000, 1_000_000] {
        let config = SortConfig::default();
        group.bench_with_input(BenchmarkId::new("n", n), &n, |b, &n| {
            b.iter_batched(
                || generate_records(n),
                |mut records| {
                    sort_records(black_box(&mut records), Direction::Asc, None, &config);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_records_top_k");
    let n = 1_000_000;
    for k in [10, 100, 2000] {
        let config = SortConfig::default();
        group.bench_with_input(BenchmarkId::new("k", k), &k, |b, &k| {
            b.iter_batched(
                || generate_records(n),
                |mut records| {
                    sort_records(black_box(&mut records), Direction::Desc, Some(k as u64), &config);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sort_records_full, bench_top_k);
criterion_main!(benches);
