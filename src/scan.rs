//! Memory-mapped input and the parallel scan orchestrator: split a mapped
//! region into line-aligned chunks, scan each independently with no shared
//! mutable state, and let the caller join worker outputs in order.

use std::cell::RefCell;
use std::io;
use std::path::Path;

use memchr::memchr;
use memmap2::Mmap;
use rayon::prelude::*;

use crate::codec::{apply_direction, encode_f64, encode_prefix};
use crate::common::io::mmap_file;
use crate::plan::{Predicate, ProjectionPlan, SortSpec};
use crate::predicate::{evaluate, parse_numeric_bytes};
use crate::query::Direction;
use crate::scanner::{split_row, FieldSlice, Lines};
use crate::sort::SortRecord;

/// A read-only, page-aligned view of the input file. Released exactly once
/// when dropped, after every worker referencing it has finished.
pub struct MappedRegion {
    mmap: Mmap,
}

impl MappedRegion {
    pub fn open(path: &Path) -> io::Result<MappedRegion> {
        let mmap = mmap_file(path)?;
        #[cfg(unix)]
        {
            let _ = mmap.advise(memmap2::Advice::Sequential);
        }
        Ok(MappedRegion { mmap })
    }

    pub fn data(&self) -> &[u8] {
        &self.mmap
    }
}

/// A bump-allocated byte region private to one worker, used only on the
/// sequential (non-mapped) path when a sort must retain row bytes past a
/// buffer refill that would otherwise overwrite them. Cleared only at
/// worker teardown (i.e. never reallocates mid-query: capacity is reserved
/// up front from the known input size).
pub struct WorkerArena {
    buf: RefCell<Vec<u8>>,
}

impl WorkerArena {
    pub fn with_capacity(capacity: usize) -> WorkerArena {
        WorkerArena { buf: RefCell::new(Vec::with_capacity(capacity)) }
    }

    /// Copy `bytes` into the arena and return a slice whose lifetime is
    /// the arena's own, not this call's borrow. Takes `&self` (interior
    /// mutability via `RefCell`) rather than `&mut self` so a returned
    /// slice never pins an exclusive borrow across later `alloc` calls —
    /// callers need to hold many arena-backed slices alive at once (e.g.
    /// every `SortRecord` collected from a scan).
    ///
    /// # Panics
    /// Panics if this would exceed the arena's reserved capacity.
    pub fn alloc(&self, bytes: &[u8]) -> &[u8] {
        let mut buf = self.buf.borrow_mut();
        assert!(
            buf.len() + bytes.len() <= buf.capacity(),
            "worker arena capacity exceeded"
        );
        let start = buf.len();
        buf.extend_from_slice(bytes);
        // SAFETY: capacity is reserved up front and never exceeded (see the
        // assert above), so the backing `Vec` never reallocates and every
        // slice handed out here stays valid for the arena's whole lifetime,
        // independent of this `borrow_mut` which ends when this call returns.
        unsafe {
            let ptr = buf.as_ptr().add(start);
            std::slice::from_raw_parts(ptr, bytes.len())
        }
    }
}

/// Worker count: bounded to 8 even when more cores are available, trading
/// extra parallelism for bounded per-worker coordination overhead.
pub const MAX_WORKERS: usize = 8;

pub fn worker_count(available: usize) -> usize {
    available.clamp(1, MAX_WORKERS)
}

/// Split `data` into up to `workers` line-aligned, non-overlapping,
/// contiguous chunks. Concatenating the chunks reconstructs `data` exactly.
pub fn compute_chunks(data: &[u8], workers: usize) -> Vec<(usize, usize)> {
    let len = data.len();
    if len == 0 || workers <= 1 {
        return if len == 0 { Vec::new() } else { vec![(0, len)] };
    }

    let nominal = len / workers;
    let mut bounds = Vec::with_capacity(workers + 1);
    bounds.push(0);
    for w in 1..workers {
        let nominal_start = (nominal * w).min(len);
        bounds.push(advance_past_next_newline(data, nominal_start));
    }
    bounds.push(len);

    let mut chunks = Vec::with_capacity(workers);
    for w in 0..workers {
        let start = bounds[w];
        let end = bounds[w + 1];
        if start < end {
            chunks.push((start, end));
        }
    }
    if chunks.is_empty() {
        chunks.push((0, len));
    }
    chunks
}

fn advance_past_next_newline(data: &[u8], from: usize) -> usize {
    match memchr(b'\n', &data[from..]) {
        Some(p) => from + p + 1,
        None => data.len(),
    }
}

/// Counters for non-fatal per-row conditions observed during a scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub too_many_fields: u64,
}

/// One worker's result: either projected rows (non-sort path) or sort
/// records (sort path). Never both — the caller picks the shape up front
/// from whether the query has an ORDER BY.
pub enum ChunkOutput<'a> {
    Rows(Vec<Vec<FieldSlice<'a>>>),
    Records(Vec<SortRecord<'a>>),
}

/// Scan one line-aligned chunk: split each row, apply the predicate, and
/// either project it (non-sort) or build a [`SortRecord`] (sort). This is
/// the worker body; it touches no shared mutable state and can run on any
/// thread, including the mapped-single-threaded router path.
pub fn scan_chunk<'a>(
    chunk: &'a [u8],
    predicate: Option<&Predicate>,
    projection: &ProjectionPlan,
    sort: Option<SortSpec>,
) -> (ChunkOutput<'a>, ScanStats) {
    let mut stats = ScanStats::default();

    if let Some(spec) = sort {
        let descending = matches!(spec.direction, Direction::Desc);
        let mut records = Vec::new();
        for line in Lines::new(chunk) {
            if line.is_empty() {
                continue;
            }
            let row = split_row(line);
            if row.overflowed() {
                stats.too_many_fields += 1;
                continue;
            }
            if let Some(p) = predicate {
                if !evaluate(p, &row) {
                    continue;
                }
            }
            let sort_bytes = row.get(spec.column).unwrap_or(b"");
            let numeric_key = parse_numeric_bytes(sort_bytes).unwrap_or(f64::NAN);
            let radix_key = if numeric_key.is_nan() {
                apply_direction(encode_prefix(sort_bytes), descending)
            } else {
                apply_direction(encode_f64(numeric_key), descending)
            };
            records.push(SortRecord {
                radix_key,
                numeric_key,
                sort_bytes,
                row_bytes: crate::scanner::strip_trailing_cr(line),
            });
        }
        (ChunkOutput::Records(records), stats)
    } else {
        let mut rows = Vec::new();
        for line in Lines::new(chunk) {
            if line.is_empty() {
                continue;
            }
            let row = split_row(line);
            if row.overflowed() {
                stats.too_many_fields += 1;
                continue;
            }
            if let Some(p) = predicate {
                if !evaluate(p, &row) {
                    continue;
                }
            }
            rows.push(projection.project(row.as_slice(), b"" as &[u8]));
        }
        (ChunkOutput::Rows(rows), stats)
    }
}

/// Run the scan across `workers` chunks of `data` in parallel, with no
/// locks, atomics, or channels: each worker produces a private result
/// list, and results are returned in worker order for the join to consume.
pub fn parallel_scan<'a>(
    data: &'a [u8],
    workers: usize,
    predicate: Option<&Predicate>,
    projection: &ProjectionPlan,
    sort: Option<SortSpec>,
) -> (Vec<ChunkOutput<'a>>, ScanStats) {
    let chunks = compute_chunks(data, workers);
    let results: Vec<(ChunkOutput<'a>, ScanStats)> = chunks
        .par_iter()
        .map(|&(start, end)| scan_chunk(&data[start..end], predicate, projection, sort))
        .collect();

    let mut stats = ScanStats::default();
    let mut outputs = Vec::with_capacity(results.len());
    for (output, s) in results {
        stats.too_many_fields += s.too_many_fields;
        outputs.push(output);
    }
    (outputs, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_concatenate_back_to_original_and_are_line_aligned() {
        let data = b"1,a\n2,b\n3,c\n4,d\n5,e\n6,f\n7,g\n8,h\n";
        for workers in 1..=8 {
            let chunks = compute_chunks(data, workers);
            let mut rebuilt = Vec::new();
            for &(s, e) in &chunks {
                rebuilt.extend_from_slice(&data[s..e]);
                // Every chunk (except possibly the trailing empty tail) must
                // end right after a '\n' or at the data end.
                assert!(e == data.len() || data[e - 1] == b'\n');
            }
            assert_eq!(rebuilt, data);
        }
    }

    #[test]
    fn empty_data_yields_no_chunks() {
        assert_eq!(compute_chunks(b"", 4), Vec::new());
    }

    #[test]
    fn small_data_with_many_workers_never_splits_a_row() {
        let data = b"only,one,row\n";
        let chunks = compute_chunks(data, 8);
        let total_rows: usize = chunks
            .iter()
            .map(|&(s, e)| data[s..e].iter().filter(|&&b| b == b'\n').count())
            .sum();
        assert_eq!(total_rows, 1);
    }

    #[test]
    fn scan_chunk_non_sort_applies_predicate_and_projection() {
        let data = b"1,a\n2,b\n3,c\n";
        let predicate = Predicate::Simple(crate::plan::Comparison {
            column: 0,
            op: crate::query::Op::Gt,
            literal: b"1".to_vec(),
            threshold: Some(1.0),
        });
        let projection = ProjectionPlan::Columns(vec![1]);
        let (output, stats) = scan_chunk(data, Some(&predicate), &projection, None);
        assert_eq!(stats.too_many_fields, 0);
        match output {
            ChunkOutput::Rows(rows) => {
                assert_eq!(rows, vec![vec![b"b".as_slice()], vec![b"c".as_slice()]]);
            }
            _ => panic!("expected Rows"),
        }
    }

    #[test]
    fn worker_arena_slices_survive_further_allocations() {
        let arena = WorkerArena::with_capacity(64);
        let a = arena.alloc(b"hello");
        let b = arena.alloc(b"world");
        assert_eq!(a, b"hello");
        assert_eq!(b, b"world");
    }

    #[test]
    fn scan_chunk_sort_path_builds_numeric_sort_records() {
        let data = b"3\n1\n2\n";
        let spec = SortSpec { column: 0, direction: Direction::Asc };
        let (output, _) = scan_chunk(data, None, &ProjectionPlan::All, Some(spec));
        match output {
            ChunkOutput::Records(records) => {
                let values: Vec<f64> = records.iter().map(|r| r.numeric_key).collect();
                assert_eq!(values, vec![3.0, 1.0, 2.0]);
                assert!(records.iter().all(|r| r.is_numeric()));
            }
            _ => panic!("expected Records"),
        }
    }
}
