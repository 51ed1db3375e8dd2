use std::cmp::Ordering;

use rayon::slice::ParallelSliceMut;

use super::record::SortRecord;

/// Above this many records, the comparison sort switches from a sequential
/// `sort_unstable_by` to a work-stealing parallel sort.
const PARALLEL_THRESHOLD: usize = 10_000;

/// Strict weak order, ascending: numeric keys compare numerically; NaN
/// (non-numeric) records compare greater than any numeric record so they
/// sort to the end; two non-numeric records fall back to byte-wise
/// comparison of `sort_bytes`.
///
/// This is always invoked ascending. Descending output is produced by
/// swapping the operand order at the call site, never by negating the
/// result — negation breaks the strict weak ordering many sort
/// implementations rely on.
pub fn cmp_ascending(a: &SortRecord, b: &SortRecord) -> Ordering {
    match (a.is_numeric(), b.is_numeric()) {
        (true, true) => a
            .numeric_key
            .partial_cmp(&b.numeric_key)
            .unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.sort_bytes.cmp(b.sort_bytes),
    }
}

/// Comparison-sort fallback: any `O(N log N)` sort is valid. The direction
/// is realized by swapping the comparator's operands, not by negating it.
pub fn sort(records: &mut [SortRecord], descending: bool) {
    let compare = move |a: &SortRecord, b: &SortRecord| {
        if descending { cmp_ascending(b, a) } else { cmp_ascending(a, b) }
    };
    if records.len() > PARALLEL_THRESHOLD {
        records.par_sort_unstable_by(compare);
    } else {
        records.sort_unstable_by(compare);
    }
}
