use std::cmp::Ordering;

use super::comparison::cmp_ascending;
use super::record::SortRecord;

/// Bounded top-K selection via a binary heap of at most `k` records.
///
/// For ascending top-K we keep a max-heap and evict the current maximum
/// whenever a smaller record arrives; for descending top-K the roles
/// invert. Either way the heap never holds more than `k` records, so this
/// wins when `k` is small relative to `N`.
pub fn select_top_k<'a>(records: &mut [SortRecord<'a>], k: usize, descending: bool) -> usize {
    if k == 0 || records.is_empty() {
        return 0;
    }
    let k = k.min(records.len());

    // `HeapEntry` orders by the *eviction* criterion: the max-heap
    // (ascending top-K) pops its current largest first so the smallest k
    // survive; inverted for descending top-K.
    struct HeapEntry<'a> {
        record: SortRecord<'a>,
        descending: bool,
    }
    impl<'a> PartialEq for HeapEntry<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.cmp(other) == Ordering::Equal
        }
    }
    impl<'a> Eq for HeapEntry<'a> {}
    impl<'a> PartialOrd for HeapEntry<'a> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<'a> Ord for HeapEntry<'a> {
        fn cmp(&self, other: &Self) -> Ordering {
            let base = cmp_ascending(&self.record, &other.record);
            if self.descending { base.reverse() } else { base }
        }
    }

    let mut heap: std::collections::BinaryHeap<HeapEntry<'a>> =
        std::collections::BinaryHeap::with_capacity(k);

    for &record in records.iter() {
        if heap.len() < k {
            heap.push(HeapEntry { record, descending });
        } else if let Some(top) = heap.peek() {
            let worse_than_top = if descending {
                cmp_ascending(&record, &top.record) == Ordering::Greater
            } else {
                cmp_ascending(&record, &top.record) == Ordering::Less
            };
            if worse_than_top {
                heap.pop();
                heap.push(HeapEntry { record, descending });
            }
        }
    }

    // `HeapEntry`'s `Ord` already matches the desired output order: direct
    // `cmp_ascending` for the ascending case (so `into_sorted_vec`'s
    // ascending-by-`Ord` walk is smallest-first), reversed for descending
    // (so the same ascending-by-`Ord` walk comes out largest-first). No
    // further reversal needed either way.
    let sorted: Vec<SortRecord<'a>> = heap.into_sorted_vec().into_iter().map(|e| e.record).collect();
    records[..k].copy_from_slice(&sorted);
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{apply_direction, encode_f64};

    fn rec(n: f64, descending: bool) -> SortRecord<'static> {
        SortRecord {
            radix_key: apply_direction(encode_f64(n), descending),
            numeric_key: n,
            sort_bytes: b"",
            row_bytes: b"",
        }
    }

    #[test]
    fn ascending_top_k_picks_smallest() {
        let mut records: Vec<SortRecord> = [5.0, 1.0, 9.0, 2.0, 7.0]
            .iter()
            .map(|&n| rec(n, false))
            .collect();
        let k = select_top_k(&mut records, 3, false);
        let values: Vec<f64> = records[..k].iter().map(|r| r.numeric_key).collect();
        assert_eq!(values, vec![1.0, 2.0, 5.0]);
    }

    #[test]
    fn descending_top_k_picks_largest() {
        let mut records: Vec<SortRecord> = [5.0, 1.0, 9.0, 2.0, 7.0]
            .iter()
            .map(|&n| rec(n, true))
            .collect();
        let k = select_top_k(&mut records, 2, true);
        let values: Vec<f64> = records[..k].iter().map(|r| r.numeric_key).collect();
        assert_eq!(values, vec![9.0, 7.0]);
    }

    #[test]
    fn k_larger_than_n_returns_all() {
        let mut records: Vec<SortRecord> = [3.0, 1.0].iter().map(|&n| rec(n, false)).collect();
        let k = select_top_k(&mut records, 10, false);
        assert_eq!(k, 2);
    }
}
