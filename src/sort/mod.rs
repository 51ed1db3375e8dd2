//! Adaptive sort core: one entry point choosing between a bounded top-K
//! heap, an indirect LSD radix sort, and a comparison-sort fallback.

pub mod comparison;
pub mod heap;
pub mod radix;
pub mod record;

pub use record::SortRecord;

use crate::query::Direction;

/// Hardware tag used to pick the heap/radix thresholds below. Coarser than
/// a full CPU feature probe, but matches the constants' own rationale
/// (L1 size and record width on ARM vs. x86).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareTag {
    Arm64,
    X86_64,
    Other,
}

impl HardwareTag {
    pub fn detect() -> HardwareTag {
        if cfg!(target_arch = "aarch64") {
            HardwareTag::Arm64
        } else if cfg!(target_arch = "x86_64") {
            HardwareTag::X86_64
        } else {
            HardwareTag::Other
        }
    }

    /// Bounded-heap top-K ceiling: ~128 KB of L1 data cache divided by
    /// ~32-byte records on ARM's larger per-core L1; tighter on x86;
    /// conservative elsewhere.
    pub fn heap_max_k(self) -> usize {
        match self {
            HardwareTag::Arm64 => 2048,
            HardwareTag::X86_64 => 1024,
            HardwareTag::Other => 512,
        }
    }

    /// Minimum `N` at which radix sort's fixed per-pass overhead beats a
    /// comparison sort's better cache locality on small inputs.
    pub fn radix_min_n(self) -> usize {
        match self {
            HardwareTag::Arm64 => 8192,
            _ => 16384,
        }
    }
}

/// Tunables governing strategy selection. Defaults mirror the
/// hardware-tagged constants above; overridable for tests and for an
/// operator who wants to pin a strategy.
#[derive(Debug, Clone, Copy)]
pub struct SortConfig {
    pub heap_max_k: usize,
    pub radix_min_n: usize,
}

impl Default for SortConfig {
    fn default() -> SortConfig {
        let tag = HardwareTag::detect();
        SortConfig { heap_max_k: tag.heap_max_k(), radix_min_n: tag.radix_min_n() }
    }
}

/// Which strategy [`sort_records`] picked, for diagnostics/logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Heap,
    Radix,
    Comparison,
}

pub fn choose_strategy(n: usize, k: Option<usize>, all_numeric: bool, config: &SortConfig) -> Strategy {
    if let Some(k) = k {
        if k <= config.heap_max_k && (k as u64) * 4 < n as u64 {
            return Strategy::Heap;
        }
    }
    if all_numeric && n >= config.radix_min_n {
        return Strategy::Radix;
    }
    Strategy::Comparison
}

/// Sort `records` in place and return the sorted prefix: the top-K records
/// if `limit` is `Some`, or the whole slice sorted if `None`.
pub fn sort_records<'a>(
    records: &'a mut [SortRecord<'a>],
    direction: Direction,
    limit: Option<u64>,
    config: &SortConfig,
) -> (&'a mut [SortRecord<'a>], Strategy) {
    let descending = matches!(direction, Direction::Desc);
    let n = records.len();
    let k = limit.map(|l| l.min(n as u64) as usize);
    let all_numeric = records.iter().all(|r| r.is_numeric());

    let strategy = choose_strategy(n, k, all_numeric, config);
    match strategy {
        Strategy::Heap => {
            let k = k.unwrap();
            let written = heap::select_top_k(records, k, descending);
            (&mut records[..written], strategy)
        }
        Strategy::Radix => {
            radix::sort(records);
            let end = k.unwrap_or(n);
            (&mut records[..end], strategy)
        }
        Strategy::Comparison => {
            comparison::sort(records, descending);
            let end = k.unwrap_or(n);
            (&mut records[..end], strategy)
        }
    }
}

/// Parse a human buffer-size string ("10K", "1M", "1G", "512b") into a byte
/// count, matching the suffix grammar.
pub fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty buffer size".to_string());
    }

    let (num_part, suffix) = if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
        let (n, s) = s.split_at(s.len() - 1);
        (n, s.chars().next())
    } else {
        (s, None)
    };

    let base: usize = num_part.parse().map_err(|_| format!("invalid buffer size: {}", s))?;

    let multiplier = match suffix {
        Some('K') | Some('k') => 1024,
        Some('M') | Some('m') => 1024 * 1024,
        Some('G') | Some('g') => 1024 * 1024 * 1024,
        Some('T') | Some('t') => 1024usize.pow(4),
        Some('b') => 512,
        Some(c) => return Err(format!("invalid suffix '{}' in buffer size", c)),
        None => 1,
    };

    Ok(base * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{apply_direction, encode_f64};
    use proptest::prelude::*;

    fn numeric(n: f64) -> SortRecord<'static> {
        SortRecord {
            radix_key: apply_direction(encode_f64(n), false),
            numeric_key: n,
            sort_bytes: b"",
            row_bytes: b"",
        }
    }

    #[test]
    fn small_k_picks_heap() {
        let config = SortConfig { heap_max_k: 1024, radix_min_n: 16384 };
        assert_eq!(choose_strategy(100_000, Some(10), true, &config), Strategy::Heap);
    }

    #[test]
    fn large_all_numeric_no_limit_picks_radix() {
        let config = SortConfig { heap_max_k: 1024, radix_min_n: 16384 };
        assert_eq!(choose_strategy(20_000, None, true, &config), Strategy::Radix);
    }

    #[test]
    fn small_input_picks_comparison() {
        let config = SortConfig { heap_max_k: 1024, radix_min_n: 16384 };
        assert_eq!(choose_strategy(100, None, true, &config), Strategy::Comparison);
    }

    #[test]
    fn non_numeric_never_picks_radix() {
        let config = SortConfig { heap_max_k: 1024, radix_min_n: 16384 };
        assert_eq!(choose_strategy(20_000, None, false, &config), Strategy::Comparison);
    }

    #[test]
    fn end_to_end_sort_records_ascending_with_limit() {
        let config = SortConfig::default();
        let mut records: Vec<SortRecord> =
            [5.0, 1.0, 9.0, 2.0, 7.0].iter().map(|&n| numeric(n)).collect();
        let (sorted, _) = sort_records(&mut records, Direction::Asc, Some(2), &config);
        let values: Vec<f64> = sorted.iter().map(|r| r.numeric_key).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn parses_buffer_size_suffixes() {
        assert_eq!(parse_buffer_size("10K").unwrap(), 10 * 1024);
        assert_eq!(parse_buffer_size("1M").unwrap(), 1024 * 1024);
        assert_eq!(parse_buffer_size("2G").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_buffer_size("512").unwrap(), 512);
        assert!(parse_buffer_size("").is_err());
        assert!(parse_buffer_size("10X").is_err());
    }

    proptest! {
        // Whichever strategy gets picked (heap/radix/comparison, forced by
        // tiny thresholds so small proptest inputs still exercise all three),
        // the output must match a reference sort's top-K prefix exactly.
        #[test]
        fn prop_sort_records_matches_reference_top_k(
            values in prop::collection::vec(-10_000i64..10_000, 0..500),
            desc in any::<bool>(),
            k in 0u64..600,
        ) {
            let config = SortConfig { heap_max_k: 8, radix_min_n: 32 };
            let direction = if desc { Direction::Desc } else { Direction::Asc };
            let limit = if k == 0 { None } else { Some(k) };

            // radix_key must reflect the direction mask up front, exactly as
            // the scan orchestrator builds it, or the radix path (picked
            // here for small N via the tiny thresholds above) would sort by
            // the wrong order.
            let mut records: Vec<SortRecord> = values
                .iter()
                .map(|&n| {
                    let v = n as f64;
                    SortRecord {
                        radix_key: apply_direction(encode_f64(v), desc),
                        numeric_key: v,
                        sort_bytes: b"",
                        row_bytes: b"",
                    }
                })
                .collect();
            let (sorted, _) = sort_records(&mut records, direction, limit, &config);
            let got: Vec<f64> = sorted.iter().map(|r| r.numeric_key).collect();

            let mut reference = values.clone();
            reference.sort_unstable();
            if desc {
                reference.reverse();
            }
            let want_len = limit.map(|l| (l as usize).min(reference.len())).unwrap_or(reference.len());
            let want: Vec<f64> = reference[..want_len].iter().map(|&n| n as f64).collect();

            prop_assert_eq!(got, want);
        }
    }
}
