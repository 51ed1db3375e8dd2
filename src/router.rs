//! Picks an execution strategy from file size, core count, LIMIT, and
//! whether the query has an ORDER BY — never from the query's other
//! shape (projection/predicate structure does not affect the choice).

const PARALLEL_FLOOR: u64 = 10 * 1024 * 1024;
const MAPPED_FLOOR: u64 = 5 * 1024 * 1024;
const PARALLEL_LIMIT_CEILING: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Input is not a random-access file (stdin, a pipe): route through
    /// the small-file byte reader with RFC-4180 parsing. Sort is not
    /// specialized here; the engine still honors ORDER BY, just without
    /// the mapped fast path.
    StreamSmallFile,
    ParallelMapped,
    SequentialMapped,
    SequentialBuffered,
}

/// `limit` is `None` for "unbounded" (LIMIT 0 or absent).
pub fn choose(is_stream: bool, file_len: u64, cores: usize, limit: Option<u64>, has_order_by: bool) -> Strategy {
    if is_stream {
        return Strategy::StreamSmallFile;
    }
    let limit_favors_parallel = match limit {
        None => true,
        Some(l) => l > PARALLEL_LIMIT_CEILING,
    };
    if file_len > PARALLEL_FLOOR && cores > 1 && (limit_favors_parallel || has_order_by) {
        return Strategy::ParallelMapped;
    }
    if file_len > MAPPED_FLOOR {
        return Strategy::SequentialMapped;
    }
    Strategy::SequentialBuffered
}
