use thiserror::Error;

/// Typed errors produced by the query engine.
///
/// Only `Io` and `Resource` are raised from inside a worker; every other
/// variant is a setup-time error produced before any worker spawns (see
/// the error handling notes on [`crate::engine::execute_query`]).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input has no header line")]
    EmptyInput,

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("predicate structure is invalid: {0}")]
    InvalidPredicate(String),

    /// Not raised mid-scan: rows exceeding the field cap are dropped and
    /// counted, not errored. Exposed so a caller can report the count
    /// after the query completes.
    #[error("{0} row(s) exceeded the field cap and were skipped")]
    TooManyFields(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("resource exhausted: {0}")]
    Resource(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
