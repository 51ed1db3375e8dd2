//! Resolved, column-index-bound query state: the shape the scan orchestrator
//! actually consumes, built once from a [`crate::query::QueryTree`] and a
//! [`crate::header::Header`] before any worker spawns.

use crate::query::{Direction, Op};

/// Ordered row positions to emit. The `All` marker bypasses building a list
/// entirely, matching the distinguished "all columns" case.
#[derive(Debug, Clone)]
pub enum ProjectionPlan {
    All,
    Columns(Vec<usize>),
}

impl ProjectionPlan {
    pub fn project<T: Copy>(&self, row: &[T], all_if_short: T) -> Vec<T> {
        match self {
            ProjectionPlan::All => row.to_vec(),
            ProjectionPlan::Columns(cols) => cols
                .iter()
                .map(|&i| row.get(i).copied().unwrap_or(all_if_short))
                .collect(),
        }
    }
}

/// A single resolved comparison: column index, operator, literal bytes,
/// and (if the literal parses as base-10 float) a pre-parsed threshold.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub column: usize,
    pub op: Op,
    pub literal: Vec<u8>,
    pub threshold: Option<f64>,
}

/// Either a single comparison or a boolean tree of connectives over them.
#[derive(Debug, Clone)]
pub enum Predicate {
    Simple(Comparison),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Resolved sort target. At most one present on a [`crate::query::QueryTree`].
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub column: usize,
    pub direction: Direction,
}

/// Row emission cap. `0` is represented as "no limit" per spec, collapsing
/// the two concepts into one so the rest of the engine only ever sees
/// `Option<u64>`.
#[derive(Debug, Clone, Copy)]
pub struct Limit(Option<u64>);

impl Limit {
    pub fn from_raw(n: u64) -> Limit {
        if n == 0 { Limit(None) } else { Limit(Some(n)) }
    }

    pub fn value(self) -> Option<u64> {
        self.0
    }

    pub fn is_unbounded(self) -> bool {
        self.0.is_none()
    }
}
