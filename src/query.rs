//! The query tree: the core's only upstream interface. Built by a query
//! parser (SQL subset or "simple mode"), never by the core itself.

use std::path::PathBuf;

/// Where the input bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Stdin,
}

/// Which columns to emit, by name, pre-resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

/// A comparison operator in a WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A WHERE-clause expression: a single comparison or a boolean tree over
/// comparisons. Column names are not yet resolved to indices here; that
/// happens once, against the header, before workers spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateExpr {
    Compare { column: String, op: Op, literal: Vec<u8> },
    And(Box<PredicateExpr>, Box<PredicateExpr>),
    Or(Box<PredicateExpr>, Box<PredicateExpr>),
    Not(Box<PredicateExpr>),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A fully parsed, not-yet-validated query. Column name resolution against
/// the header happens exactly once, in [`crate::engine::execute_query`],
/// before any worker spawns.
#[derive(Debug, Clone)]
pub struct QueryTree {
    pub source: Source,
    pub projection: Projection,
    pub predicate: Option<PredicateExpr>,
    /// Column name and direction. At most one sort column, per scope.
    pub sort: Option<(String, Direction)>,
    /// `0` means unbounded.
    pub limit: u64,
}

impl QueryTree {
    pub fn new(source: Source) -> QueryTree {
        QueryTree {
            source,
            projection: Projection::All,
            predicate: None,
            sort: None,
            limit: 0,
        }
    }
}
