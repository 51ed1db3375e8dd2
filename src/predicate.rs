//! Predicate evaluation: a pre-resolved single-comparison hot path plus a
//! boolean-tree fallback for compound WHERE clauses.

use crate::plan::{Comparison, Predicate};
use crate::query::Op;
use crate::scanner::Row;

/// Evaluate a predicate against one already-split row.
///
/// The single-comparison case is the hot path: one column lookup, one
/// parse (if numeric), one branch. Compound trees recurse through the
/// connectives, re-evaluating shared sub-comparisons each time — quadratic
/// in columns referenced, and explicitly out of the hot path by design.
pub fn evaluate(predicate: &Predicate, row: &Row) -> bool {
    match predicate {
        Predicate::Simple(cmp) => evaluate_comparison(cmp, row),
        Predicate::And(a, b) => evaluate(a, row) && evaluate(b, row),
        Predicate::Or(a, b) => evaluate(a, row) || evaluate(b, row),
        Predicate::Not(a) => !evaluate(a, row),
    }
}

fn evaluate_comparison(cmp: &Comparison, row: &Row) -> bool {
    let field = match row.get(cmp.column) {
        Some(f) => f,
        None => return false,
    };

    if let Some(threshold) = cmp.threshold {
        let value = match parse_numeric_bytes(field) {
            Some(v) => v,
            None => return false,
        };
        return match cmp.op {
            Op::Eq => value == threshold,
            Op::Ne => value != threshold,
            Op::Lt => value < threshold,
            Op::Le => value <= threshold,
            Op::Gt => value > threshold,
            Op::Ge => value >= threshold,
        };
    }

    match cmp.op {
        Op::Eq => field == cmp.literal.as_slice(),
        Op::Ne => field != cmp.literal.as_slice(),
        // Ordering on non-numeric literals is undefined by spec and always false.
        Op::Lt | Op::Le | Op::Gt | Op::Ge => false,
    }
}

/// Parse a base-10 float from raw bytes: optional leading sign, digits, an
/// optional `.` fraction, and an optional `e`/`E` exponent. No whitespace
/// trimming — the scanner never emits surrounding whitespace on the hot
/// path, so trimming here would only hide malformed input.
pub fn parse_numeric_bytes(bytes: &[u8]) -> Option<f64> {
    if bytes.is_empty() {
        return None;
    }
    // A conservative, correctness-first parse: delegate to the standard
    // float grammar once the byte slice is confirmed to look numeric, so
    // we inherit its correctly-rounded parsing instead of reimplementing it.
    if !looks_numeric(bytes) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse::<f64>().ok()
}

fn looks_numeric(bytes: &[u8]) -> bool {
    let mut i = 0;
    let n = bytes.len();
    if i < n && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut saw_digit = false;
    while i < n && bytes[i].is_ascii_digit() {
        i += 1;
        saw_digit = true;
    }
    if i < n && bytes[i] == b'.' {
        i += 1;
        while i < n && bytes[i].is_ascii_digit() {
            i += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return false;
    }
    if i < n && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < n && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let mut saw_exp_digit = false;
        while i < n && bytes[i].is_ascii_digit() {
            i += 1;
            saw_exp_digit = true;
        }
        if !saw_exp_digit {
            return false;
        }
    }
    i == n
}

/// Build a resolved [`Predicate`] from a parsed expression tree, resolving
/// column names to indices against the header and pre-parsing any literal
/// that looks numeric.
pub mod build {
    use super::parse_numeric_bytes;
    use crate::error::Result;
    use crate::header::Header;
    use crate::plan::{Comparison, Predicate};
    use crate::query::PredicateExpr;

    pub fn resolve(expr: &PredicateExpr, header: &Header) -> Result<Predicate> {
        Ok(match expr {
            PredicateExpr::Compare { column, op, literal } => {
                let idx = header.resolve(column)?;
                let threshold = parse_numeric_bytes(literal);
                Predicate::Simple(Comparison {
                    column: idx,
                    op: *op,
                    literal: literal.clone(),
                    threshold,
                })
            }
            PredicateExpr::And(a, b) => {
                Predicate::And(Box::new(resolve(a, header)?), Box::new(resolve(b, header)?))
            }
            PredicateExpr::Or(a, b) => {
                Predicate::Or(Box::new(resolve(a, header)?), Box::new(resolve(b, header)?))
            }
            PredicateExpr::Not(a) => Predicate::Not(Box::new(resolve(a, header)?)),
        })
    }
}
