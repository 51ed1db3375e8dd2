//! The positional "simple mode" parser: CLI flags instead of a SQL string,
//! producing the same [`QueryTree`] shape as [`super::sql::parse_sql`].

use std::path::PathBuf;

use crate::error::{EngineError, Result};
use crate::query::{Direction, Op, PredicateExpr, Projection, QueryTree, Source};

/// Already-tokenized simple-mode arguments, as handed in by the CLI layer
/// after `clap` parsing. Kept separate from `clap`'s own struct so this
/// parser has no dependency on the CLI crate.
#[derive(Debug, Clone, Default)]
pub struct SimpleArgs {
    pub file: Option<String>,
    pub select: Option<String>,
    /// `"<column> <op> <literal>"`, e.g. `"id > 1"`.
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub desc: bool,
    pub limit: Option<u64>,
}

pub fn parse_simple(args: &SimpleArgs) -> Result<QueryTree> {
    let source = match args.file.as_deref() {
        None | Some("-") => Source::Stdin,
        Some(path) => Source::Path(PathBuf::from(path)),
    };

    let mut tree = QueryTree::new(source);

    tree.projection = match &args.select {
        None => Projection::All,
        Some(s) => {
            let cols: Vec<String> = s.split(',').map(|c| c.trim().to_string()).collect();
            if cols.iter().any(|c| c.is_empty()) {
                return Err(EngineError::InvalidPredicate("empty column name in --select".into()));
            }
            Projection::Columns(cols)
        }
    };

    if let Some(filter) = &args.filter {
        tree.predicate = Some(parse_filter(filter)?);
    }

    if let Some(column) = &args.order_by {
        let direction = if args.desc { Direction::Desc } else { Direction::Asc };
        tree.sort = Some((column.clone(), direction));
    }

    if let Some(limit) = args.limit {
        tree.limit = limit;
    }

    Ok(tree)
}

/// Parse `"<column> <op> <literal>"` into a single comparison. Simple mode
/// does not support compound WHERE clauses; that is reserved for the SQL
/// surface.
fn parse_filter(filter: &str) -> Result<PredicateExpr> {
    let parts: Vec<&str> = filter.splitn(3, char::is_whitespace).filter(|s| !s.is_empty()).collect();
    if parts.len() != 3 {
        return Err(EngineError::InvalidPredicate(format!(
            "expected \"<column> <op> <literal>\", got '{}'",
            filter
        )));
    }
    let column = parts[0].to_string();
    let op = match parts[1] {
        "=" | "==" => Op::Eq,
        "!=" | "<>" => Op::Ne,
        "<" => Op::Lt,
        "<=" => Op::Le,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        other => return Err(EngineError::InvalidPredicate(format!("unknown operator '{}'", other))),
    };
    let literal = parts[2].trim_matches('\'').trim_matches('"').as_bytes().to_vec();
    Ok(PredicateExpr::Compare { column, op, literal })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_all_columns_and_stdin() {
        let tree = parse_simple(&SimpleArgs::default()).unwrap();
        assert_eq!(tree.projection, Projection::All);
        assert_eq!(tree.source, Source::Stdin);
    }

    #[test]
    fn select_splits_on_comma() {
        let args = SimpleArgs { select: Some("a, b,c".to_string()), ..Default::default() };
        let tree = parse_simple(&args).unwrap();
        assert_eq!(tree.projection, Projection::Columns(vec!["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn filter_parses_operator_and_literal() {
        let args = SimpleArgs { filter: Some("id > 1".to_string()), ..Default::default() };
        let tree = parse_simple(&args).unwrap();
        match tree.predicate {
            Some(PredicateExpr::Compare { column, op, literal }) => {
                assert_eq!(column, "id");
                assert_eq!(op, Op::Gt);
                assert_eq!(literal, b"1");
            }
            _ => panic!("expected a Compare predicate"),
        }
    }

    #[test]
    fn order_by_defaults_ascending() {
        let args = SimpleArgs { order_by: Some("k".to_string()), ..Default::default() };
        let tree = parse_simple(&args).unwrap();
        assert_eq!(tree.sort, Some(("k".to_string(), Direction::Asc)));
    }

    #[test]
    fn order_by_desc_flag() {
        let args = SimpleArgs { order_by: Some("k".to_string()), desc: true, ..Default::default() };
        let tree = parse_simple(&args).unwrap();
        assert_eq!(tree.sort, Some(("k".to_string(), Direction::Desc)));
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let args = SimpleArgs { filter: Some("justonetoken".to_string()), ..Default::default() };
        assert!(parse_simple(&args).is_err());
    }
}
