//! Query surface parsers: a tiny SQL subset and a positional "simple mode",
//! both producing the same [`crate::query::QueryTree`]. Neither aims for a
//! full grammar — only to construct a valid tree for the core to consume.

pub mod simple;
pub mod sql;

pub use simple::{parse_simple, SimpleArgs};
pub use sql::parse_sql;
