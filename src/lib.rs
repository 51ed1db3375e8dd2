#![allow(clippy::too_many_arguments, clippy::needless_lifetimes, clippy::collapsible_if)]

/// mimalloc's thread-local caching beats glibc malloc for the many small,
/// short-lived allocations the sort core and worker arenas churn through.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod codec;
pub mod common;
pub mod engine;
pub mod error;
pub mod header;
pub mod parser;
pub mod plan;
pub mod predicate;
pub mod query;
pub mod reader;
pub mod router;
pub mod scan;
pub mod scanner;
pub mod sort;
pub mod writer;

pub use engine::{execute_query, EngineConfig};
pub use error::{EngineError, Result};
pub use query::QueryTree;
