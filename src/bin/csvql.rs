use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;

use anyhow::Context;
use clap::Parser;

use csvql::parser::{parse_simple, parse_sql, SimpleArgs};
use csvql::sort::parse_buffer_size;
use csvql::{execute_query, EngineConfig, EngineError, QueryTree};

/// Single-node SQL query engine for large CSV files.
///
/// Two ways to ask a question: a `--sql` string, or "simple mode" flags
/// layered directly on the file argument. Both compile to the same query
/// tree before reaching the engine.
#[derive(Parser)]
#[command(name = "csvql", version, about = "Parallel SQL-over-CSV query engine")]
struct Cli {
    /// A full query string: `SELECT ... FROM <path|'-'> [WHERE ...] [ORDER BY ...] [LIMIT n]`.
    #[arg(long = "sql", value_name = "QUERY")]
    sql: Option<String>,

    /// Input file, or `-` for stdin. Required in simple mode; ignored
    /// when `--sql` is given (the SQL string's FROM clause names the source).
    file: Option<String>,

    /// Comma-separated column list. Omit for all columns.
    #[arg(long = "select", value_name = "COLS")]
    select: Option<String>,

    /// A single comparison: `"<column> <op> <literal>"`, e.g. `"id > 1"`.
    #[arg(long = "where", value_name = "EXPR")]
    where_: Option<String>,

    /// Column to sort by.
    #[arg(long = "order-by", value_name = "COLUMN")]
    order_by: Option<String>,

    /// Sort descending instead of ascending.
    #[arg(long = "desc")]
    desc: bool,

    /// Maximum rows to emit. `0` or omitted means unbounded.
    #[arg(long = "limit", value_name = "N")]
    limit: Option<u64>,

    /// Write output to FILE instead of standard output.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<String>,

    /// Override the worker count (default: min(available cores, 8)).
    #[arg(long = "workers", value_name = "N")]
    workers: Option<usize>,

    /// Override the output writer's buffer size, e.g. "1M", "512K".
    #[arg(long = "buffer-size", value_name = "SIZE")]
    buffer_size: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let tree = match build_query(&cli) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("csvql: {}", e);
            process::exit(2);
        }
    };

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("csvql: {}", e);
            process::exit(2);
        }
    };

    let result = match &cli.output {
        Some(path) => run(&tree, &config, open_output(path)),
        None => run(&tree, &config, io::stdout().lock()),
    };

    if let Err(e) = result {
        eprintln!("csvql: {}", e);
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<EngineError>())
            .map(exit_code_for)
            .unwrap_or(2);
        process::exit(code);
    }
}

fn open_output(path: &str) -> BufWriter<File> {
    match File::create(path) {
        Ok(f) => BufWriter::new(f),
        Err(e) => {
            eprintln!("csvql: {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn run<W: Write>(tree: &QueryTree, config: &EngineConfig, sink: W) -> anyhow::Result<()> {
    execute_query(tree, config, sink).context("query execution failed")
}

fn build_query(cli: &Cli) -> csvql::Result<QueryTree> {
    match &cli.sql {
        Some(sql) => parse_sql(sql),
        None => {
            let args = SimpleArgs {
                file: cli.file.clone(),
                select: cli.select.clone(),
                filter: cli.where_.clone(),
                order_by: cli.order_by.clone(),
                desc: cli.desc,
                limit: cli.limit,
            };
            parse_simple(&args)
        }
    }
}

fn build_config(cli: &Cli) -> Result<EngineConfig, EngineError> {
    let mut config = EngineConfig::default();
    config.workers = cli.workers;
    if let Some(s) = &cli.buffer_size {
        config.output_buffer_size =
            parse_buffer_size(s).map_err(EngineError::InvalidPredicate)?;
    }
    Ok(config)
}

fn exit_code_for(err: &EngineError) -> i32 {
    match err {
        EngineError::Io(_) | EngineError::Resource(_) => 1,
        _ => 2,
    }
}
