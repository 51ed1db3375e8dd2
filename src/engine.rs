//! The single public entry point gluing router, scan, sort, and writer
//! together.

use std::io::Write;
use std::path::Path;

use log::{debug, warn};

use crate::error::{EngineError, Result};
use crate::header::Header;
use crate::plan::{Predicate, ProjectionPlan, SortSpec};
use crate::predicate::{build::resolve as resolve_predicate, evaluate, parse_numeric_bytes};
use crate::query::{Direction, Projection, QueryTree, Source};
use crate::reader::{rfc4180, ByteReader};
use crate::router::{self, Strategy};
use crate::scan::{self, ChunkOutput, MappedRegion, ScanStats, WorkerArena};
use crate::scanner::{split_row, strip_trailing_cr, FieldSlice, Row};
use crate::sort::{self, SortConfig, SortRecord};
use crate::writer::{Writer, DEFAULT_BUFFER_SIZE};

/// Tunables governing router thresholds and sort strategy selection.
/// Defaults reproduce the documented constants; overridable for tests and
/// for an operator pinning behavior via the CLI.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub workers: Option<usize>,
    pub output_buffer_size: usize,
    pub sort: SortConfig,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig { workers: None, output_buffer_size: DEFAULT_BUFFER_SIZE, sort: SortConfig::default() }
    }
}

/// A query's column references, resolved against the header exactly once
/// before any worker spawns.
struct ResolvedQuery {
    projection: ProjectionPlan,
    predicate: Option<Predicate>,
    sort: Option<SortSpec>,
    limit: Option<u64>,
}

fn resolve(tree: &QueryTree, header: &Header) -> Result<ResolvedQuery> {
    let projection = match &tree.projection {
        Projection::All => ProjectionPlan::All,
        Projection::Columns(names) => {
            let mut cols = Vec::with_capacity(names.len());
            for name in names {
                cols.push(header.resolve(name)?);
            }
            ProjectionPlan::Columns(cols)
        }
    };

    let predicate = match &tree.predicate {
        Some(expr) => Some(resolve_predicate(expr, header)?),
        None => None,
    };

    let sort = match &tree.sort {
        Some((name, direction)) => {
            Some(SortSpec { column: header.resolve(name)?, direction: *direction })
        }
        None => None,
    };

    Ok(ResolvedQuery { projection, predicate, sort, limit: crate::plan::Limit::from_raw(tree.limit).value() })
}

fn projected_header<'a>(header: &'a Header, projection: &ProjectionPlan) -> Vec<&'a [u8]> {
    match projection {
        ProjectionPlan::All => header.names().iter().map(|s| s.as_bytes()).collect(),
        ProjectionPlan::Columns(cols) => {
            cols.iter().map(|&i| header.names()[i].as_bytes()).collect()
        }
    }
}

/// Execute `tree` against `config`, writing CSV to `sink`.
pub fn execute_query<W: Write>(tree: &QueryTree, config: &EngineConfig, sink: W) -> Result<()> {
    let mut writer = Writer::new(sink, config.output_buffer_size);
    let cores = config
        .workers
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    let result = match &tree.source {
        Source::Stdin => execute_stream(tree, config, &mut writer),
        Source::Path(path) => execute_file(tree, config, path, cores, &mut writer),
    };

    writer.flush()?;
    result
}

fn execute_file<W: Write>(
    tree: &QueryTree,
    config: &EngineConfig,
    path: &Path,
    cores: usize,
    writer: &mut Writer<W>,
) -> Result<()> {
    let file_len = std::fs::metadata(path)?.len();
    let has_order_by = tree.sort.is_some();
    let limit = crate::plan::Limit::from_raw(tree.limit).value();
    let strategy = router::choose(false, file_len, cores, limit, has_order_by);
    debug!("router selected {:?} for {} bytes, {} cores", strategy, file_len, cores);

    match strategy {
        Strategy::StreamSmallFile => unreachable!("router never selects a stream strategy for a path source"),
        Strategy::ParallelMapped | Strategy::SequentialMapped => {
            let region = MappedRegion::open(path)?;
            let data = region.data();
            let header_end = match memchr::memchr(b'\n', data) {
                Some(p) => p,
                None if !data.is_empty() => data.len(),
                None => return Err(EngineError::EmptyInput),
            };
            let header_line = strip_trailing_cr(&data[..header_end]);
            let header = Header::parse(header_line)?;
            let resolved = resolve(tree, &header)?;
            let data_start = (header_end + 1).min(data.len());
            let body = &data[data_start..];

            let workers = if strategy == Strategy::ParallelMapped {
                scan::worker_count(cores)
            } else {
                1
            };

            run_mapped(body, &header, &resolved, config, workers, writer)
        }
        Strategy::SequentialBuffered => {
            let file = std::fs::File::open(path)?;
            run_buffered(file, file_len, tree, config, writer)
        }
    }
}

fn run_mapped<W: Write>(
    body: &[u8],
    header: &Header,
    resolved: &ResolvedQuery,
    config: &EngineConfig,
    workers: usize,
    writer: &mut Writer<W>,
) -> Result<()> {
    let (outputs, stats) =
        scan::parallel_scan(body, workers, resolved.predicate.as_ref(), &resolved.projection, resolved.sort);
    report_skipped(stats);

    write_header_row(writer, header, &resolved.projection)?;

    match resolved.sort {
        None => join_rows(outputs, resolved.limit, writer),
        Some(spec) => join_sorted(outputs, spec, resolved.limit, &resolved.projection, config, writer),
    }
}

fn write_header_row<W: Write>(
    writer: &mut Writer<W>,
    header: &Header,
    projection: &ProjectionPlan,
) -> Result<()> {
    let names = projected_header(header, projection);
    writer.write_row(&names)?;
    Ok(())
}

fn join_rows<W: Write>(outputs: Vec<ChunkOutput>, limit: Option<u64>, writer: &mut Writer<W>) -> Result<()> {
    let mut emitted = 0u64;
    'outer: for output in outputs {
        if let ChunkOutput::Rows(rows) = output {
            for row in rows {
                writer.write_row(&row)?;
                emitted += 1;
                if let Some(l) = limit {
                    if emitted >= l {
                        break 'outer;
                    }
                }
            }
        }
    }
    Ok(())
}

fn join_sorted<W: Write>(
    outputs: Vec<ChunkOutput>,
    spec: SortSpec,
    limit: Option<u64>,
    projection: &ProjectionPlan,
    config: &EngineConfig,
    writer: &mut Writer<W>,
) -> Result<()> {
    let mut records: Vec<SortRecord> = Vec::new();
    for output in outputs {
        if let ChunkOutput::Records(mut recs) = output {
            records.append(&mut recs);
        }
    }

    let (sorted, strategy) = sort::sort_records(&mut records, spec.direction, limit, &config.sort);
    debug!("sort core selected {:?} strategy over {} records", strategy, sorted.len());

    for record in sorted.iter() {
        let row = split_row(record.row_bytes);
        let projected: Vec<FieldSlice> = projection.project(row.as_slice(), b"" as &[u8]);
        writer.write_row(&projected)?;
    }
    Ok(())
}

fn run_buffered<W: Write>(
    file: std::fs::File,
    file_len: u64,
    tree: &QueryTree,
    config: &EngineConfig,
    writer: &mut Writer<W>,
) -> Result<()> {
    let mut reader = ByteReader::new(file);
    let header_line = reader.read_line()?.ok_or(EngineError::EmptyInput)?.to_vec();
    let header = Header::parse(strip_trailing_cr(&header_line))?;
    let resolved = resolve(tree, &header)?;

    write_header_row(writer, &header, &resolved.projection)?;

    let mut stats = ScanStats::default();

    if resolved.sort.is_none() {
        let mut emitted = 0u64;
        while let Some(line) = reader.read_line()? {
            if line.is_empty() {
                continue;
            }
            let row = split_row(line);
            if row.overflowed() {
                stats.too_many_fields += 1;
                continue;
            }
            if let Some(p) = &resolved.predicate {
                if !evaluate(p, &row) {
                    continue;
                }
            }
            let projected: Vec<FieldSlice> = resolved.projection.project(row.as_slice(), b"" as &[u8]);
            writer.write_row(&projected)?;
            emitted += 1;
            if let Some(l) = resolved.limit {
                if emitted >= l {
                    break;
                }
            }
        }
        report_skipped(stats);
        return Ok(());
    }

    // Sort path: the reader's window recycles on every refill, so matching
    // rows are copied into an arena sized to the whole file up front.
    let spec = resolved.sort.unwrap();
    let descending = matches!(spec.direction, Direction::Desc);
    let arena = WorkerArena::with_capacity(file_len as usize + 1);
    let mut records: Vec<SortRecord> = Vec::new();

    while let Some(line) = reader.read_line()? {
        if line.is_empty() {
            continue;
        }
        let row = split_row(line);
        if row.overflowed() {
            stats.too_many_fields += 1;
            continue;
        }
        if let Some(p) = &resolved.predicate {
            if !evaluate(p, &row) {
                continue;
            }
        }
        let stored_line = arena.alloc(strip_trailing_cr(line));
        let stored_row = split_row(stored_line);
        let sort_bytes = stored_row.get(spec.column).unwrap_or(b"");
        let numeric_key = parse_numeric_bytes(sort_bytes).unwrap_or(f64::NAN);
        let radix_key = if numeric_key.is_nan() {
            crate::codec::apply_direction(crate::codec::encode_prefix(sort_bytes), descending)
        } else {
            crate::codec::apply_direction(crate::codec::encode_f64(numeric_key), descending)
        };
        records.push(SortRecord { radix_key, numeric_key, sort_bytes, row_bytes: stored_line });
    }
    report_skipped(stats);

    let (sorted, strategy) =
        sort::sort_records(&mut records, spec.direction, resolved.limit, &config.sort);
    debug!("sort core selected {:?} strategy over {} records", strategy, sorted.len());
    for record in sorted.iter() {
        let row = split_row(record.row_bytes);
        let projected: Vec<FieldSlice> = resolved.projection.project(row.as_slice(), b"" as &[u8]);
        writer.write_row(&projected)?;
    }
    Ok(())
}

fn execute_stream<W: Write>(tree: &QueryTree, config: &EngineConfig, writer: &mut Writer<W>) -> Result<()> {
    let bytes = crate::common::io::read_stdin()?;
    let mut rows = rfc4180::parse_records(&bytes);
    if rows.is_empty() {
        return Err(EngineError::EmptyInput);
    }
    let header_fields = rows.remove(0);
    let header = Header::from_fields(&header_fields)?;
    let resolved = resolve(tree, &header)?;

    write_header_row(writer, &header, &resolved.projection)?;

    let mut stats = ScanStats::default();
    let matching: Vec<&Vec<Vec<u8>>> = rows
        .iter()
        .filter(|fields| {
            let slices: Vec<FieldSlice> = fields.iter().map(|f| f.as_slice()).collect();
            let row = Row::from_fields(&slices);
            if row.overflowed() {
                stats.too_many_fields += 1;
                return false;
            }
            match &resolved.predicate {
                Some(p) => evaluate(p, &row),
                None => true,
            }
        })
        .collect();
    report_skipped(stats);

    match resolved.sort {
        None => {
            let mut emitted = 0u64;
            for fields in matching {
                let slices: Vec<FieldSlice> = fields.iter().map(|f| f.as_slice()).collect();
                let projected: Vec<FieldSlice> =
                    resolved.projection.project(&slices, b"" as &[u8]);
                writer.write_row(&projected)?;
                emitted += 1;
                if let Some(l) = resolved.limit {
                    if emitted >= l {
                        break;
                    }
                }
            }
        }
        Some(spec) => {
            let descending = matches!(spec.direction, Direction::Desc);
            let mut indexed: Vec<(&Vec<Vec<u8>>, f64)> = matching
                .into_iter()
                .map(|fields| {
                    let key = fields
                        .get(spec.column)
                        .and_then(|f| parse_numeric_bytes(f))
                        .unwrap_or(f64::NAN);
                    (fields, key)
                })
                .collect();
            indexed.sort_by(|(a_fields, a_key), (b_fields, b_key)| {
                let ordering = match (a_key.is_nan(), b_key.is_nan()) {
                    (false, false) => a_key.partial_cmp(b_key).unwrap_or(std::cmp::Ordering::Equal),
                    (false, true) => std::cmp::Ordering::Less,
                    (true, false) => std::cmp::Ordering::Greater,
                    (true, true) => {
                        let a_bytes = a_fields.get(spec.column).map(|v| v.as_slice()).unwrap_or(b"");
                        let b_bytes = b_fields.get(spec.column).map(|v| v.as_slice()).unwrap_or(b"");
                        a_bytes.cmp(b_bytes)
                    }
                };
                if descending { ordering.reverse() } else { ordering }
            });
            let mut emitted = 0u64;
            for (fields, _) in indexed {
                let slices: Vec<FieldSlice> = fields.iter().map(|f| f.as_slice()).collect();
                let projected: Vec<FieldSlice> =
                    resolved.projection.project(&slices, b"" as &[u8]);
                writer.write_row(&projected)?;
                emitted += 1;
                if let Some(l) = resolved.limit {
                    if emitted >= l {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

fn report_skipped(stats: ScanStats) {
    if stats.too_many_fields > 0 {
        warn!("skipped {} row(s) exceeding the field cap", stats.too_many_fields);
    }
}
