//! Atomic temp-and-rename persistence for every piece of process state this
//! system carries across restarts.
//!
//! Every writer goes through [`write_json_atomic`] or [`write_csv_atomic`]:
//! write to `<path>.tmp` in the same directory, then rename over `<path>`.
//! Every reader tolerates a missing or malformed file by logging and
//! returning an empty/default value rather than propagating an error —
//! `CacheCorruption` never crashes the process, per this system's error
//! handling policy.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::coverage::{CoverageLedger, Interval};
use crate::error::{CoreError, CoreResult};
use crate::raw::RawTable;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Reads `path` as JSON, logging and returning `T::default()` if the file
/// is missing or fails to parse.
pub fn read_json_tolerant<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                log_corruption(path, err);
                T::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(err) => {
            log_corruption(path, err);
            T::default()
        }
    }
}

/// Builds the documented `CacheCorruption` error purely to log it — readers
/// never propagate it, they only use its `Display` to keep the warning
/// message consistent with the error table.
fn log_corruption(path: &Path, source: impl std::error::Error + Send + Sync + 'static) {
    let err = CoreError::CacheCorruption {
        path: path.to_path_buf(),
        source: Box::new(source),
    };
    tracing::warn!(%err, "treating cache entry as empty");
}

/// Persists a coverage ledger as `{tag: [[startSec, endSec], ...]}`.
pub fn write_coverage_atomic(path: &Path, ledger: &CoverageLedger) -> CoreResult<()> {
    let serializable: IndexMap<String, Vec<(i64, i64)>> = ledger
        .tags()
        .map(|tag| {
            let pairs = ledger
                .intervals(tag)
                .iter()
                .map(|i| (i.start_sec, i.end_sec))
                .collect();
            (tag.to_string(), pairs)
        })
        .collect();
    write_json_atomic(path, &serializable)
}

pub fn read_coverage_tolerant(path: &Path) -> CoverageLedger {
    let raw: IndexMap<String, Vec<(i64, i64)>> = read_json_tolerant(path);
    let mut ledger = CoverageLedger::new();
    for (tag, pairs) in raw {
        for (start, end) in pairs {
            if let Some(ivl) = Interval::new(start, end) {
                ledger.record(&tag, ivl);
            }
        }
    }
    ledger
}

/// Writes a RAW/WORKING-shaped table as CSV with the canonical column
/// order: `timestampMs`, `timestampText`, then tag columns in insertion
/// order.
pub fn write_table_csv_atomic(path: &Path, raw: &RawTable) -> CoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(File::create(tmp.path())?);
        let mut header = vec!["timestampMs".to_string(), "timestampText".to_string()];
        header.extend(raw.tag_names().map(str::to_string));
        writer.write_record(&header)?;

        let texts = raw.timestamp_text();
        for (row, &ts) in raw.timestamps_ms().iter().enumerate() {
            let mut record = vec![ts.to_string(), texts[row].clone()];
            for (_, values) in raw.columns() {
                record.push(
                    values[row]
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Reads a RAW/WORKING-shaped CSV, logging and returning an empty table on
/// any parse failure. A missing file is the ordinary cold-start case and is
/// never logged; a present-but-unparseable file is.
pub fn read_table_csv_tolerant(path: &Path) -> RawTable {
    if !path.exists() {
        return RawTable::new();
    }
    match read_table_csv(path) {
        Ok(table) => table,
        Err(err) => {
            log_corruption(path, err);
            RawTable::new()
        }
    }
}

fn read_table_csv(path: &Path) -> CoreResult<RawTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let tags: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

    let mut timestamps_ms = Vec::new();
    let mut columns: IndexMap<String, Vec<Option<f64>>> =
        tags.iter().map(|t| (t.clone(), Vec::new())).collect();

    for record in reader.records() {
        let record = record?;
        let ts: i64 = record.get(0).unwrap_or_default().parse().unwrap_or_default();
        timestamps_ms.push(ts);
        for (idx, tag) in tags.iter().enumerate() {
            let cell = record.get(idx + 2).unwrap_or_default();
            let value = if cell.is_empty() {
                None
            } else {
                cell.parse::<f64>().ok().filter(|v| v.is_finite())
            };
            columns[tag].push(value);
        }
    }

    Ok(RawTable::from_parts(timestamps_ms, columns))
}
