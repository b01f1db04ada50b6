use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::ingest::ingest_rows;
use super::model::{DataSource, Dataset, RawRow, RawValue};
use super::sample;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON row {0} is not an object")]
    JsonShape(usize),
    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("reading arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("no usable records ({dropped} rows dropped)")]
    NoRecords { dropped: usize },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and normalize a dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row, one observation per line; `,` `;` tab
///   or `|` separated
/// * `.json`    – `[{ "year": 2021, "region": "Europe", ... }, ...]`
/// * `.parquet` – flat columns named like the CSV header
///
/// A file whose rows are all rejected counts as a failed load.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let rows = load_rows(path)?;
    let ingested = ingest_rows(&rows);
    if ingested.records.is_empty() {
        return Err(LoadError::NoRecords {
            dropped: ingested.dropped,
        });
    }
    log::info!(
        "Loaded {} records from {} ({} rows dropped)",
        ingested.records.len(),
        path.display(),
        ingested.dropped
    );
    Ok(Dataset::new(
        ingested.records,
        DataSource::File(path.to_path_buf()),
    ))
}

/// A dataset plus the reason the file could not be used, if it could not.
#[derive(Debug)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub fallback_reason: Option<String>,
}

/// Load `path`, substituting a generated sample dataset on any failure so
/// callers always get a non-empty [`Dataset`].
pub fn load_or_sample(path: &Path, seed: Option<u64>) -> LoadOutcome {
    match load_dataset(path) {
        Ok(dataset) => LoadOutcome {
            dataset,
            fallback_reason: None,
        },
        Err(e) => {
            log::warn!("Falling back to sample data: {e}");
            LoadOutcome {
                dataset: sample::generate(seed),
                fallback_reason: Some(e.to_string()),
            }
        }
    }
}

/// Read the raw rows of a file without normalizing them.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let open = || {
        File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    match ext.as_str() {
        "csv" | "tsv" => read_csv_rows(open()?),
        "json" => read_json_rows(open()?),
        "parquet" | "pq" => read_parquet_rows(open()?),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names; every cell is typed by [`guess_raw_type`].
/// Short rows are tolerated, missing trailing cells are simply absent.
/// The delimiter is detected from the header line (see [`sniff_delimiter`]).
pub fn read_csv_rows<R: Read>(mut reader: R) -> Result<Vec<RawRow>, LoadError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| LoadError::Csv(e.into()))?;
    let delimiter = sniff_delimiter(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes.as_slice());
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        // Blank trailing lines come through as a single empty field.
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(col, cell)| (col.clone(), guess_raw_type(cell)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Most frequent candidate delimiter on the first line; comma on ties or
/// when none occurs.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let mut best = (b',', 0usize);
    for candidate in DELIMITER_CANDIDATES {
        let count = header.iter().filter(|&&b| b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

fn guess_raw_type(s: &str) -> RawValue {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return RawValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return RawValue::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return RawValue::Float(f);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => RawValue::Bool(true),
        "false" => RawValue::Bool(false),
        _ => RawValue::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented array, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "year": 2021, "region": "Europe", "mode": "SUV", "sales_volume": 1200 },
///   ...
/// ]
/// ```
pub fn read_json_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, LoadError> {
    let root: Vec<JsonValue> = serde_json::from_reader(reader)?;
    root.iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec.as_object().ok_or(LoadError::JsonShape(i))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_raw(val)))
                .collect())
        })
        .collect()
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawValue::Float(f)
            } else {
                RawValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => RawValue::Bool(*b),
        JsonValue::Null => RawValue::Null,
        other => RawValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by Pandas, Polars, or `generate_sample`.
fn read_parquet_rows(file: File) -> Result<Vec<RawRow>, LoadError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let schema = batch.schema();
        let columns = batch
            .columns()
            .iter()
            .map(normalize_column)
            .collect::<Result<Vec<_>, _>>()?;
        for row in 0..batch.num_rows() {
            let raw: RawRow = schema
                .fields()
                .iter()
                .zip(&columns)
                .map(|(field, col)| (field.name().clone(), extract_raw_value(col, row)))
                .collect();
            rows.push(raw);
        }
    }
    Ok(rows)
}

/// Cast the column families [`extract_raw_value`] does not read directly
/// (dictionary and view strings, narrow or unsigned integers, half floats)
/// to `Utf8`, `Int64` or `Float64`.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef, LoadError> {
    let target = match col.data_type() {
        DataType::Dictionary(_, _) | DataType::Utf8View | DataType::LargeUtf8 => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 => DataType::Float64,
        _ => return Ok(Arc::clone(col)),
    };
    Ok(cast(col, &target)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &ArrayRef, row: usize) -> RawValue {
    if col.is_null(row) {
        return RawValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => match col.as_any().downcast_ref::<StringArray>() {
            Some(s) => RawValue::Text(s.value(row).to_string()),
            None => RawValue::Null,
        },
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(RawValue::Null, |a| RawValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(RawValue::Null, |a| RawValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(RawValue::Null, |a| RawValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(RawValue::Null, |a| RawValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(RawValue::Null, |a| RawValue::Bool(a.value(row))),
        other => {
            log::debug!("Unsupported parquet column type {other:?}, treating as null");
            RawValue::Null
        }
    }
}
