use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::cycle_core::Bar;

/// Epoch values above this are taken as milliseconds, below as seconds
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Supported bar file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarFileFormat {
    Csv,
    CsvZst,
    Json,
}

impl BarFileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".csv.zst") {
            Some(Self::CsvZst)
        } else if name.ends_with(".csv") {
            Some(Self::Csv)
        } else if name.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// Symbol from a file name like "BTCUSDT.csv.zst" -> "BTCUSDT"
pub fn symbol_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let symbol = name.split('.').next()?.trim();
    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_string())
    }
}

fn epoch_to_millis(value: i64) -> Result<i64> {
    if value.unsigned_abs() >= MILLIS_THRESHOLD as u64 {
        return Ok(value);
    }
    value
        .checked_mul(1000)
        .with_context(|| format!("Timestamp out of range: {}", value))
}

/// Parse a bar timestamp into epoch milliseconds.
///
/// Accepts epoch seconds or milliseconds, RFC 3339, "%Y-%m-%d %H:%M:%S"
/// and "%Y-%m-%d" (naive values are UTC).
pub fn parse_timestamp(raw: &str) -> Result<i64> {
    let raw = raw.trim();

    if let Ok(value) = raw.parse::<i64>() {
        return epoch_to_millis(value);
    }
    if let Ok(value) = raw.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, so the bound is exclusive
        if !value.is_finite() || value.abs() >= i64::MAX as f64 {
            bail!("Timestamp out of range: {:?}", raw);
        }
        return epoch_to_millis(value as i64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    bail!("Unrecognized timestamp: {:?}", raw)
}

/// CSV row; extra columns are ignored
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "time", alias = "date", alias = "ts")]
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Find all bar files in directory, optionally filtered by a file name substring
pub fn find_bar_files(data_dir: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read directory: {:?}", data_dir))?
    {
        let entry = entry?;
        let path = entry.path();

        if BarFileFormat::from_path(&path).is_none() {
            continue;
        }
        if let Some(filter) = filter {
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.contains(filter) {
                continue;
            }
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

fn read_csv_bars<R: Read>(reader: R, path: &Path) -> Result<Vec<Bar>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (line, result) in csv_reader.deserialize().enumerate() {
        let row: CsvRow =
            result.with_context(|| format!("Failed to parse CSV row {} in {:?}", line + 1, path))?;
        let timestamp = parse_timestamp(&row.timestamp)
            .with_context(|| format!("Bad timestamp on row {} in {:?}", line + 1, path))?;

        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

/// Load bars from a .csv, .csv.zst or .json file, in file order
pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let format = BarFileFormat::from_path(path)
        .with_context(|| format!("Unsupported bar file: {:?}", path))?;

    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;

    let bars = match format {
        BarFileFormat::Csv => read_csv_bars(BufReader::new(file), path)?,
        BarFileFormat::CsvZst => {
            let decoder = zstd::stream::Decoder::new(file)
                .with_context(|| format!("Failed to create zstd decoder for: {:?}", path))?;
            read_csv_bars(BufReader::new(decoder), path)?
        }
        BarFileFormat::Json => serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse JSON bars: {:?}", path))?,
    };

    tracing::debug!("Loaded {} bars from {:?}", bars.len(), path);
    Ok(bars)
}
