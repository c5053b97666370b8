//! CSV Directory Loader Module
//! Reads every CSV export in a folder, normalizes headers and encodings,
//! and concatenates everything into one unified Polars DataFrame.

use crate::data::schema::{self, col, DataCategory};
use chrono::{Local, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read directory {path}: {source}")]
    DirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Raw runner-state column, normalized per file so the derive stage can
/// compute `has_runner` without knowing each export's header spelling.
pub const RUNNERS: &str = "Runners";

/// Source-header candidates for the date column, in preference order.
const DATE_SOURCES: &[&str] = &["Pitch Created At", col::DATE];

/// Result of a directory load. A folder without CSV files is a valid state,
/// not an error.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// No `*.csv` files found in the folder.
    NoData,
    Loaded {
        df: DataFrame,
        file_count: usize,
        from_cache: bool,
    },
}

/// Content fingerprint of a folder: sorted (name, size, mtime) triples of its
/// CSV files. Two folders with equal fingerprints load to the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirFingerprint(Vec<(String, u64, u64)>);

impl DirFingerprint {
    pub fn of(dir: &Path) -> Result<Self, LoaderError> {
        let mut entries = Vec::new();
        for path in csv_files(dir)? {
            let meta = std::fs::metadata(&path).map_err(|source| LoaderError::FileError {
                path: path.clone(),
                source,
            })?;
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            entries.push((name, meta.len(), mtime));
        }
        entries.sort();
        Ok(DirFingerprint(entries))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.0.len()
    }
}

/// Loads a folder of pitch-tracking CSVs with whole-result memoization keyed
/// on the folder's content fingerprint.
pub struct DataLoader {
    cache: Option<(DirFingerprint, DataFrame)>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Load every CSV in `dir` into one unified table. A repeat call with an
    /// unchanged folder returns the cached table without touching disk again.
    pub fn load_dir(&mut self, dir: &Path) -> Result<LoadOutcome, LoaderError> {
        let fingerprint = DirFingerprint::of(dir)?;
        if fingerprint.is_empty() {
            self.cache = None;
            return Ok(LoadOutcome::NoData);
        }

        if let Some((cached_fp, cached_df)) = &self.cache {
            if *cached_fp == fingerprint {
                debug!("folder unchanged, serving cached table");
                return Ok(LoadOutcome::Loaded {
                    df: cached_df.clone(),
                    file_count: fingerprint.file_count(),
                    from_cache: true,
                });
            }
        }

        let files = csv_files(dir)?;
        let file_count = files.len();

        // A file that fails to parse entirely is skipped with a warning;
        // malformed rows inside a file already degrade to nulls.
        let frames: Vec<DataFrame> = files
            .par_iter()
            .filter_map(|path| match load_file(path) {
                Ok(df) => Some(df),
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        if frames.is_empty() {
            self.cache = None;
            return Ok(LoadOutcome::NoData);
        }

        let df = polars::functions::concat_df_diagonal(&frames)?;
        debug!("loaded {} rows from {} file(s)", df.height(), file_count);
        self.cache = Some((fingerprint, df.clone()));

        Ok(LoadOutcome::Loaded {
            df,
            file_count,
            from_cache: false,
        })
    }

    /// Drop the cached table, forcing the next load to re-read disk.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

/// List `*.csv` files in a directory, non-recursive, sorted for determinism.
fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoaderError::DirError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Read one CSV file into a normalized frame with the canonical schema.
pub fn load_file(path: &Path) -> Result<DataFrame, LoaderError> {
    let bytes = std::fs::read(path).map_err(|source| LoaderError::FileError {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, encoding) = decode_csv_bytes(&bytes);
    debug!("{}: decoded as {}", path.display(), encoding);

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let category = DataCategory::from_filename(&name);

    normalize_frame(&raw, category)
}

/// Probe bytes as strict UTF-8, falling back to the Shift_JIS codepage the
/// older export tooling wrote.
pub fn decode_csv_bytes(bytes: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), "utf-8"),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(bytes);
            (decoded.into_owned(), "shift_jis")
        }
    }
}

/// Rebuild a raw frame into the canonical column set: headers renamed, text
/// columns stringified, measurements coerced to Float64-or-null, date
/// normalized, runner column unified, category tagged.
pub fn normalize_frame(raw: &DataFrame, category: DataCategory) -> Result<DataFrame, LoaderError> {
    let height = raw.height();
    let mut columns: Vec<Column> = Vec::new();

    // Pitcher: first-name exports take priority; nulls become "Unknown".
    let pitcher: Vec<String> = match source_column(raw, &["Pitcher First Name", col::PITCHER]) {
        Some(series) => (0..height)
            .map(|i| match string_at(series, i) {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => schema::UNKNOWN_PITCHER.to_string(),
            })
            .collect(),
        None => vec![schema::UNKNOWN_PITCHER.to_string(); height],
    };
    columns.push(Column::new(col::PITCHER.into(), pitcher));

    // Date: normalized to YYYY-MM-DD strings; a file without any date column
    // is stamped with today's date.
    let date: Vec<String> = match source_column(raw, DATE_SOURCES) {
        Some(series) => (0..height)
            .map(|i| match string_at(series, i) {
                Some(s) => normalize_date(&s),
                None => today(),
            })
            .collect(),
        None => vec![today(); height],
    };
    columns.push(Column::new(col::DATE.into(), date));

    // Remaining text columns, synthesized as null when the export lacks them.
    for &name in schema::TEXT_COLUMNS {
        if name == col::PITCHER || name == col::DATE {
            continue;
        }
        let values: Vec<Option<String>> = match canonical_column(raw, name) {
            Some(series) => (0..height)
                .map(|i| string_at(series, i).map(|s| s.trim().to_string()))
                .collect(),
            None => vec![None; height],
        };
        columns.push(Column::new(name.into(), values));
    }

    // Runner state: first column whose name contains "runn", kept raw.
    let runner_source = raw
        .get_column_names()
        .iter()
        .find(|n| n.to_lowercase().contains("runn"))
        .map(|n| n.to_string());
    let runners: Vec<Option<String>> = match runner_source.and_then(|n| raw.column(&n).ok()) {
        Some(series) => (0..height).map(|i| string_at(series, i)).collect(),
        None => vec![None; height],
    };
    columns.push(Column::new(RUNNERS.into(), runners));

    // Measurement columns: numeric-or-null, never a hard failure.
    for &name in schema::NUMERIC_COLUMNS {
        let values: Vec<Option<f64>> = match canonical_column(raw, name) {
            Some(series) => (0..height).map(|i| float_at(series, i)).collect(),
            None => vec![None; height],
        };
        columns.push(Column::new(name.into(), values));
    }

    columns.push(Column::new(
        col::CATEGORY.into(),
        vec![category.tag().to_string(); height],
    ));

    Ok(DataFrame::new(columns)?)
}

/// Look a canonical column up in a raw frame, checking the canonical name
/// first and then every header variant that renames to it.
fn canonical_column<'a>(raw: &'a DataFrame, canonical: &str) -> Option<&'a Column> {
    if let Ok(c) = raw.column(canonical) {
        return Some(c);
    }
    for (variant, target) in schema::RENAME_TABLE {
        if *target == canonical {
            if let Ok(c) = raw.column(variant) {
                return Some(c);
            }
        }
    }
    None
}

/// First present column among `names`.
fn source_column<'a>(raw: &'a DataFrame, names: &[&str]) -> Option<&'a Column> {
    names.iter().find_map(|n| raw.column(n).ok())
}

/// Cell as trimmed string, nulls and empty strings as None.
pub fn string_at(column: &Column, idx: usize) -> Option<String> {
    let value = column.get(idx).ok()?;
    if value.is_null() {
        return None;
    }
    let s = value.to_string().trim_matches('"').to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Cell as finite f64, anything else as None.
pub fn float_at(column: &Column, idx: usize) -> Option<f64> {
    let value = column.get(idx).ok()?;
    let parsed = match value {
        AnyValue::Float64(v) => Some(v),
        AnyValue::Float32(v) => Some(v as f64),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::Int32(v) => Some(v as f64),
        AnyValue::Int16(v) => Some(v as f64),
        AnyValue::Int8(v) => Some(v as f64),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::UInt32(v) => Some(v as f64),
        AnyValue::UInt16(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(v as f64),
        AnyValue::String(s) => s.trim().parse::<f64>().ok(),
        AnyValue::StringOwned(ref s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Normalize a raw date/timestamp string to `YYYY-MM-DD`. Unparseable values
/// pass through trimmed so exact-string filtering still works.
fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"');

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
    }
    // Timestamps with a zone offset, as some exports write.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }

    trimmed.to_string()
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pitchscope_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn empty_dir_yields_no_data_sentinel() {
        let dir = temp_dir("empty");
        let mut loader = DataLoader::new();
        let outcome = loader.load_dir(&dir).unwrap();
        assert!(matches!(outcome, LoadOutcome::NoData));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn non_csv_files_are_ignored() {
        let dir = temp_dir("noncsv");
        std::fs::write(dir.join("readme.txt"), "not a csv").unwrap();
        let mut loader = DataLoader::new();
        let outcome = loader.load_dir(&dir).unwrap();
        assert!(matches!(outcome, LoadOutcome::NoData));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn repeat_load_hits_cache() {
        let dir = temp_dir("cache");
        std::fs::write(
            dir.join("pbp_game.csv"),
            "Pitcher,PitchCall,TaggedPitchType,Balls,Strikes\nSato,StrikeCalled,Fastball,0,0\n",
        )
        .unwrap();

        let mut loader = DataLoader::new();
        let first = loader.load_dir(&dir).unwrap();
        let second = loader.load_dir(&dir).unwrap();

        match (first, second) {
            (
                LoadOutcome::Loaded {
                    from_cache: false, ..
                },
                LoadOutcome::Loaded {
                    df,
                    from_cache: true,
                    ..
                },
            ) => assert_eq!(df.height(), 1),
            other => panic!("unexpected outcomes: {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn decode_falls_back_to_shift_jis() {
        // "田中" in Shift_JIS, invalid as UTF-8.
        let bytes = [0x93, 0x63, 0x92, 0x86];
        let (text, encoding) = decode_csv_bytes(&bytes);
        assert_eq!(encoding, "shift_jis");
        assert_eq!(text, "田中");

        let (_, encoding) = decode_csv_bytes("Pitcher\nSato\n".as_bytes());
        assert_eq!(encoding, "utf-8");
    }

    #[test]
    fn header_variants_map_to_canonical() {
        let raw = DataFrame::new(vec![
            Column::new("Pitch Type".into(), vec!["Slider", "Fastball"]),
            Column::new("Is Strike".into(), vec!["Y", "N"]),
            Column::new("RelSpeed (KMH)".into(), vec!["132.5", "abc"]),
        ])
        .unwrap();

        let df = normalize_frame(&raw, DataCategory::Pbp).unwrap();
        let types = df.column(col::PITCH_TYPE).unwrap();
        assert_eq!(string_at(types, 0).as_deref(), Some("Slider"));

        // Unparseable measurement degrades to null, the row survives.
        let speed = df.column(col::REL_SPEED).unwrap();
        assert_eq!(float_at(speed, 0), Some(132.5));
        assert_eq!(float_at(speed, 1), None);

        // Missing pitcher column synthesized with the placeholder.
        let pitcher = df.column(col::PITCHER).unwrap();
        assert_eq!(string_at(pitcher, 0).as_deref(), Some("Unknown"));

        let cat = df.column(col::CATEGORY).unwrap();
        assert_eq!(string_at(cat, 0).as_deref(), Some("PBP"));
    }

    #[test]
    fn dates_normalize_to_iso() {
        assert_eq!(normalize_date("2024/04/01 18:30:00"), "2024-04-01");
        assert_eq!(normalize_date("2024-04-01"), "2024-04-01");
        assert_eq!(normalize_date("04/01/2024"), "2024-04-01");
        // Unparseable values pass through for exact-string filtering.
        assert_eq!(normalize_date("opening day"), "opening day");
    }
}
