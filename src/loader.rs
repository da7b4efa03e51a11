//! Workbook readers.
//!
//! A workbook is a set of named sheets, each a list of [`Row`]s. Readers only
//! fail when the source as a whole cannot be read; bad records are skipped
//! and logged.
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Cell, Row};

pub const FEEDERS_SHEET: &str = "Feeders";
pub const DTS_SHEET: &str = "DTs";
pub const METERS_SHEET: &str = "Meters";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: IndexMap<String, Vec<Row>>,
}

impl Workbook {
    /// Rows of the named sheet; a missing sheet reads as empty.
    pub fn sheet(&self, name: &str) -> &[Row] {
        self.sheets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_sheet(&self) -> &[Row] {
        self.sheets.values().next().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.sheets.insert(name.into(), rows);
        self
    }

    /// Read whatever [`source_for`] picks for `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        source_for(path)?.read()
    }

    /// Whether at least one of the three network sheets is present.
    pub fn has_network_sheets(&self) -> bool {
        [FEEDERS_SHEET, DTS_SHEET, METERS_SHEET]
            .iter()
            .any(|name| self.sheets.contains_key(*name))
    }
}

/// Anything that can produce a [`Workbook`].
pub trait WorkbookSource {
    /// Human readable name of the source, for logs and report headers.
    fn label(&self) -> String;

    fn read(&self) -> Result<Workbook>;
}

/// A directory holding one `<sheet>.csv` file per sheet.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WorkbookSource for CsvWorkbook {
    fn label(&self) -> String {
        self.dir.display().to_string()
    }

    fn read(&self) -> Result<Workbook> {
        if !self.dir.is_dir() {
            return Err(Error::MissingSource(self.dir.clone()));
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
            .collect();
        files.sort();

        let mut workbook = Workbook::default();
        for path in files {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let rows = read_csv_sheet(&path)?;
            debug!(sheet = %name, rows = rows.len(), "read CSV sheet");
            workbook.sheets.insert(name, rows);
        }
        Ok(workbook)
    }
}

fn read_csv_sheet(path: &Path) -> Result<Vec<Row>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    let mut parse_errors = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };
        // Short records leave their trailing columns empty.
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let cell = match record.get(i) {
                    Some("") | None => Cell::Empty,
                    Some(v) => Cell::Text(v.to_string()),
                };
                (h.clone(), cell)
            })
            .collect();
        rows.push(row);
    }
    if parse_errors > 0 {
        warn!(path = %path.display(), parse_errors, "skipped unreadable CSV records");
    }
    Ok(rows)
}

/// A JSON document of the form `{ "<sheet>": [ { "<column>": value, ... } ] }`.
#[derive(Debug, Clone)]
pub struct JsonWorkbook {
    path: PathBuf,
}

impl JsonWorkbook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorkbookSource for JsonWorkbook {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Workbook> {
        if !self.path.is_file() {
            return Err(Error::MissingSource(self.path.clone()));
        }
        let text = fs::read_to_string(&self.path)?;
        let raw: IndexMap<String, Vec<IndexMap<String, serde_json::Value>>> = serde_json::from_str(&text)?;
        let sheets = raw
            .into_iter()
            .map(|(name, rows)| {
                let rows = rows
                    .into_iter()
                    .map(|r| r.into_iter().map(|(k, v)| (k, Cell::from(v))).collect())
                    .collect();
                (name, rows)
            })
            .collect();
        Ok(Workbook { sheets })
    }
}

/// Picks a reader for `path`: a directory is read as CSV sheets, a `.json`
/// file as a JSON workbook.
pub fn source_for(path: &Path) -> Result<Box<dyn WorkbookSource>> {
    if path.is_dir() {
        return Ok(Box::new(CsvWorkbook::new(path)));
    }
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return Ok(Box::new(JsonWorkbook::new(path)));
    }
    if !path.exists() {
        return Err(Error::MissingSource(path.to_path_buf()));
    }
    Err(Error::UnsupportedSource(path.to_path_buf()))
}
