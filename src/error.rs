//! Errors raised by the outer surfaces of the crate: reading workbooks,
//! writing exports and validating the selection cursor.
//!
//! The hierarchy and metrics code never returns these; malformed input there
//! degrades to missing values instead.
use std::path::PathBuf;

use thiserror::Error;

use crate::query::Level;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("workbook source {0} does not exist")]
    MissingSource(PathBuf),
    #[error("unsupported workbook source {0}: expected a directory of CSV sheets or a .json file")]
    UnsupportedSource(PathBuf),
    #[error("no {level} with id {id:?} in the current model")]
    UnknownSelection { level: Level, id: String },
    #[error("selecting a {0} requires an id")]
    SelectionWithoutId(Level),
    #[error("the ALL selection does not take an id")]
    UnexpectedSelectionId,
}
