//! Owner of the current snapshot.
//!
//! A load always ends with a usable model: the requested workbook when it
//! reads cleanly, the synthetic dataset otherwise. The new model is built in
//! full before it replaces the old one.
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::error::Result;
use crate::hierarchy::{BuildReport, Model};
use crate::loader::{source_for, Workbook, WorkbookSource, DTS_SHEET, FEEDERS_SHEET, METERS_SHEET};
use crate::query::{Level, SearchHit, Selection};
use crate::synthetic;
use crate::types::{Dt, Feeder, GlobalTotals, Meter, Region, ResultRow};

pub const DEFAULT_SEED: u64 = 7;

/// Where the current model came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataOrigin {
    Workbook(String),
    Synthetic { reason: String },
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOrigin::Workbook(label) => write!(f, "workbook {label}"),
            DataOrigin::Synthetic { reason } => write!(f, "synthetic data ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub origin: DataOrigin,
    pub report: BuildReport,
}

impl LoadOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, DataOrigin::Synthetic { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    model: Model,
    selection: Selection,
    origin: Option<DataOrigin>,
    config: BuildConfig,
    seed: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Dashboard::new(BuildConfig::default(), DEFAULT_SEED)
    }
}

impl Dashboard {
    pub fn new(config: BuildConfig, seed: u64) -> Self {
        Dashboard {
            model: Model::default(),
            selection: Selection::default(),
            origin: None,
            config,
            seed,
        }
    }

    /// Load from `source`, falling back to synthetic data on any read error.
    pub fn load(&mut self, source: &dyn WorkbookSource) -> LoadOutcome {
        let label = source.label();
        self.load_result(label, source.read())
    }

    /// Load from a path, picking the reader with [`source_for`].
    pub fn load_path(&mut self, path: &Path) -> LoadOutcome {
        let label = path.display().to_string();
        let read = source_for(path).and_then(|source| source.read());
        self.load_result(label, read)
    }

    /// Replace the model with the synthetic dataset.
    pub fn load_synthetic(&mut self, reason: impl Into<String>) -> LoadOutcome {
        let wb = synthetic::workbook(self.seed);
        self.install(&wb, DataOrigin::Synthetic { reason: reason.into() })
    }

    fn load_result(&mut self, label: String, read: Result<Workbook>) -> LoadOutcome {
        match read {
            Ok(wb) if wb.has_network_sheets() => {
                info!(source = %label, sheets = wb.sheets.len(), "loaded workbook");
                self.install(&wb, DataOrigin::Workbook(label))
            }
            Ok(_) => {
                warn!(source = %label, "workbook has no Feeders, DTs or Meters sheet; using synthetic data");
                self.load_synthetic(format!("{label} has no network sheets"))
            }
            Err(e) => {
                warn!(source = %label, error = %e, "failed to load workbook; using synthetic data");
                self.load_synthetic(e.to_string())
            }
        }
    }

    fn install(&mut self, wb: &Workbook, origin: DataOrigin) -> LoadOutcome {
        let model = Model::build(
            wb.sheet(FEEDERS_SHEET),
            wb.sheet(DTS_SHEET),
            wb.sheet(METERS_SHEET),
            &self.config,
        );
        let report = *model.report();
        self.model = model;
        self.selection = Selection::default();
        self.origin = Some(origin.clone());
        LoadOutcome { origin, report }
    }

    /// The current snapshot; empty until the first load.
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn origin(&self) -> Option<&DataOrigin> {
        self.origin.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.origin.is_some()
    }

    pub fn regions(&self) -> &[Region] {
        self.model.regions()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.model.region(name)
    }

    pub fn feeder(&self, id: &str) -> Option<&Feeder> {
        self.model.feeder(id)
    }

    pub fn dt(&self, id: &str) -> Option<&Dt> {
        self.model.dt(id)
    }

    pub fn meter(&self, id: &str) -> Option<&Meter> {
        self.model.meter(id)
    }

    pub fn global_totals(&self) -> GlobalTotals {
        self.model.global_totals()
    }

    pub fn find_by_identifier(&self, token: &str) -> Option<SearchHit> {
        self.model.find_by_identifier(token)
    }

    pub fn flatten_results_table(&self) -> Vec<ResultRow> {
        self.model.flatten_results_table()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Move the cursor. An invalid selection leaves the current one in place.
    pub fn select(&mut self, level: Level, id: Option<&str>) -> Result<&Selection> {
        self.selection = Selection::validated(&self.model, level, id)?;
        Ok(&self.selection)
    }
}
