//! Reconstruction of the Region → Feeder → DT → Meter tree from the three
//! flat sheets.
//!
//! Entities live in per-level arenas. Tree links and the lookup indexes both
//! store arena positions, so every entity reachable through the tree is the
//! same one reachable through its index.
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{BuildConfig, DuplicatePolicy};
use crate::energy::energy;
use crate::metrics;
use crate::normalize::{ColumnProfile, DtRecord, FeederRecord, MeterRecord, Strict};
use crate::types::{Dt, Feeder, Meter, Region, Row, SlaCounters};

/// Maps an identifier to a position in one of the entity arenas.
pub(crate) type IndexById = IndexMap<String, usize>;

/// Diagnostics collected while building a [`Model`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub feeder_rows: usize,
    pub dt_rows: usize,
    pub meter_rows: usize,
    /// DTs whose feeder id did not resolve.
    pub orphan_dts: usize,
    /// Mapped meters attached to neither a DT nor a feeder.
    pub orphan_meters: usize,
    pub unmapped_meters: usize,
    pub duplicate_feeders: usize,
    pub duplicate_dts: usize,
    pub duplicate_meters: usize,
}

/// One fully built and annotated snapshot of the network.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) regions: Vec<Region>,
    pub(crate) feeders: Vec<Feeder>,
    pub(crate) dts: Vec<Dt>,
    pub(crate) meters: Vec<Meter>,
    pub(crate) region_index: IndexById,
    pub(crate) feeder_index: IndexById,
    pub(crate) dt_index: IndexById,
    pub(crate) meter_index: IndexById,
    pub(crate) sla: SlaCounters,
    pub(crate) report: BuildReport,
}

impl SlaCounters {
    fn record(&mut self, comm: bool, non_comm: bool, unmapped: bool, never_comm: bool) {
        self.total_rows += 1;
        self.comm += usize::from(comm);
        self.non_comm += usize::from(non_comm);
        self.unmapped += usize::from(unmapped);
        self.never_comm += usize::from(never_comm);
    }
}

impl Model {
    /// Builds a model from the rows of the `Feeders`, `DTs` and `Meters`
    /// sheets, read with the strict column profile.
    pub fn build(feeder_rows: &[Row], dt_rows: &[Row], meter_rows: &[Row], config: &BuildConfig) -> Self {
        Self::build_with(&Strict, feeder_rows, dt_rows, meter_rows, config)
    }

    /// Like [`Model::build`], with an explicit column profile.
    ///
    /// Sheets are processed strictly in feeder, DT, meter order: each pass
    /// links against the indexes filled by the previous one.
    pub fn build_with<P: ColumnProfile + ?Sized>(
        profile: &P,
        feeder_rows: &[Row],
        dt_rows: &[Row],
        meter_rows: &[Row],
        config: &BuildConfig,
    ) -> Self {
        let mut model = Model::default();
        let policy = config.duplicate_ids;

        for row in feeder_rows {
            model.add_feeder(profile.feeder(row), policy);
        }
        for row in dt_rows {
            model.add_dt(profile.dt(row), policy);
        }
        for row in meter_rows {
            model.add_meter(profile.meter(row), policy);
        }

        metrics::annotate(&mut model);

        info!(
            regions = model.regions.len(),
            feeders = model.feeder_index.len(),
            dts = model.dt_index.len(),
            meters = model.meter_index.len(),
            orphan_dts = model.report.orphan_dts,
            orphan_meters = model.report.orphan_meters,
            "built network model"
        );
        model
    }

    /// Whether a duplicate id should be skipped under `policy`, recording it
    /// either way.
    fn skip_duplicate(index: &IndexById, id: &str, counter: &mut usize, policy: DuplicatePolicy, what: &str) -> bool {
        if !index.contains_key(id) {
            return false;
        }
        *counter += 1;
        match policy {
            DuplicatePolicy::Overwrite => {
                debug!(id, "duplicate {what} id, replacing index entry");
                false
            }
            DuplicatePolicy::KeepFirst => {
                debug!(id, "duplicate {what} id, keeping first row");
                true
            }
        }
    }

    fn add_feeder(&mut self, rec: FeederRecord, policy: DuplicatePolicy) {
        self.report.feeder_rows += 1;
        self.sla.record(rec.comm, rec.non_comm, false, false);

        if Self::skip_duplicate(&self.feeder_index, &rec.id, &mut self.report.duplicate_feeders, policy, "feeder") {
            return;
        }

        let region_pos = match self.region_index.get(&rec.region) {
            Some(&pos) => pos,
            None => {
                let pos = self.regions.len();
                self.regions.push(Region {
                    name: rec.region.clone(),
                    feeders: Vec::new(),
                    metrics: Default::default(),
                });
                self.region_index.insert(rec.region.clone(), pos);
                pos
            }
        };

        let pos = self.feeders.len();
        self.feeders.push(Feeder {
            energy: energy(rec.day1, rec.day2, rec.multiplier),
            id: rec.id.clone(),
            name: rec.name,
            region: rec.region,
            day1: rec.day1,
            day2: rec.day2,
            multiplier: rec.multiplier,
            comm: rec.comm,
            non_comm: rec.non_comm,
            dts: Vec::new(),
            meters: Vec::new(),
            metrics: Default::default(),
        });
        self.feeder_index.insert(rec.id, pos);
        self.regions[region_pos].feeders.push(pos);
    }

    fn add_dt(&mut self, rec: DtRecord, policy: DuplicatePolicy) {
        self.report.dt_rows += 1;
        self.sla.record(rec.comm, rec.non_comm, rec.unmapped, rec.never_comm);

        if Self::skip_duplicate(&self.dt_index, &rec.id, &mut self.report.duplicate_dts, policy, "DT") {
            return;
        }

        let pos = self.dts.len();
        let parent = self.feeder_index.get(&rec.feeder_id).copied();
        self.dts.push(Dt {
            energy: energy(rec.day1, rec.day2, rec.multiplier),
            id: rec.id.clone(),
            name: rec.name,
            region: rec.region,
            feeder_id: rec.feeder_id,
            day1: rec.day1,
            day2: rec.day2,
            multiplier: rec.multiplier,
            comm: rec.comm,
            non_comm: rec.non_comm,
            unmapped: rec.unmapped,
            never_comm: rec.never_comm,
            meters: Vec::new(),
            metrics: Default::default(),
        });

        match parent {
            Some(feeder_pos) => self.feeders[feeder_pos].dts.push(pos),
            None => {
                self.report.orphan_dts += 1;
                debug!(dt = %rec.id, feeder = %self.dts[pos].feeder_id, "DT references unknown feeder");
            }
        }
        self.dt_index.insert(rec.id, pos);
    }

    fn add_meter(&mut self, rec: MeterRecord, policy: DuplicatePolicy) {
        self.report.meter_rows += 1;
        self.sla.record(rec.comm, rec.non_comm, rec.unmapped, rec.never_comm);

        if Self::skip_duplicate(&self.meter_index, &rec.id, &mut self.report.duplicate_meters, policy, "meter") {
            return;
        }

        let pos = self.meters.len();
        let dt_parent = self.dt_index.get(&rec.dt_id).copied();
        let feeder_parent = self.feeder_index.get(&rec.feeder_id).copied();
        let unmapped = rec.unmapped;
        self.meters.push(Meter {
            energy: energy(rec.day1, rec.day2, 1.0),
            id: rec.id.clone(),
            feeder_id: rec.feeder_id,
            dt_id: rec.dt_id,
            day1: rec.day1,
            day2: rec.day2,
            comm: rec.comm,
            non_comm: rec.non_comm,
            unmapped: rec.unmapped,
            never_comm: rec.never_comm,
        });
        self.meter_index.insert(rec.id, pos);

        if unmapped {
            self.report.unmapped_meters += 1;
            return;
        }
        // Each parent links independently; a meter may end up under its DT
        // but not its feeder, or the other way round.
        if let Some(dt_pos) = dt_parent {
            self.dts[dt_pos].meters.push(pos);
        }
        if let Some(feeder_pos) = feeder_parent {
            self.feeders[feeder_pos].meters.push(pos);
        }
        if dt_parent.is_none() && feeder_parent.is_none() {
            self.report.orphan_meters += 1;
            debug!(meter = %self.meters[pos].id, "meter references unknown DT and feeder");
        }
    }

    /// Regions in first-encounter order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn sla(&self) -> &SlaCounters {
        &self.sla
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn is_empty(&self) -> bool {
        self.sla.total_rows == 0
    }

    /// Feeders linked under `region`, in row order.
    pub fn feeders_of<'a>(&'a self, region: &'a Region) -> impl Iterator<Item = &'a Feeder> + 'a {
        region.feeders.iter().map(move |&i| &self.feeders[i])
    }

    /// DTs linked under `feeder`, in row order.
    pub fn dts_of<'a>(&'a self, feeder: &'a Feeder) -> impl Iterator<Item = &'a Dt> + 'a {
        feeder.dts.iter().map(move |&i| &self.dts[i])
    }

    /// Mapped meters whose feeder id resolved to `feeder`.
    pub fn meters_of_feeder<'a>(&'a self, feeder: &'a Feeder) -> impl Iterator<Item = &'a Meter> + 'a {
        feeder.meters.iter().map(move |&i| &self.meters[i])
    }

    /// Mapped meters whose DT id resolved to `dt`.
    pub fn meters_of_dt<'a>(&'a self, dt: &'a Dt) -> impl Iterator<Item = &'a Meter> + 'a {
        dt.meters.iter().map(move |&i| &self.meters[i])
    }

    /// Every indexed feeder, one per distinct id.
    pub fn indexed_feeders(&self) -> impl Iterator<Item = &Feeder> + '_ {
        self.feeder_index.values().map(move |&i| &self.feeders[i])
    }

    pub fn indexed_dts(&self) -> impl Iterator<Item = &Dt> + '_ {
        self.dt_index.values().map(move |&i| &self.dts[i])
    }

    pub fn indexed_meters(&self) -> impl Iterator<Item = &Meter> + '_ {
        self.meter_index.values().map(move |&i| &self.meters[i])
    }
}
