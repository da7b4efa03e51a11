//! Read-only views over a built [`Model`].
use std::collections::HashMap;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::energy::{loss_or_null, LossBand};
use crate::error::{Error, Result};
use crate::hierarchy::Model;
use crate::types::{
    Dt, Feeder, FeederSummaryRow, GlobalTotals, Meter, Region, RegionSummaryRow, ResultRow,
};
use crate::util::{pct, pct_or_dash, sum_present};

/// Hierarchy level addressed by a selection or a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Level {
    All,
    Region,
    Feeder,
    Dt,
    Meter,
}

/// What the presentation layer currently has open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub level: Level,
    pub id: Option<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            level: Level::All,
            id: None,
        }
    }
}

impl Selection {
    /// Checks that `id` names an existing entity at `level`.
    pub fn validated(model: &Model, level: Level, id: Option<&str>) -> Result<Self> {
        let found = match (level, id) {
            (Level::All, None) => return Ok(Selection::default()),
            (Level::All, Some(_)) => return Err(Error::UnexpectedSelectionId),
            (level, None) => return Err(Error::SelectionWithoutId(level)),
            (Level::Region, Some(id)) => model.region(id).is_some(),
            (Level::Feeder, Some(id)) => model.feeder(id).is_some(),
            (Level::Dt, Some(id)) => model.dt(id).is_some(),
            (Level::Meter, Some(id)) => model.meter(id).is_some(),
        };
        let id = id.unwrap_or_default().to_string();
        if !found {
            return Err(Error::UnknownSelection { level, id });
        }
        Ok(Selection {
            level,
            id: Some(id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub level: Level,
    pub id: String,
}

/// Lookup by identifier.
impl Model {
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.region_index.get(name).map(|&i| &self.regions[i])
    }

    pub fn feeder(&self, id: &str) -> Option<&Feeder> {
        self.feeder_index.get(id).map(|&i| &self.feeders[i])
    }

    pub fn dt(&self, id: &str) -> Option<&Dt> {
        self.dt_index.get(id).map(|&i| &self.dts[i])
    }

    pub fn meter(&self, id: &str) -> Option<&Meter> {
        self.meter_index.get(id).map(|&i| &self.meters[i])
    }

    /// Exact-match search across all four id spaces.
    ///
    /// Meters are checked first, then DTs, feeders and regions; the first hit
    /// wins. Surrounding whitespace in `token` is ignored and an empty token
    /// never matches.
    pub fn find_by_identifier(&self, token: &str) -> Option<SearchHit> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let level = if self.meter_index.contains_key(token) {
            Level::Meter
        } else if self.dt_index.contains_key(token) {
            Level::Dt
        } else if self.feeder_index.contains_key(token) {
            Level::Feeder
        } else if self.region_index.contains_key(token) {
            Level::Region
        } else {
            return None;
        };
        Some(SearchHit {
            level,
            id: token.to_string(),
        })
    }
}

/// Aggregate views.
impl Model {
    /// Dataset-wide counts, losses and SLA percentages.
    ///
    /// Losses divide dataset-wide energy sums rather than averaging per-node
    /// losses. Orphans and unmapped meters are included since they are part
    /// of the indexes.
    pub fn global_totals(&self) -> GlobalTotals {
        let feeder_energy = sum_present(self.indexed_feeders().map(|f| f.energy));
        let dt_energy = sum_present(self.indexed_dts().map(|d| d.energy));
        let meter_energy = sum_present(self.indexed_meters().map(|m| m.energy));
        let sla = &self.sla;

        GlobalTotals {
            feeders: self.feeder_index.len(),
            dts: self.dt_index.len(),
            meters: self.meter_index.len(),
            loss_fdt: loss_or_null(feeder_energy, dt_energy),
            loss_dtc: loss_or_null(dt_energy, meter_energy),
            loss_fc: loss_or_null(feeder_energy, meter_energy),
            communicating: sla.comm,
            communicating_pct: pct(sla.comm, sla.total_rows),
            non_communicating: sla.non_comm,
            non_communicating_pct: pct(sla.non_comm, sla.total_rows),
            unmapped: sla.unmapped,
            unmapped_pct: pct(sla.unmapped, sla.total_rows),
            never_comm: sla.never_comm,
            never_comm_pct: pct(sla.never_comm, sla.total_rows),
        }
    }

    /// Flat listing with one row per feeder followed by one row per DT.
    ///
    /// Sums are keyed on the foreign-key columns of the flat indexes, not on
    /// the tree, so orphans and unmapped meters still count towards the id
    /// they name. Missing or negative entity energies are left out of the
    /// sums; the entities themselves are still listed.
    pub fn flatten_results_table(&self) -> Vec<ResultRow> {
        let usable = |e: Option<f64>| e.filter(|v| *v >= 0.0);

        let mut cons_by_dt: HashMap<&str, f64> = HashMap::new();
        let mut cons_by_feeder: HashMap<&str, f64> = HashMap::new();
        for m in self.indexed_meters() {
            let e = usable(m.energy).unwrap_or(0.0);
            *cons_by_dt.entry(m.dt_id.as_str()).or_default() += e;
            *cons_by_feeder.entry(m.feeder_id.as_str()).or_default() += e;
        }

        let mut dt_by_feeder: HashMap<&str, f64> = HashMap::new();
        for d in self.indexed_dts() {
            *dt_by_feeder.entry(d.feeder_id.as_str()).or_default() += usable(d.energy).unwrap_or(0.0);
        }

        let mut rows = Vec::with_capacity(self.feeder_index.len() + self.dt_index.len());
        for f in self.indexed_feeders() {
            let feeder_energy = usable(f.energy);
            let sum_dt = dt_by_feeder.get(f.id.as_str()).copied().unwrap_or(0.0);
            let sum_cons = cons_by_feeder.get(f.id.as_str()).copied().unwrap_or(0.0);
            rows.push(ResultRow {
                feeder_code: f.id.clone(),
                feeder_energy,
                sum_dt_energy: Some(sum_dt),
                feeder_to_dt_loss: loss_or_null(feeder_energy, Some(sum_dt)),
                sum_cons_energy: Some(sum_cons),
                feeder_to_cons_loss: loss_or_null(feeder_energy, Some(sum_cons)),
                dt_code: String::new(),
                dt_energy: None,
                sum_cons_energy_for_dt: None,
                dt_to_cons_loss: None,
            });
        }
        for d in self.indexed_dts() {
            let dt_energy = usable(d.energy);
            let sum_cons = cons_by_dt.get(d.id.as_str()).copied().unwrap_or(0.0);
            rows.push(ResultRow {
                feeder_code: d.feeder_id.clone(),
                feeder_energy: None,
                sum_dt_energy: None,
                feeder_to_dt_loss: None,
                sum_cons_energy: None,
                feeder_to_cons_loss: None,
                dt_code: d.id.clone(),
                dt_energy,
                sum_cons_energy_for_dt: Some(sum_cons),
                dt_to_cons_loss: loss_or_null(dt_energy, Some(sum_cons)),
            });
        }
        rows
    }

    pub fn region_summary_rows(&self) -> Vec<RegionSummaryRow> {
        self.regions
            .iter()
            .map(|r| RegionSummaryRow {
                region: r.name.clone(),
                feeders: r.metrics.feeders,
                dts: r.metrics.dts,
                meters: r.metrics.meters,
                comm: r.metrics.communicating,
                non_comm: r.metrics.non_communicating,
                never_comm: r.metrics.never_comm,
                loss_fdt: pct_or_dash(r.metrics.loss_fdt),
                loss_dtc: pct_or_dash(r.metrics.loss_dtc),
                loss_fc: pct_or_dash(r.metrics.loss_fc),
            })
            .collect()
    }

    pub fn feeder_summary_rows(&self) -> Vec<FeederSummaryRow> {
        self.regions
            .iter()
            .flat_map(|r| self.feeders_of(r))
            .map(|f| FeederSummaryRow {
                region: f.region.clone(),
                feeder: f.name.clone(),
                dts: f.metrics.dts,
                meters: f.metrics.meters,
                loss_fdt: pct_or_dash(f.metrics.loss_fdt),
                loss_fc: pct_or_dash(f.metrics.loss_fc),
                band: LossBand::label(f.metrics.loss_fc),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::test_utils::{feeder_row, meter_row, sample_sheets, with};
    use crate::types::Cell;

    fn sample() -> Model {
        let (f, d, m) = sample_sheets();
        Model::build(&f, &d, &m, &BuildConfig::default())
    }

    #[test]
    fn global_totals_sum_then_ratio() {
        let totals = sample().global_totals();
        assert_eq!((totals.feeders, totals.dts, totals.meters), (3, 5, 7));
        assert_eq!(totals.loss_fdt, Some(-7.5));
        assert_eq!(totals.loss_dtc, Some(3.49));
        assert_eq!(totals.loss_fc, Some(-3.75));
        assert_eq!(totals.communicating, 4);
        assert_eq!(totals.communicating_pct, 26.67);
        assert_eq!(totals.non_communicating_pct, 13.33);
        assert_eq!(totals.unmapped_pct, 13.33);
        assert_eq!(totals.never_comm_pct, 13.33);
    }

    #[test]
    fn communicating_pct_over_all_rows() {
        let feeders: Vec<_> = (0..4)
            .map(|i| {
                let r = feeder_row("R", &format!("F{i}"), 0.0, 1.0, 1.0);
                if i < 3 {
                    with(r, "Comm", "Yes")
                } else {
                    r
                }
            })
            .collect();
        let meters: Vec<_> = (0..6)
            .map(|i| meter_row("F0", "DT0", &format!("M{i}"), 0.0, 1.0))
            .collect();
        let model = Model::build(&feeders, &[], &meters, &BuildConfig::default());
        assert_eq!(model.sla().total_rows, 10);
        assert_eq!(model.global_totals().communicating_pct, 30.0);
    }

    #[test]
    fn empty_model_totals() {
        let totals = Model::default().global_totals();
        assert_eq!(totals, GlobalTotals::default());
    }

    #[test]
    fn search_priority_meter_first() {
        let feeders = vec![feeder_row("X1", "X1", 0.0, 1.0, 1.0)];
        let meters = vec![meter_row("X1", "DT0", "X1", 0.0, 1.0)];
        let model = Model::build(&feeders, &[], &meters, &BuildConfig::default());
        assert_eq!(
            model.find_by_identifier("X1"),
            Some(SearchHit {
                level: Level::Meter,
                id: "X1".to_string()
            })
        );
    }

    #[test]
    fn search_each_level() {
        let model = sample();
        let level = |t: &str| model.find_by_identifier(t).map(|h| h.level);
        assert_eq!(level("M7"), Some(Level::Meter));
        assert_eq!(level(" DT9 "), Some(Level::Dt));
        assert_eq!(level("F2"), Some(Level::Feeder));
        assert_eq!(level("South"), Some(Level::Region));
        assert_eq!(level("south"), None);
        assert_eq!(level("F9"), None);
        assert_eq!(level(""), None);
    }

    #[test]
    fn results_table_rows() {
        let rows = sample().flatten_results_table();
        assert_eq!(rows.len(), 8);

        let f1 = &rows[0];
        assert_eq!(f1.feeder_code, "F1");
        assert_eq!(f1.feeder_energy, Some(1000.0));
        assert_eq!(f1.sum_dt_energy, Some(980.0));
        assert_eq!(f1.feeder_to_dt_loss, Some(2.0));
        assert_eq!(f1.sum_cons_energy, Some(960.0));
        assert_eq!(f1.feeder_to_cons_loss, Some(4.0));
        assert_eq!(f1.dt_code, "");
        assert_eq!(f1.dt_energy, None);

        let f2 = &rows[1];
        assert_eq!(f2.feeder_energy, Some(0.0));
        assert_eq!(f2.feeder_to_dt_loss, None);

        // The unmapped M6 still counts towards F3 / DT4 in the flat listing.
        let f3 = &rows[2];
        assert_eq!(f3.sum_cons_energy, Some(180.0));
        assert_eq!(f3.feeder_to_cons_loss, Some(10.0));

        let dt4 = rows.iter().find(|r| r.dt_code == "DT4").unwrap();
        assert_eq!(dt4.feeder_code, "F3");
        assert_eq!(dt4.feeder_energy, None);
        assert_eq!(dt4.sum_cons_energy_for_dt, Some(180.0));
        assert_eq!(dt4.dt_to_cons_loss, Some(5.26));

        let dt9 = rows.iter().find(|r| r.dt_code == "DT9").unwrap();
        assert_eq!(dt9.feeder_code, "F9");
        assert_eq!(dt9.dt_to_cons_loss, Some(14.29));
    }

    #[test]
    fn results_table_with_missing_energy() {
        let feeders = vec![with(feeder_row("R", "F1", 0.0, 0.0, 1.0), "Feeder Day2 reading", Cell::Empty)];
        let model = Model::build(&feeders, &[], &[], &BuildConfig::default());
        let rows = model.flatten_results_table();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].feeder_energy, None);
        assert_eq!(rows[0].sum_dt_energy, Some(0.0));
        assert_eq!(rows[0].feeder_to_dt_loss, None);
    }

    #[test]
    fn selection_validation() {
        let model = sample();
        assert_eq!(
            Selection::validated(&model, Level::All, None).unwrap(),
            Selection::default()
        );
        let sel = Selection::validated(&model, Level::Dt, Some("DT9")).unwrap();
        assert_eq!(sel.id.as_deref(), Some("DT9"));
        assert!(matches!(
            Selection::validated(&model, Level::Feeder, Some("DT9")),
            Err(Error::UnknownSelection { level: Level::Feeder, .. })
        ));
        assert!(matches!(
            Selection::validated(&model, Level::Meter, None),
            Err(Error::SelectionWithoutId(Level::Meter))
        ));
        assert!(matches!(
            Selection::validated(&model, Level::All, Some("x")),
            Err(Error::UnexpectedSelectionId)
        ));
    }

    #[test]
    fn level_names() {
        assert_eq!(Level::Dt.to_string(), "DT");
        assert_eq!("feeder".parse::<Level>().unwrap(), Level::Feeder);
        assert_eq!("ALL".parse::<Level>().unwrap(), Level::All);
    }

    #[test]
    fn summary_rows_follow_tree_order() {
        let model = sample();
        let regions = model.region_summary_rows();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].loss_fc, "50.00%");

        let feeders = model.feeder_summary_rows();
        let names: Vec<_> = feeders.iter().map(|f| f.feeder.as_str()).collect();
        assert_eq!(names, ["F1 line", "F2 line", "F3 line"]);
        assert_eq!(feeders[0].band, "Amber");
        assert_eq!(feeders[1].band, "—");
        assert_eq!(feeders[2].band, "Red");
    }
}
