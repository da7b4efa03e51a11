//! Bottom-up annotation of a freshly built [`Model`].
//!
//! Losses at every level compare an upstream energy with the summed energy
//! of what is linked below it. Missing energies are left out of the sums.
use crate::energy::loss_or_null;
use crate::hierarchy::Model;
use crate::types::{Dt, DtMetrics, Feeder, FeederMetrics, Region, RegionMetrics};
use crate::util::sum_present;

/// Fill in the `metrics` record of every DT, feeder and region.
pub(crate) fn annotate(model: &mut Model) {
    let dts: Vec<DtMetrics> = {
        let view = &*model;
        view.dts.iter().map(|d| dt_metrics(view, d)).collect()
    };
    for (dt, m) in model.dts.iter_mut().zip(dts) {
        dt.metrics = m;
    }

    let feeders: Vec<FeederMetrics> = {
        let view = &*model;
        view.feeders.iter().map(|f| feeder_metrics(view, f)).collect()
    };
    for (feeder, m) in model.feeders.iter_mut().zip(feeders) {
        feeder.metrics = m;
    }

    let regions: Vec<RegionMetrics> = {
        let view = &*model;
        view.regions.iter().map(|r| region_metrics(view, r)).collect()
    };
    for (region, m) in model.regions.iter_mut().zip(regions) {
        region.metrics = m;
    }
}

pub fn dt_metrics(model: &Model, dt: &Dt) -> DtMetrics {
    let consumed = sum_present(model.meters_of_dt(dt).map(|m| m.energy));
    DtMetrics {
        meters: dt.meters.len(),
        loss_dtc: loss_or_null(dt.energy, consumed),
    }
}

pub fn feeder_metrics(model: &Model, feeder: &Feeder) -> FeederMetrics {
    let dt_energy = sum_present(model.dts_of(feeder).map(|d| d.energy));
    let consumed = sum_present(model.meters_of_feeder(feeder).map(|m| m.energy));
    let loss_fc = loss_or_null(feeder.energy, consumed);
    FeederMetrics {
        dts: feeder.dts.len(),
        meters: feeder.meters.len(),
        loss_fdt: loss_or_null(feeder.energy, dt_energy),
        loss_dtc: loss_fc,
        loss_fc,
    }
}

pub fn region_metrics(model: &Model, region: &Region) -> RegionMetrics {
    let mut m = RegionMetrics {
        feeders: region.feeders.len(),
        ..Default::default()
    };

    let mut feeder_energy = Vec::new();
    let mut dt_energy = Vec::new();
    let mut dt_meter_energy = Vec::new();
    let mut feeder_meter_energy = Vec::new();

    for feeder in model.feeders_of(region) {
        m.dts += feeder.dts.len();
        m.meters += feeder.meters.len();
        m.communicating += usize::from(feeder.comm);
        m.non_communicating += usize::from(feeder.non_comm);
        feeder_energy.push(feeder.energy);

        for dt in model.dts_of(feeder) {
            m.communicating += usize::from(dt.comm);
            m.non_communicating += usize::from(dt.non_comm);
            m.unmapped += usize::from(dt.unmapped);
            m.never_comm += usize::from(dt.never_comm);
            dt_energy.push(dt.energy);
            dt_meter_energy.extend(model.meters_of_dt(dt).map(|meter| meter.energy));
        }

        for meter in model.meters_of_feeder(feeder) {
            m.communicating += usize::from(meter.comm);
            m.non_communicating += usize::from(meter.non_comm);
            m.unmapped += usize::from(meter.unmapped);
            m.never_comm += usize::from(meter.never_comm);
            feeder_meter_energy.push(meter.energy);
        }
    }

    let feeder_total = sum_present(feeder_energy);
    let dt_total = sum_present(dt_energy);
    m.loss_fdt = loss_or_null(feeder_total, dt_total);
    m.loss_dtc = loss_or_null(dt_total, sum_present(dt_meter_energy));
    m.loss_fc = loss_or_null(feeder_total, sum_present(feeder_meter_energy));
    m
}
