//! KPIs over the single-sheet meter register.
//!
//! Every function takes `now` explicitly so results are reproducible; the
//! CLI passes the local wall clock.
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tabled::Tabled;

use crate::normalize::{ColumnProfile, RegisterRecord};
use crate::types::{Cell, Row};
use crate::util::format_int;

/// Days without communication after which a meter counts as non-communicating.
pub const COMM_STALE_DAYS: f64 = 3.0;
/// Days since first communication after which a problem row counts as aging.
pub const AGING_DAYS: f64 = 30.0;
/// Days per timeline page.
pub const WEEK_LEN: usize = 7;

const EXCEL_EPOCH_OFFSET: f64 = 25569.0;
const UNKNOWN: &str = "Unknown";
const UNMAPPED: &str = "Unmapped";

/// Read the register rows through `profile`.
pub fn register_records<P: ColumnProfile + ?Sized>(profile: &P, rows: &[Row]) -> Vec<RegisterRecord> {
    rows.iter().map(|row| profile.register(row)).collect()
}

/// Parse a register date cell.
///
/// Numbers are Excel serial days. Text may be `dd-mm-yyyy`, `dd/mm/yyyy`,
/// `yyyy-mm-dd`, RFC 3339 or `yyyy-mm-dd HH:MM:SS`.
pub fn parse_date(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Number(serial) => {
            let ms = ((serial - EXCEL_EPOCH_OFFSET) * 86_400_000.0).round();
            if !ms.is_finite() || ms.abs() > 8.64e15 {
                return None;
            }
            DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|d| d.naive_utc())
        }
        Cell::Text(s) => parse_date_text(s.trim()),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    for fmt in ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn days_between(earlier: NaiveDateTime, now: NaiveDateTime) -> f64 {
    let d: Duration = now - earlier;
    d.num_milliseconds() as f64 / 86_400_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommStatus {
    Comm,
    NonComm,
    NeverComm,
}

/// Classify a `LastComm` cell.
///
/// Blank or unparseable values are non-communicating, anything mentioning
/// "never" is never-communicated, and a date older than three days is stale.
pub fn classify_comm(last_comm: &Cell, now: NaiveDateTime) -> CommStatus {
    let s = last_comm.to_key().trim().to_lowercase();
    if s.is_empty() {
        return CommStatus::NonComm;
    }
    if s.contains("never") {
        return CommStatus::NeverComm;
    }
    match parse_date(last_comm) {
        Some(d) if days_between(d, now) <= COMM_STALE_DAYS => CommStatus::Comm,
        _ => CommStatus::NonComm,
    }
}

/// Meter counts split by register meter type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeBreak {
    pub feeder: usize,
    pub dt: usize,
    pub wc: usize,
}

impl TypeBreak {
    fn count(&mut self, meter_type: &str) {
        match meter_type {
            "FEEDER" => self.feeder += 1,
            "DT" => self.dt += 1,
            "WC" => self.wc += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiTotals {
    pub installed_by_type: TypeBreak,
    pub installed: usize,
    pub l1: usize,
    pub l2: usize,
    pub mdm: usize,
    pub sap: usize,
    pub sat: usize,
    pub daily_energy: usize,
    pub comm: usize,
    pub non_comm: usize,
    pub never_comm: usize,
    pub total_meters: usize,
    /// Rows per region in first-seen order; unmapped rows land under "Unmapped".
    pub region_break: IndexMap<String, usize>,
    pub unmapped: usize,
    pub unmapped_by_type: TypeBreak,
    pub aging_non_comm: usize,
    pub aging_unmapped: usize,
}

fn pct1(part: i64, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

impl KpiTotals {
    /// `v` as a percentage of all register rows, one decimal.
    pub fn pct_total(&self, v: usize) -> f64 {
        pct1(v as i64, self.total_meters)
    }

    /// `v` as a percentage of installed (mapped) meters, one decimal.
    pub fn pct_installed(&self, v: i64) -> f64 {
        pct1(v, self.installed)
    }

    /// Installed meters not yet integrated in MDM. May be negative.
    pub fn gap_mdm(&self) -> i64 {
        self.installed as i64 - self.mdm as i64
    }

    pub fn gap_sap(&self) -> i64 {
        self.installed as i64 - self.sap as i64
    }

    /// Label/value pairs for display.
    pub fn tiles(&self) -> Vec<KpiTile> {
        let t = |v: usize| format!("{} ({:.1}%)", format_int(v), self.pct_total(v));
        let i = |v: i64| format!("{} ({:.1}%)", format_int(v), self.pct_installed(v));
        let regions = self
            .region_break
            .iter()
            .map(|(r, c)| format!("{r}: {}", t(*c)))
            .collect::<Vec<_>>()
            .join(", ");
        let by_type = self.installed_by_type;
        let unmapped = self.unmapped_by_type;
        vec![
            KpiTile::new("Total Meters", t(self.total_meters), regions),
            KpiTile::new(
                "Installed Meters",
                t(self.installed),
                format!(
                    "Feeder: {}, DT: {}, WC: {}",
                    i(by_type.feeder as i64),
                    i(by_type.dt as i64),
                    i(by_type.wc as i64)
                ),
            ),
            KpiTile::new("L1 / L2 Approved", format!("L1: {} | L2: {}", t(self.l1), t(self.l2)), ""),
            KpiTile::new("MDM / SAP", format!("MDM: {} | SAP: {}", t(self.mdm), t(self.sap)), ""),
            KpiTile::new("Daily Energy", t(self.daily_energy), ""),
            KpiTile::new("SAT", t(self.sat), ""),
            KpiTile::new(
                "GAP",
                format!("Installed-MDM: {}, Installed-SAP: {}", i(self.gap_mdm()), i(self.gap_sap())),
                "",
            ),
            KpiTile::new("Communicating", t(self.comm), ""),
            KpiTile::new("Non-Communicating", t(self.non_comm), ""),
            KpiTile::new("NeverComm", t(self.never_comm), ""),
            KpiTile::new(
                "Unmapped",
                t(self.unmapped),
                format!("Feeder: {}, DT: {}, WC: {}", unmapped.feeder, unmapped.dt, unmapped.wc),
            ),
            KpiTile::new(
                "Aging (>30d)",
                format!("Non-Comm: {} | Unmapped: {}", t(self.aging_non_comm), t(self.aging_unmapped)),
                "",
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct KpiTile {
    #[tabled(rename = "KPI")]
    pub label: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl KpiTile {
    fn new(label: &str, value: String, detail: impl Into<String>) -> Self {
        KpiTile {
            label: label.to_string(),
            value,
            detail: detail.into(),
        }
    }
}

/// Headline KPIs for the register.
pub fn kpi_totals(records: &[RegisterRecord], now: NaiveDateTime) -> KpiTotals {
    let mut t = KpiTotals::default();

    for r in records {
        let meter_type = r.meter_type.trim().to_uppercase();
        let region = r.region.trim();
        let is_unmapped = region.is_empty() || region.to_lowercase().contains("unmapped");
        let region_key = if is_unmapped { UNMAPPED } else { region };
        *t.region_break.entry(region_key.to_string()).or_default() += 1;

        if is_unmapped {
            t.unmapped_by_type.count(&meter_type);
        } else {
            t.installed_by_type.count(&meter_type);
        }

        t.l1 += usize::from(r.l1);
        t.l2 += usize::from(r.l2);
        t.mdm += usize::from(r.mdm);
        t.sap += usize::from(r.sap);
        t.sat += usize::from(r.sat);
        t.daily_energy += usize::from(r.daily_energy);

        let status = classify_comm(&r.last_comm, now);
        match status {
            CommStatus::Comm => t.comm += 1,
            CommStatus::NeverComm => t.never_comm += 1,
            CommStatus::NonComm => t.non_comm += 1,
        }

        let aged = parse_date(&r.first_comm).is_some_and(|d| days_between(d, now) > AGING_DAYS);
        if aged && status == CommStatus::NonComm {
            t.aging_non_comm += 1;
        }
        if aged && is_unmapped {
            t.aging_unmapped += 1;
        }
    }

    t.total_meters = t.region_break.values().sum();
    t.unmapped = t.region_break.get(UNMAPPED).copied().unwrap_or(0);
    t.installed = t.total_meters.saturating_sub(t.unmapped);
    t
}

/// Per-bucket tallies of the region summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommTally {
    pub total: usize,
    pub comm: usize,
    pub non_comm: usize,
    pub never_comm: usize,
    pub l1: usize,
    pub l2: usize,
    pub de: usize,
    pub mdm: usize,
    pub sap: usize,
    pub sat: usize,
}

impl CommTally {
    fn record(&mut self, r: &RegisterRecord, now: NaiveDateTime) {
        self.total += 1;
        match classify_comm(&r.last_comm, now) {
            CommStatus::Comm => self.comm += 1,
            CommStatus::NonComm => self.non_comm += 1,
            CommStatus::NeverComm => self.never_comm += 1,
        }
        self.l1 += usize::from(r.l1);
        self.l2 += usize::from(r.l2);
        self.de += usize::from(r.daily_energy);
        self.mdm += usize::from(r.mdm);
        self.sap += usize::from(r.sap);
        self.sat += usize::from(r.sat);
    }

    fn absorb(&mut self, o: &CommTally) {
        self.total += o.total;
        self.comm += o.comm;
        self.non_comm += o.non_comm;
        self.never_comm += o.never_comm;
        self.l1 += o.l1;
        self.l2 += o.l2;
        self.de += o.de;
        self.mdm += o.mdm;
        self.sap += o.sap;
        self.sat += o.sat;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediumBucket {
    pub medium: String,
    pub tally: CommTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeGroup {
    pub meter_type: String,
    pub mediums: Vec<MediumBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionGroup {
    pub region: String,
    pub types: Vec<TypeGroup>,
    pub totals: CommTally,
}

/// Region → meter type → comm medium breakdown, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegisterSummary {
    pub regions: Vec<RegionGroup>,
    pub grand_total: CommTally,
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct RegisterSummaryRow {
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Meter Type")]
    pub meter_type: String,
    #[tabled(rename = "Comm Medium")]
    pub medium: String,
    #[tabled(rename = "Total")]
    pub total: usize,
    #[tabled(rename = "Comm")]
    pub comm: usize,
    #[tabled(rename = "NonComm")]
    pub non_comm: usize,
    #[tabled(rename = "NeverComm")]
    pub never_comm: usize,
    #[tabled(rename = "L1")]
    pub l1: usize,
    #[tabled(rename = "L2")]
    pub l2: usize,
    #[tabled(rename = "DE")]
    pub de: usize,
    #[tabled(rename = "MDM")]
    pub mdm: usize,
    #[tabled(rename = "SAP")]
    pub sap: usize,
    #[tabled(rename = "SAT")]
    pub sat: usize,
}

impl RegisterSummaryRow {
    fn new(region: &str, meter_type: &str, medium: &str, t: &CommTally) -> Self {
        RegisterSummaryRow {
            region: region.to_string(),
            meter_type: meter_type.to_string(),
            medium: medium.to_string(),
            total: t.total,
            comm: t.comm,
            non_comm: t.non_comm,
            never_comm: t.never_comm,
            l1: t.l1,
            l2: t.l2,
            de: t.de,
            mdm: t.mdm,
            sap: t.sap,
            sat: t.sat,
        }
    }
}

impl RegisterSummary {
    /// Flatten into table rows: every bucket, a "Total" row after each region
    /// and a final "Grand Total".
    pub fn rows(&self) -> Vec<RegisterSummaryRow> {
        let mut out = Vec::new();
        for region in &self.regions {
            for group in &region.types {
                for bucket in &group.mediums {
                    out.push(RegisterSummaryRow::new(
                        &region.region,
                        &group.meter_type,
                        &bucket.medium,
                        &bucket.tally,
                    ));
                }
            }
            out.push(RegisterSummaryRow::new(&region.region, "Total", "", &region.totals));
        }
        out.push(RegisterSummaryRow::new("Grand Total", "", "", &self.grand_total));
        out
    }
}

fn or_unknown(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        UNKNOWN.to_string()
    } else {
        s.to_string()
    }
}

pub fn summarize(records: &[RegisterRecord], now: NaiveDateTime) -> RegisterSummary {
    let mut tree: IndexMap<String, IndexMap<String, IndexMap<String, CommTally>>> = IndexMap::new();
    for r in records {
        tree.entry(or_unknown(&r.region))
            .or_default()
            .entry(or_unknown(&r.meter_type))
            .or_default()
            .entry(or_unknown(&r.comm_medium))
            .or_default()
            .record(r, now);
    }

    let mut summary = RegisterSummary::default();
    for (region, types) in tree {
        let mut totals = CommTally::default();
        let types = types
            .into_iter()
            .map(|(meter_type, mediums)| TypeGroup {
                meter_type,
                mediums: mediums
                    .into_iter()
                    .map(|(medium, tally)| {
                        totals.absorb(&tally);
                        MediumBucket { medium, tally }
                    })
                    .collect(),
            })
            .collect();
        summary.grand_total.absorb(&totals);
        summary.regions.push(RegionGroup { region, types, totals });
    }
    summary
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Tabled)]
pub struct DayCount {
    #[tabled(rename = "Day")]
    pub day: NaiveDate,
    #[tabled(rename = "Installations")]
    pub installs: usize,
    #[tabled(rename = "First Comm")]
    pub first_comms: usize,
}

/// Daily installation and first-communication counts, browsed a week at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    days: Vec<DayCount>,
    week: usize,
}

impl Timeline {
    /// Collect per-day counts. Only days with at least one event appear;
    /// the cursor starts on the last week.
    pub fn from_records(records: &[RegisterRecord]) -> Self {
        let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
        for r in records {
            if let Some(d) = parse_date(&r.installation_date) {
                days.entry(d.date()).or_default().0 += 1;
            }
            if let Some(d) = parse_date(&r.first_comm) {
                days.entry(d.date()).or_default().1 += 1;
            }
        }
        let days: Vec<DayCount> = days
            .into_iter()
            .map(|(day, (installs, first_comms))| DayCount {
                day,
                installs,
                first_comms,
            })
            .collect();
        let week = days.len().saturating_sub(1) / WEEK_LEN;
        Timeline { days, week }
    }

    pub fn days(&self) -> &[DayCount] {
        &self.days
    }

    pub fn week_index(&self) -> usize {
        self.week
    }

    pub fn week_count(&self) -> usize {
        self.days.len().div_ceil(WEEK_LEN)
    }

    /// The days of the current week.
    pub fn current_week(&self) -> &[DayCount] {
        let start = (self.week * WEEK_LEN).min(self.days.len());
        let end = (start + WEEK_LEN).min(self.days.len());
        &self.days[start..end]
    }

    /// Step back one week; false when already at the first.
    pub fn prev_week(&mut self) -> bool {
        if self.week == 0 {
            return false;
        }
        self.week -= 1;
        true
    }

    pub fn next_week(&mut self) -> bool {
        if (self.week + 1) * WEEK_LEN >= self.days.len() {
            return false;
        }
        self.week += 1;
        true
    }
}
