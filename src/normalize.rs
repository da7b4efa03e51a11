//! Row normalization.
//!
//! A [`ColumnProfile`] decides which column a logical [`Field`] is read from.
//! Two profiles exist and are picked per call site:
//!
//! - [`Strict`] reads exactly one, case-sensitive column name per field. The
//!   hierarchy sheets are always read this way.
//! - [`AliasTolerant`] tries a list of known spellings in order and takes the
//!   first one holding a non-blank value. The meter register KPIs use it.
//!
//! Both produce the same typed records, and neither fails: missing columns
//! and unparseable cells become `None` / `false`.
use crate::types::{Cell, Row};
use crate::util::{is_affirmative, multiplier_or_one, number_or_null, parse_yes_no};

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RegionName,
    FeederCode,
    FeederName,
    FeederDay1,
    FeederDay2,
    FeederMf,
    DtCode,
    DtName,
    DtDay1,
    DtDay2,
    DtMf,
    MeterNo,
    MeterDay1,
    MeterDay2,
    Comm,
    NonComm,
    Unmapped,
    NeverComm,
    MeterType,
    CommMedium,
    LastComm,
    FirstComm,
    InstallationDate,
    L1,
    L2,
    Mdm,
    Sap,
    Sat,
    DailyEnergy,
}

impl Field {
    /// The exact column header in the three-sheet workbook / meter register.
    pub fn column(self) -> &'static str {
        match self {
            Field::RegionName => "Region Name",
            Field::FeederCode => "Feeder Code",
            Field::FeederName => "Feeder Name",
            Field::FeederDay1 => "Feeder Day1 reading",
            Field::FeederDay2 => "Feeder Day2 reading",
            Field::FeederMf => "MF Feeder",
            Field::DtCode => "DT Code",
            Field::DtName => "DT Name",
            Field::DtDay1 => "DT Day1 Reading",
            Field::DtDay2 => "DT Day2 Reading",
            Field::DtMf => "MF DT",
            Field::MeterNo => "Meter No.",
            Field::MeterDay1 => "Meter Day1 Reading",
            Field::MeterDay2 => "Meter Day2 Reading",
            Field::Comm => "Comm",
            Field::NonComm => "NonComm",
            Field::Unmapped => "Unmapped",
            Field::NeverComm => "NeverComm",
            Field::MeterType => "Meter Type",
            Field::CommMedium => "Comm Medium",
            Field::LastComm => "LastComm",
            Field::FirstComm => "First Comm",
            Field::InstallationDate => "Installation Date",
            Field::L1 => "L1",
            Field::L2 => "L2",
            Field::Mdm => "MDM",
            Field::Sap => "SAP",
            Field::Sat => "SAT",
            Field::DailyEnergy => "Daily Energy",
        }
    }

    /// Accepted spellings, most specific first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::RegionName => &["Region Name", "RegionName", "Region"],
            Field::FeederCode => &["Feeder Code", "FeederCode", "FeederId", "Feeder"],
            Field::FeederName => &["Feeder Name", "FeederName"],
            Field::FeederDay1 => &["Feeder Day1 reading", "Feeder Day1 Reading", "FeederDay1"],
            Field::FeederDay2 => &["Feeder Day2 reading", "Feeder Day2 Reading", "FeederDay2"],
            Field::FeederMf => &["MF Feeder", "Feeder MF", "MFFeeder"],
            Field::DtCode => &["DT Code", "DTCode", "DTId", "DT"],
            Field::DtName => &["DT Name", "DTName"],
            Field::DtDay1 => &["DT Day1 Reading", "DT Day1 reading", "DTDay1"],
            Field::DtDay2 => &["DT Day2 Reading", "DT Day2 reading", "DTDay2"],
            Field::DtMf => &["MF DT", "DT MF", "MFDT"],
            Field::MeterNo => &["Meter No.", "Meter No", "MeterNo", "MeterId", "WC"],
            Field::MeterDay1 => &["Meter Day1 Reading", "Meter Day1 reading", "Day1"],
            Field::MeterDay2 => &["Meter Day2 Reading", "Meter Day2 reading", "Day2"],
            Field::Comm => &["Comm"],
            Field::NonComm => &["NonComm", "Non Comm"],
            Field::Unmapped => &["Unmapped"],
            Field::NeverComm => &["NeverComm", "Never Comm"],
            Field::MeterType => &["Meter Type", "MeterType", "Type"],
            Field::CommMedium => &["Comm Medium", "CommMedium", "Comm"],
            Field::LastComm => &[
                "LastComm",
                "Last Comm",
                "Last Communication",
                "Last Communication Date",
            ],
            Field::FirstComm => &["First Comm", "FirstComm", "First Communication"],
            Field::InstallationDate => &["Installation Date", "InstallationDate", "Installed On"],
            Field::L1 => &["L1", "L1Approved", "L1 Approved", "L1 Status"],
            Field::L2 => &["L2", "L2Approved", "L2 Approved", "L2 Status"],
            Field::Mdm => &["MDM"],
            Field::Sap => &["SAP"],
            Field::Sat => &["SAT"],
            Field::DailyEnergy => &["Daily Energy", "DE", "DailyEnergy"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeederRecord {
    pub region: String,
    pub id: String,
    pub name: String,
    pub day1: Option<f64>,
    pub day2: Option<f64>,
    pub multiplier: f64,
    pub comm: bool,
    pub non_comm: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DtRecord {
    pub region: String,
    pub feeder_id: String,
    pub id: String,
    pub name: String,
    pub day1: Option<f64>,
    pub day2: Option<f64>,
    pub multiplier: f64,
    pub comm: bool,
    pub non_comm: bool,
    pub unmapped: bool,
    pub never_comm: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterRecord {
    pub id: String,
    pub feeder_id: String,
    pub dt_id: String,
    pub day1: Option<f64>,
    pub day2: Option<f64>,
    pub comm: bool,
    pub non_comm: bool,
    pub unmapped: bool,
    pub never_comm: bool,
}

/// A row of the single-sheet meter register.
///
/// Text fields are kept raw (untrimmed, `""` when absent); the KPI code owns
/// the blank/unknown conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRecord {
    pub region: String,
    pub meter_type: String,
    pub comm_medium: String,
    pub last_comm: Cell,
    pub first_comm: Cell,
    pub installation_date: Cell,
    pub l1: bool,
    pub l2: bool,
    pub mdm: bool,
    pub sap: bool,
    pub sat: bool,
    pub daily_energy: bool,
}

/// Strategy for locating a logical field inside a raw row.
pub trait ColumnProfile {
    /// The cell holding `field`, or an empty cell when the row has none.
    fn cell<'r>(&self, row: &'r Row, field: Field) -> &'r Cell;

    fn text(&self, row: &Row, field: Field) -> String {
        self.cell(row, field).to_key()
    }

    fn number(&self, row: &Row, field: Field) -> Option<f64> {
        number_or_null(self.cell(row, field))
    }

    fn flag(&self, row: &Row, field: Field) -> bool {
        parse_yes_no(self.cell(row, field))
    }

    fn feeder(&self, row: &Row) -> FeederRecord {
        FeederRecord {
            region: self.text(row, Field::RegionName),
            id: self.text(row, Field::FeederCode),
            name: self.text(row, Field::FeederName),
            day1: self.number(row, Field::FeederDay1),
            day2: self.number(row, Field::FeederDay2),
            multiplier: multiplier_or_one(self.cell(row, Field::FeederMf)),
            comm: self.flag(row, Field::Comm),
            non_comm: self.flag(row, Field::NonComm),
        }
    }

    fn dt(&self, row: &Row) -> DtRecord {
        DtRecord {
            region: self.text(row, Field::RegionName),
            feeder_id: self.text(row, Field::FeederCode),
            id: self.text(row, Field::DtCode),
            name: self.text(row, Field::DtName),
            day1: self.number(row, Field::DtDay1),
            day2: self.number(row, Field::DtDay2),
            multiplier: multiplier_or_one(self.cell(row, Field::DtMf)),
            comm: self.flag(row, Field::Comm),
            non_comm: self.flag(row, Field::NonComm),
            unmapped: self.flag(row, Field::Unmapped),
            never_comm: self.flag(row, Field::NeverComm),
        }
    }

    fn meter(&self, row: &Row) -> MeterRecord {
        MeterRecord {
            id: self.text(row, Field::MeterNo),
            feeder_id: self.text(row, Field::FeederCode),
            dt_id: self.text(row, Field::DtCode),
            day1: self.number(row, Field::MeterDay1),
            day2: self.number(row, Field::MeterDay2),
            comm: self.flag(row, Field::Comm),
            non_comm: self.flag(row, Field::NonComm),
            unmapped: self.flag(row, Field::Unmapped),
            never_comm: self.flag(row, Field::NeverComm),
        }
    }

    fn register(&self, row: &Row) -> RegisterRecord {
        let approved = |field| is_affirmative(self.cell(row, field));
        RegisterRecord {
            region: self.text(row, Field::RegionName),
            meter_type: self.text(row, Field::MeterType),
            comm_medium: self.text(row, Field::CommMedium),
            last_comm: self.cell(row, Field::LastComm).clone(),
            first_comm: self.cell(row, Field::FirstComm).clone(),
            installation_date: self.cell(row, Field::InstallationDate).clone(),
            l1: approved(Field::L1),
            l2: approved(Field::L2),
            mdm: approved(Field::Mdm),
            sap: approved(Field::Sap),
            sat: approved(Field::Sat),
            daily_energy: approved(Field::DailyEnergy),
        }
    }
}

/// Exact, case-sensitive column names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl ColumnProfile for Strict {
    fn cell<'r>(&self, row: &'r Row, field: Field) -> &'r Cell {
        row.get(field.column()).unwrap_or(&EMPTY_CELL)
    }
}

/// First alias with a non-blank value wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasTolerant;

impl ColumnProfile for AliasTolerant {
    fn cell<'r>(&self, row: &'r Row, field: Field) -> &'r Cell {
        field
            .aliases()
            .iter()
            .filter_map(|name| row.get(*name))
            .find(|cell| cell.is_present())
            .unwrap_or(&EMPTY_CELL)
    }
}
