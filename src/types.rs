use indexmap::IndexMap;
use serde::Serialize;
use tabled::Tabled;

/// A raw spreadsheet cell as handed over by a workbook reader.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Whether the cell holds something other than whitespace.
    pub fn is_present(&self) -> bool {
        match self {
            Cell::Empty => false,
            Cell::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }

    /// Render the cell the way it would appear as a string key.
    ///
    /// Integral numbers drop their fractional part so that a numeric `101`
    /// and the text `"101"` address the same entity.
    pub fn to_key(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s),
            // Nested structures never come out of a sheet; keep their text form.
            other => Cell::Text(other.to_string()),
        }
    }
}

/// One spreadsheet row: column label to cell, in sheet column order.
pub type Row = IndexMap<String, Cell>;

/// Build a [`Row`] from `(column, cell)` pairs.
pub fn row<K, V, I>(cells: I) -> Row
where
    K: Into<String>,
    V: Into<Cell>,
    I: IntoIterator<Item = (K, V)>,
{
    cells
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionMetrics {
    pub feeders: usize,
    pub dts: usize,
    pub meters: usize,
    pub communicating: usize,
    pub non_communicating: usize,
    pub unmapped: usize,
    pub never_comm: usize,
    pub loss_fdt: Option<f64>,
    pub loss_dtc: Option<f64>,
    pub loss_fc: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeederMetrics {
    pub dts: usize,
    pub meters: usize,
    pub loss_fdt: Option<f64>,
    pub loss_dtc: Option<f64>,
    pub loss_fc: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DtMetrics {
    pub meters: usize,
    pub loss_dtc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub(crate) feeders: Vec<usize>,
    pub metrics: RegionMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feeder {
    pub id: String,
    pub name: String,
    pub region: String,
    pub day1: Option<f64>,
    pub day2: Option<f64>,
    pub multiplier: f64,
    pub energy: Option<f64>,
    pub comm: bool,
    pub non_comm: bool,
    pub(crate) dts: Vec<usize>,
    pub(crate) meters: Vec<usize>,
    pub metrics: FeederMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dt {
    pub id: String,
    pub name: String,
    pub region: String,
    pub feeder_id: String,
    pub day1: Option<f64>,
    pub day2: Option<f64>,
    pub multiplier: f64,
    pub energy: Option<f64>,
    pub comm: bool,
    pub non_comm: bool,
    pub unmapped: bool,
    pub never_comm: bool,
    pub(crate) meters: Vec<usize>,
    pub metrics: DtMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Meter {
    pub id: String,
    pub feeder_id: String,
    pub dt_id: String,
    pub day1: Option<f64>,
    pub day2: Option<f64>,
    pub energy: Option<f64>,
    pub comm: bool,
    pub non_comm: bool,
    pub unmapped: bool,
    pub never_comm: bool,
}

/// Dataset-wide SLA flag counts over every row of every sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlaCounters {
    pub total_rows: usize,
    pub comm: usize,
    pub non_comm: usize,
    pub unmapped: usize,
    pub never_comm: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalTotals {
    pub feeders: usize,
    pub dts: usize,
    pub meters: usize,
    pub loss_fdt: Option<f64>,
    pub loss_dtc: Option<f64>,
    pub loss_fc: Option<f64>,
    pub communicating: usize,
    pub communicating_pct: f64,
    pub non_communicating: usize,
    pub non_communicating_pct: f64,
    pub unmapped: usize,
    pub unmapped_pct: f64,
    pub never_comm: usize,
    pub never_comm_pct: f64,
}

/// One line of the flat feeder/DT loss listing.
///
/// Feeder lines leave the DT columns blank and DT lines leave the feeder
/// energy columns blank.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ResultRow {
    #[serde(rename = "Feeder_Code")]
    #[tabled(rename = "Feeder_Code")]
    pub feeder_code: String,
    #[serde(rename = "Feeder_E")]
    #[tabled(rename = "Feeder_E", display_with = "display_num")]
    pub feeder_energy: Option<f64>,
    #[serde(rename = "Sum_DT_E")]
    #[tabled(rename = "Sum_DT_E", display_with = "display_num")]
    pub sum_dt_energy: Option<f64>,
    #[serde(rename = "Feeder_to_DT_Loss")]
    #[tabled(rename = "Feeder_to_DT_Loss", display_with = "display_pct")]
    pub feeder_to_dt_loss: Option<f64>,
    #[serde(rename = "Sum_Cons_E")]
    #[tabled(rename = "Sum_Cons_E", display_with = "display_num")]
    pub sum_cons_energy: Option<f64>,
    #[serde(rename = "Feeder_to_Cons_Loss")]
    #[tabled(rename = "Feeder_to_Cons_Loss", display_with = "display_pct")]
    pub feeder_to_cons_loss: Option<f64>,
    #[serde(rename = "DT_Code")]
    #[tabled(rename = "DT_Code")]
    pub dt_code: String,
    #[serde(rename = "DT_E")]
    #[tabled(rename = "DT_E", display_with = "display_num")]
    pub dt_energy: Option<f64>,
    #[serde(rename = "Sum_Cons_E_for_DT")]
    #[tabled(rename = "Sum_Cons_E_for_DT", display_with = "display_num")]
    pub sum_cons_energy_for_dt: Option<f64>,
    #[serde(rename = "DT_to_Cons_Loss")]
    #[tabled(rename = "DT_to_Cons_Loss", display_with = "display_pct")]
    pub dt_to_cons_loss: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionSummaryRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Feeders")]
    #[tabled(rename = "Feeders")]
    pub feeders: usize,
    #[serde(rename = "DTs")]
    #[tabled(rename = "DTs")]
    pub dts: usize,
    #[serde(rename = "Meters")]
    #[tabled(rename = "Meters")]
    pub meters: usize,
    #[serde(rename = "Comm")]
    #[tabled(rename = "Comm")]
    pub comm: usize,
    #[serde(rename = "NonComm")]
    #[tabled(rename = "NonComm")]
    pub non_comm: usize,
    #[serde(rename = "NeverComm")]
    #[tabled(rename = "NeverComm")]
    pub never_comm: usize,
    #[serde(rename = "FeederToDtLoss")]
    #[tabled(rename = "F→DT Loss%")]
    pub loss_fdt: String,
    #[serde(rename = "DtToConsLoss")]
    #[tabled(rename = "DT→Cons Loss%")]
    pub loss_dtc: String,
    #[serde(rename = "FeederToConsLoss")]
    #[tabled(rename = "F→Cons Loss%")]
    pub loss_fc: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FeederSummaryRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Feeder")]
    #[tabled(rename = "Feeder")]
    pub feeder: String,
    #[serde(rename = "DTs")]
    #[tabled(rename = "DTs")]
    pub dts: usize,
    #[serde(rename = "Meters")]
    #[tabled(rename = "Meters")]
    pub meters: usize,
    #[serde(rename = "FeederToDtLoss")]
    #[tabled(rename = "F→DT Loss%")]
    pub loss_fdt: String,
    #[serde(rename = "FeederToConsLoss")]
    #[tabled(rename = "F→Cons Loss%")]
    pub loss_fc: String,
    #[serde(rename = "Band")]
    #[tabled(rename = "Band")]
    pub band: String,
}

fn display_num(v: &Option<f64>) -> String {
    crate::util::num_or_dash(*v)
}

fn display_pct(v: &Option<f64>) -> String {
    crate::util::pct_or_dash(*v)
}
