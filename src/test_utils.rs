//! Row builders shared by the unit tests.

use crate::types::{row, Cell, Row};

fn yes_no(flag: bool) -> Cell {
    Cell::from(if flag { "Yes" } else { "No" })
}

pub(crate) fn feeder_row(region: &str, id: &str, day1: f64, day2: f64, mf: f64) -> Row {
    row([
        ("Region Name", Cell::from(region)),
        ("Feeder Code", Cell::from(id)),
        ("Feeder Name", Cell::from(format!("{id} line"))),
        ("Feeder Day1 reading", Cell::Number(day1)),
        ("Feeder Day2 reading", Cell::Number(day2)),
        ("MF Feeder", Cell::Number(mf)),
        ("Comm", yes_no(false)),
        ("NonComm", yes_no(false)),
    ])
}

pub(crate) fn dt_row(region: &str, feeder: &str, id: &str, day1: f64, day2: f64) -> Row {
    row([
        ("Region Name", Cell::from(region)),
        ("Feeder Code", Cell::from(feeder)),
        ("DT Code", Cell::from(id)),
        ("DT Name", Cell::from(format!("{id} sub"))),
        ("DT Day1 Reading", Cell::Number(day1)),
        ("DT Day2 Reading", Cell::Number(day2)),
        ("MF DT", Cell::Number(1.0)),
        ("Comm", yes_no(false)),
        ("NonComm", yes_no(false)),
        ("Unmapped", yes_no(false)),
        ("NeverComm", yes_no(false)),
    ])
}

pub(crate) fn meter_row(feeder: &str, dt: &str, id: &str, day1: f64, day2: f64) -> Row {
    row([
        ("Meter No.", Cell::from(id)),
        ("Feeder Code", Cell::from(feeder)),
        ("DT Code", Cell::from(dt)),
        ("Meter Day1 Reading", Cell::Number(day1)),
        ("Meter Day2 Reading", Cell::Number(day2)),
        ("Comm", yes_no(false)),
        ("NonComm", yes_no(false)),
        ("Unmapped", yes_no(false)),
        ("NeverComm", yes_no(false)),
    ])
}

/// Overwrite one column of a row.
pub(crate) fn with(mut r: Row, column: &str, value: impl Into<Cell>) -> Row {
    r.insert(column.to_string(), value.into());
    r
}

/// Two regions, three feeders, five DTs and seven meters.
///
/// ```text
/// North ── F1 (1000) ── DT1 (600) ── M1 (290), M2 (300)
///       │            └─ DT2 (380) ── M3 (370)
///       └─ F2 (0)    ── DT3 (50)  ── M4 (45)
/// South ── F3 (200)  ── DT4 (190) ── M5 (100), M6 (unmapped, 80)
/// DT9 points at the missing F9; M7 hangs off DT9 only
/// ```
pub(crate) fn sample_sheets() -> (Vec<Row>, Vec<Row>, Vec<Row>) {
    let feeders = vec![
        with(feeder_row("North", "F1", 0.0, 500.0, 2.0), "Comm", "Yes"),
        with(feeder_row("North", "F2", 10.0, 10.0, 1.0), "NonComm", "Yes"),
        feeder_row("South", "F3", 100.0, 300.0, 1.0),
    ];
    let dts = vec![
        with(dt_row("North", "F1", "DT1", 0.0, 600.0), "Comm", "Yes"),
        dt_row("North", "F1", "DT2", 20.0, 400.0),
        with(dt_row("North", "F2", "DT3", 0.0, 50.0), "NeverComm", "Yes"),
        with(dt_row("South", "F3", "DT4", 10.0, 200.0), "Unmapped", "Yes"),
        dt_row("Nowhere", "F9", "DT9", 0.0, 70.0),
    ];
    let meters = vec![
        with(meter_row("F1", "DT1", "M1", 10.0, 300.0), "Comm", "Yes"),
        with(meter_row("F1", "DT1", "M2", 0.0, 300.0), "NonComm", "Yes"),
        meter_row("F1", "DT2", "M3", 30.0, 400.0),
        with(meter_row("F2", "DT3", "M4", 5.0, 50.0), "NeverComm", "Yes"),
        meter_row("F3", "DT4", "M5", 0.0, 100.0),
        with(
            with(meter_row("F3", "DT4", "M6", 0.0, 80.0), "Unmapped", "Yes"),
            "Comm",
            "Yes",
        ),
        meter_row("F9", "DT9", "M7", 0.0, 60.0),
    ];
    (feeders, dts, meters)
}
