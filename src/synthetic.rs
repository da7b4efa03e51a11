//! Deterministic stand-in dataset used when the real workbook cannot be
//! loaded.
//!
//! The generated sheets use the same column names as a real export, so they
//! go through the regular builder.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::loader::{Workbook, DTS_SHEET, FEEDERS_SHEET, METERS_SHEET};
use crate::types::{row, Cell, Row};
use crate::util::round2;

pub const REGIONS: usize = 3;
pub const FEEDERS_PER_REGION: usize = 5;
pub const DTS_PER_FEEDER: usize = 4;
pub const METERS_PER_DT: usize = 10;

fn flag(rng: &mut StdRng, p: f64) -> Cell {
    Cell::from(if rng.gen_bool(p) { "Yes" } else { "No" })
}

/// Start/end readings around `energy` with a random register offset.
fn readings(rng: &mut StdRng, energy: f64) -> (Cell, Cell) {
    let day1 = f64::from(rng.gen_range(1_000u32..50_000));
    (Cell::Number(day1), Cell::Number(round2(day1 + energy)))
}

/// Generate the three-sheet workbook for `seed`.
///
/// Every DT reads a few percent more than its meters and every feeder a few
/// percent more than its DTs, so losses land in a plausible range.
pub fn workbook(seed: u64) -> Workbook {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut feeders: Vec<Row> = Vec::new();
    let mut dts: Vec<Row> = Vec::new();
    let mut meters: Vec<Row> = Vec::new();
    let (mut feeder_no, mut dt_no, mut meter_no) = (0usize, 0usize, 0usize);

    for r in 1..=REGIONS {
        let region = format!("Region {r}");
        for _ in 0..FEEDERS_PER_REGION {
            feeder_no += 1;
            let feeder_id = format!("F{feeder_no}");
            let mut feeder_energy = 0.0;

            for _ in 0..DTS_PER_FEEDER {
                dt_no += 1;
                let dt_id = format!("DT{dt_no}");
                let mut dt_energy = 0.0;

                for _ in 0..METERS_PER_DT {
                    meter_no += 1;
                    let day1 = f64::from(100 + rng.gen_range(0u32..900));
                    let day2 = day1 + f64::from(rng.gen_range(0u32..20));
                    dt_energy += day2 - day1;
                    meters.push(row([
                        ("Meter No.", Cell::from(format!("M{meter_no}"))),
                        ("Feeder Code", Cell::from(feeder_id.as_str())),
                        ("DT Code", Cell::from(dt_id.as_str())),
                        ("Meter Day1 Reading", Cell::Number(day1)),
                        ("Meter Day2 Reading", Cell::Number(day2)),
                        ("Comm", flag(&mut rng, 0.4)),
                        ("NonComm", flag(&mut rng, 0.3)),
                        ("Unmapped", flag(&mut rng, 0.1)),
                        ("NeverComm", flag(&mut rng, 0.2)),
                    ]));
                }

                let dt_energy = round2(dt_energy * rng.gen_range(1.0..1.08));
                feeder_energy += dt_energy;
                let (day1, day2) = readings(&mut rng, dt_energy);
                dts.push(row([
                    ("Region Name", Cell::from(region.as_str())),
                    ("Feeder Code", Cell::from(feeder_id.as_str())),
                    ("DT Code", Cell::from(dt_id.as_str())),
                    ("DT Name", Cell::from(dt_id.as_str())),
                    ("DT Day1 Reading", day1),
                    ("DT Day2 Reading", day2),
                    ("MF DT", Cell::Number(1.0)),
                    ("Comm", flag(&mut rng, 0.4)),
                    ("NonComm", flag(&mut rng, 0.3)),
                    ("Unmapped", flag(&mut rng, 0.1)),
                    ("NeverComm", flag(&mut rng, 0.2)),
                ]));
            }

            let feeder_energy = round2(feeder_energy * rng.gen_range(1.0..1.05));
            let (day1, day2) = readings(&mut rng, feeder_energy);
            feeders.push(row([
                ("Region Name", Cell::from(region.as_str())),
                ("Feeder Code", Cell::from(feeder_id.as_str())),
                ("Feeder Name", Cell::from(feeder_id.as_str())),
                ("Feeder Day1 reading", day1),
                ("Feeder Day2 reading", day2),
                ("MF Feeder", Cell::Number(1.0)),
                ("Comm", flag(&mut rng, 0.4)),
                ("NonComm", flag(&mut rng, 0.3)),
            ]));
        }
    }

    Workbook::default()
        .with_sheet(FEEDERS_SHEET, feeders)
        .with_sheet(DTS_SHEET, dts)
        .with_sheet(METERS_SHEET, meters)
}
