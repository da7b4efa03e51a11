use std::fs;
use std::path::Path;

use feeder_loss_report::loader::CsvWorkbook;
use feeder_loss_report::reports::{self, RESULTS_FILE, SUMMARY_FILE};
use feeder_loss_report::{BuildConfig, Dashboard, DataOrigin, DuplicatePolicy, Level};

fn write_sheets(dir: &Path, feeders: &str, dts: &str, meters: &str) {
    fs::write(dir.join("Feeders.csv"), feeders).unwrap();
    fs::write(dir.join("DTs.csv"), dts).unwrap();
    fs::write(dir.join("Meters.csv"), meters).unwrap();
}

const FEEDERS: &str = "\
Region Name,Feeder Code,Feeder Name,Feeder Day1 reading,Feeder Day2 reading,MF Feeder,Comm,NonComm
North,F1,Alpha,0,100,10,Yes,No
North,F2,Beta,50,50,,No,Yes
South,F3,Gamma,0,400,abc,Yes,
";

const DTS: &str = "\
Region Name,Feeder Code,DT Code,DT Name,DT Day1 Reading,DT Day2 Reading,MF DT,Comm,NonComm,Unmapped,NeverComm
North,F1,DT1,One,0,950,1,Yes,No,No,No
South,F3,DT3,Three,0,380,,No,No,No,Yes
South,F404,DT4,Lost,0,10,1,No,No,No,No
";

const METERS: &str = "\
Meter No.,Feeder Code,DT Code,Meter Day1 Reading,Meter Day2 Reading,Comm,NonComm,Unmapped,NeverComm
M1,F1,DT1,0,900,Yes,No,No,No
M2,F1,DT1,10,5,No,Yes,No,No
M3,F3,DT3,0,300,Yes,No,Yes,No
M4,F3,DT3,,50,No,No,No,Yes
";

#[test]
fn loads_csv_directory_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), FEEDERS, DTS, METERS);

    let mut dash = Dashboard::default();
    let outcome = dash.load(&CsvWorkbook::new(dir.path()));
    assert!(matches!(outcome.origin, DataOrigin::Workbook(_)));
    assert_eq!(outcome.report.orphan_dts, 1);
    assert_eq!(outcome.report.unmapped_meters, 1);

    let names: Vec<_> = dash.regions().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["North", "South"]);

    let f1 = dash.feeder("F1").unwrap();
    assert_eq!(f1.energy, Some(1000.0));
    assert_eq!(f1.metrics.loss_fdt, Some(5.0));
    assert_eq!(f1.metrics.loss_fc, Some(10.0));
    // Blank MF reads as 1, so equal readings give zero energy and no loss.
    assert_eq!(dash.feeder("F2").unwrap().energy, Some(0.0));
    assert_eq!(dash.feeder("F2").unwrap().metrics.loss_fdt, None);
    assert_eq!(dash.meter("M2").unwrap().energy, Some(0.0));
    assert_eq!(dash.meter("M4").unwrap().energy, None);

    let dt3 = dash.dt("DT3").unwrap();
    assert_eq!(dt3.metrics.meters, 1);
    // M3 is unmapped and M4 has no energy, so nothing is consumed below DT3.
    assert_eq!(dt3.metrics.loss_dtc, Some(100.0));

    let totals = dash.global_totals();
    assert_eq!((totals.feeders, totals.dts, totals.meters), (3, 3, 4));
    assert_eq!(totals.communicating, 5);
    assert_eq!(totals.communicating_pct, 50.0);

    let hit = dash.find_by_identifier(" DT4 ").unwrap();
    assert_eq!(hit.level, Level::Dt);
    assert!(dash.select(Level::Dt, Some("DT4")).is_ok());
}

#[test]
fn missing_workbook_falls_back_to_synthetic() {
    let dir = tempfile::tempdir().unwrap();
    let mut dash = Dashboard::new(BuildConfig::default(), 11);
    let outcome = dash.load_path(&dir.path().join("does_not_exist"));

    assert!(outcome.is_fallback());
    assert_eq!(dash.global_totals().feeders, 15);
    assert_eq!(dash.global_totals().dts, 60);
    assert_eq!(dash.global_totals().meters, 600);

    let mut again = Dashboard::new(BuildConfig::default(), 11);
    again.load_synthetic("repeat");
    assert_eq!(dash.flatten_results_table(), again.flatten_results_table());
}

#[test]
fn unreadable_json_falls_back_without_mixing_data() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), FEEDERS, DTS, METERS);
    let mut dash = Dashboard::default();
    dash.load(&CsvWorkbook::new(dir.path()));
    assert!(dash.feeder("F1").is_some());

    let bad = dir.path().join("book.json");
    fs::write(&bad, "{\"Feeders\": [").unwrap();
    let outcome = dash.load_path(&bad);
    assert!(outcome.is_fallback());
    assert!(dash.region("North").is_none());
    assert!(dash.feeder("F404").is_none());
    assert!(dash.meter("M600").is_some());
}

#[test]
fn rebuild_leaves_nothing_from_the_previous_load() {
    let first = tempfile::tempdir().unwrap();
    write_sheets(first.path(), FEEDERS, DTS, METERS);
    let second = tempfile::tempdir().unwrap();
    write_sheets(
        second.path(),
        "Region Name,Feeder Code,Feeder Day1 reading,Feeder Day2 reading\nEast,F9,0,10\n",
        "Feeder Code,DT Code\nF9,DT9\n",
        "Meter No.,Feeder Code,DT Code\nM9,F9,DT9\n",
    );

    let mut dash = Dashboard::default();
    dash.load(&CsvWorkbook::new(first.path()));
    dash.select(Level::Feeder, Some("F1")).unwrap();
    dash.load(&CsvWorkbook::new(second.path()));

    for id in ["F1", "F2", "F3", "DT1", "DT3", "DT4", "M1", "M2", "M3", "M4", "North", "South"] {
        assert_eq!(dash.find_by_identifier(id), None, "{id} survived the reload");
    }
    assert_eq!(dash.selection().level, Level::All);
    let names: Vec<_> = dash.regions().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["East"]);
    assert_eq!(dash.global_totals().meters, 1);
}

#[test]
fn json_workbook_and_keep_first_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.json");
    fs::write(
        &path,
        r#"{
            "Feeders": [
                {"Region Name": "West", "Feeder Code": 7, "Feeder Day1 reading": 0, "Feeder Day2 reading": 100, "Comm": true},
                {"Region Name": "West", "Feeder Code": "7", "Feeder Day1 reading": 0, "Feeder Day2 reading": 999}
            ],
            "DTs": [{"Feeder Code": "7", "DT Code": "T1", "DT Day1 Reading": 0, "DT Day2 Reading": 96}],
            "Meters": []
        }"#,
    )
    .unwrap();

    let mut dash = Dashboard::new(
        BuildConfig {
            duplicate_ids: DuplicatePolicy::KeepFirst,
        },
        7,
    );
    let outcome = dash.load_path(&path);
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.report.duplicate_feeders, 1);

    let f = dash.feeder("7").unwrap();
    assert_eq!(f.energy, Some(100.0));
    assert_eq!(f.metrics.loss_fdt, Some(4.0));
    assert_eq!(dash.global_totals().communicating, 1);
}

#[test]
fn exports_report_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), FEEDERS, DTS, METERS);
    let mut dash = Dashboard::default();
    dash.load(&CsvWorkbook::new(dir.path()));

    let out = dir.path().join("out");
    let files = reports::export_reports(&dash, &out).unwrap();
    assert_eq!(files.results, out.join(RESULTS_FILE));
    assert_eq!(files.summary, out.join(SUMMARY_FILE));

    let results = fs::read_to_string(&files.results).unwrap();
    // 3 feeder rows and 3 DT rows after the header.
    assert_eq!(results.lines().count(), 7);
    let region_summary = fs::read_to_string(&files.region_summary).unwrap();
    assert!(region_summary.starts_with("Region,Feeders,DTs,Meters"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.summary).unwrap()).unwrap();
    assert_eq!(summary["totals"]["feeders"], 3);
    assert_eq!(summary["build"]["orphan_dts"], 1);
    assert!(summary["source"]["Workbook"].is_string());
}
