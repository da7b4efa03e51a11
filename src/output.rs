// Export writers and console previews.
use std::fs;
use std::path::Path;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Render up to `max_rows` rows as a markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

/// Print a titled preview of `rows`, noting when the table was cut short.
pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}\n", title);
    println!("{}", render_table(rows, max_rows));
    if rows.len() > max_rows {
        println!("({} of {} rows shown)", max_rows, rows.len());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::hierarchy::Model;
    use crate::test_utils::sample_sheets;

    fn sample() -> Model {
        let (f, d, m) = sample_sheets();
        Model::build(&f, &d, &m, &BuildConfig::default())
    }

    #[test]
    fn results_csv_uses_export_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results_table.csv");
        write_csv(&path, &sample().flatten_results_table()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Feeder_Code,Feeder_E,Sum_DT_E,Feeder_to_DT_Loss"));
        assert!(header.ends_with("DT_to_Cons_Loss"));
        assert_eq!(text.lines().count(), 1 + 8);
    }

    #[test]
    fn summary_json_round_trips_as_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &sample().global_totals()).unwrap();

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["feeders"], 3);
        assert_eq!(v["communicating_pct"], 26.67);
    }

    #[test]
    fn render_truncates_and_handles_empty() {
        let rows = sample().region_summary_rows();
        let table = render_table(&rows, 1);
        assert!(table.contains("North"));
        assert!(!table.contains("South"));
        assert_eq!(render_table::<crate::types::ResultRow>(&[], 5), "(no rows)");
    }
}
