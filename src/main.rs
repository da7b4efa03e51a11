// Entry point and interactive menu.
//
// - Option [1] loads the workbook (or the synthetic fallback) into memory.
// - Option [2] writes the report bundle and prints previews.
// - Option [3] looks up an identifier across all four levels.
// - Option [4] prints KPIs for the meter register.
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use clap::Parser;
use feeder_loss_report::dashboard::DEFAULT_SEED;
use feeder_loss_report::kpi::{self, Timeline};
use feeder_loss_report::loader::Workbook;
use feeder_loss_report::normalize::{AliasTolerant, Strict};
use feeder_loss_report::output;
use feeder_loss_report::reports;
use feeder_loss_report::util::{format_int, num_or_dash, pct_or_dash};
use feeder_loss_report::{BuildConfig, Dashboard, DuplicatePolicy, Level, LossBand, SearchHit};
use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "feeder-loss-report", version, about = "Feeder, DT and meter energy-loss reports")]
struct Args {
    /// Directory of Feeders/DTs/Meters CSV sheets, or a JSON workbook.
    #[arg(long, default_value = "sample_3sheets_clean")]
    workbook: PathBuf,

    /// Meter register (first sheet is used) for the KPI view.
    #[arg(long)]
    register: Option<PathBuf>,

    /// Where report files are written.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// How repeated feeder/DT/meter ids are handled.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Overwrite)]
    duplicates: DuplicatePolicy,

    /// Seed for the synthetic fallback dataset.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Log filter used when neither FEEDER_LOSS_LOG nor RUST_LOG is set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

// The dashboard lives for the whole session so a workbook is loaded once and
// queried many times.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    dashboard: Dashboard,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("FEEDER_LOSS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Print `label` and read one trimmed line; `None` once stdin is closed.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice() -> String {
    prompt("Enter choice: ").unwrap_or_else(|| "0".to_string())
}

/// Handle option [1]: load the workbook, falling back to synthetic data.
fn handle_load(args: &Args) {
    let mut state = state();
    let outcome = state.dashboard.load_path(&args.workbook);
    let report = outcome.report;

    println!("Loaded {}", outcome.origin);
    println!(
        "Rows read: {} feeders, {} DTs, {} meters",
        format_int(report.feeder_rows),
        format_int(report.dt_rows),
        format_int(report.meter_rows)
    );
    if report.orphan_dts + report.orphan_meters > 0 {
        println!(
            "Note: {} DTs and {} meters reference unknown parents.",
            format_int(report.orphan_dts),
            format_int(report.orphan_meters)
        );
    }
    let duplicates = report.duplicate_feeders + report.duplicate_dts + report.duplicate_meters;
    if duplicates > 0 {
        println!(
            "Note: {} duplicate ids handled with policy {:?}.",
            format_int(duplicates),
            args.duplicates
        );
    }
    println!();
}

/// Handle option [2]: write the report bundle and print previews.
fn handle_generate_reports(args: &Args) {
    let state = state();
    let dashboard = &state.dashboard;
    if !dashboard.is_loaded() {
        println!("Error: No data loaded. Please load the workbook first (option 1).\n");
        return;
    }

    println!("Generating reports...");
    let files = match reports::export_reports(dashboard, &args.out_dir) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Write error: {}\n", e);
            return;
        }
    };

    let model = dashboard.model();
    output::preview_table("Region Summary", &model.region_summary_rows(), 10);
    println!("(Full table exported to {})\n", files.region_summary.display());
    output::preview_table("Feeder Losses", &model.feeder_summary_rows(), 10);
    output::preview_table("Results Table", &dashboard.flatten_results_table(), 10);
    println!("(Full table exported to {})\n", files.results.display());

    let totals = dashboard.global_totals();
    println!("Summary Stats ({}):", files.summary.display());
    println!(
        "{{\"feeders\": {}, \"dts\": {}, \"meters\": {}, \"feeder_to_dt_loss\": \"{}\", \"dt_to_cons_loss\": \"{}\", \"communicating_pct\": {:.2}}}\n",
        format_int(totals.feeders),
        format_int(totals.dts),
        format_int(totals.meters),
        pct_or_dash(totals.loss_fdt),
        pct_or_dash(totals.loss_dtc),
        totals.communicating_pct
    );
}

fn print_hit(dashboard: &Dashboard, hit: &SearchHit) {
    println!("Found {} {}", hit.level, hit.id);
    match hit.level {
        Level::Meter => {
            if let Some(m) = dashboard.meter(&hit.id) {
                println!("  Feeder: {}  DT: {}", m.feeder_id, m.dt_id);
                println!("  Energy: {}", num_or_dash(m.energy));
                println!(
                    "  Comm: {}  NonComm: {}  Unmapped: {}  NeverComm: {}",
                    m.comm, m.non_comm, m.unmapped, m.never_comm
                );
            }
        }
        Level::Dt => {
            if let Some(d) = dashboard.dt(&hit.id) {
                println!("  Name: {}  Feeder: {}  Region: {}", d.name, d.feeder_id, d.region);
                println!("  Energy: {}  Meters: {}", num_or_dash(d.energy), d.metrics.meters);
                println!(
                    "  DT→Cons loss: {} ({})",
                    pct_or_dash(d.metrics.loss_dtc),
                    LossBand::label(d.metrics.loss_dtc)
                );
            }
        }
        Level::Feeder => {
            if let Some(f) = dashboard.feeder(&hit.id) {
                println!("  Name: {}  Region: {}", f.name, f.region);
                println!(
                    "  Energy: {}  DTs: {}  Meters: {}",
                    num_or_dash(f.energy),
                    f.metrics.dts,
                    f.metrics.meters
                );
                println!(
                    "  F→DT loss: {}  F→Cons loss: {} ({})",
                    pct_or_dash(f.metrics.loss_fdt),
                    pct_or_dash(f.metrics.loss_fc),
                    LossBand::label(f.metrics.loss_fc)
                );
            }
        }
        Level::Region => {
            if let Some(r) = dashboard.region(&hit.id) {
                let m = &r.metrics;
                println!("  Feeders: {}  DTs: {}  Meters: {}", m.feeders, m.dts, m.meters);
                println!(
                    "  Comm: {}  NonComm: {}  Unmapped: {}  NeverComm: {}",
                    m.communicating, m.non_communicating, m.unmapped, m.never_comm
                );
                println!(
                    "  F→DT loss: {}  DT→Cons loss: {}  F→Cons loss: {}",
                    pct_or_dash(m.loss_fdt),
                    pct_or_dash(m.loss_dtc),
                    pct_or_dash(m.loss_fc)
                );
            }
        }
        Level::All => {}
    }
    println!();
}

/// Handle option [3]: search an identifier and select it.
fn handle_search() {
    let token = prompt("Enter identifier: ").unwrap_or_default();
    let mut state = state();
    let Some(hit) = state.dashboard.find_by_identifier(&token) else {
        println!("No match for {:?}.\n", token);
        return;
    };
    print_hit(&state.dashboard, &hit);
    if let Err(e) = state.dashboard.select(hit.level, Some(hit.id.as_str())) {
        eprintln!("Selection error: {}", e);
    }
}

/// Handle option [4]: KPIs, region summary and latest timeline week for the
/// meter register.
fn handle_kpis(args: &Args) {
    let Some(path) = args.register.as_deref() else {
        println!("Error: No meter register given. Start with --register <PATH>.\n");
        return;
    };
    let workbook = match Workbook::from_path(path) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Failed to load meter register: {}\n", e);
            return;
        }
    };
    let rows = workbook.first_sheet();
    let now = Local::now().naive_local();

    let totals = kpi::kpi_totals(&kpi::register_records(&AliasTolerant, rows), now);
    output::preview_table("Meter Register KPIs", &totals.tiles(), 20);

    let strict = kpi::register_records(&Strict, rows);
    let summary = kpi::summarize(&strict, now);
    output::preview_table("Region / Meter Type / Comm Medium", &summary.rows(), 50);

    let timeline = Timeline::from_records(&strict);
    let title = format!(
        "Installations and First Communication (week {} of {})",
        timeline.week_index() + 1,
        timeline.week_count().max(1)
    );
    output::preview_table(&title, timeline.current_week(), 7);
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);
    state().dashboard = Dashboard::new(
        BuildConfig {
            duplicate_ids: args.duplicates,
        },
        args.seed,
    );

    loop {
        println!("Feeder Loss Report:");
        println!("[1] Load workbook");
        println!("[2] Generate reports");
        println!("[3] Search identifier");
        println!("[4] Meter register KPIs");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&args),
            "2" => {
                println!();
                handle_generate_reports(&args);
            }
            "3" => handle_search(),
            "4" => handle_kpis(&args),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
}
