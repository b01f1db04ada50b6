mod app;
mod ui;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eframe::egui;
use serde::Serialize;

use app::DashboardApp;
use ev_dashboard::chart::{ChartSpec, Panel};
use ev_dashboard::config::{DashboardConfig, DEFAULT_DATA_PATH};
use ev_dashboard::data::filter::FilterField;
use ev_dashboard::data::loader;
use ev_dashboard::insights::{format_thousands, HeaderStats, Insights};
use ev_dashboard::state::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "ev-dashboard",
    about = "Explore electric-vehicle market data by year, region and vehicle type",
    version
)]
struct Cli {
    /// Dataset to load (.csv, .json or .parquet)
    #[arg(long, global = true, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Seed for the sample data used when the dataset cannot be loaded
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the dashboard window (default command)
    View,
    /// Print header figures and insights for a filtered view
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Only include this year
    #[arg(long)]
    year: Option<String>,
    /// Only include this region
    #[arg(long)]
    region: Option<String>,
    /// Only include this vehicle type
    #[arg(long)]
    mode: Option<String>,
    /// Write the filtered records to this CSV file
    #[arg(long)]
    export_csv: Option<PathBuf>,
    /// Write all four chart descriptions to this JSON file
    #[arg(long)]
    charts_json: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    data_source: String,
    records: usize,
    header: &'a HeaderStats,
    insights: &'a Insights,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = DashboardConfig {
        data_path: cli.data,
        sample_seed: cli.seed,
        ..DashboardConfig::default()
    };

    match cli.command.unwrap_or(Command::View) {
        Command::View => run_window(config),
        Command::Report(args) => run_report(&config, args),
    }
}

fn run_window(config: DashboardConfig) -> Result<()> {
    let outcome = loader::load_or_sample(&config.data_path, config.sample_seed);
    let state = AppState::from_load(outcome, &config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EV Market Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state, config)))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}

fn run_report(config: &DashboardConfig, args: ReportArgs) -> Result<()> {
    let outcome = loader::load_or_sample(&config.data_path, config.sample_seed);
    if let Some(reason) = &outcome.fallback_reason {
        eprintln!("warning: {reason}; using sample data");
    }
    let mut state = AppState::from_load(outcome, config);

    for (field, value) in [
        (FilterField::Year, args.year),
        (FilterField::Region, args.region),
        (FilterField::Mode, args.mode),
    ] {
        if value.is_some() {
            state.on_filter_changed(field, value);
        }
    }

    let snapshot = state.snapshot();
    if args.json {
        let output = ReportOutput {
            data_source: state.dataset().source().to_string(),
            records: state.view().len(),
            header: &snapshot.header,
            insights: &snapshot.insights,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&state);
    }

    if let Some(path) = &args.charts_json {
        let specs: Vec<ChartSpec> = Panel::ALL.iter().map(|&p| state.chart_spec(p)).collect();
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &specs)
            .with_context(|| format!("writing chart descriptions to {}", path.display()))?;
        log::info!("Wrote {} chart descriptions to {}", specs.len(), path.display());
    }

    if let Some(path) = &args.export_csv {
        let rows = state
            .export_csv(path)
            .with_context(|| format!("exporting CSV to {}", path.display()))?;
        println!("\nExported {rows} rows to {}", path.display());
    }

    Ok(())
}

fn print_report(state: &AppState) {
    let snapshot = state.snapshot();
    println!("EV market report");
    println!("Data source: {}", state.dataset().source());

    let active: Vec<String> = state
        .filters()
        .active()
        .map(|(field, value)| format!("{field} = {value}"))
        .collect();
    if active.is_empty() {
        println!("Filters: none");
    } else {
        println!("Filters: {}", active.join(", "));
    }

    println!(
        "\n{} records, {} vehicles, {} regions, {} years",
        state.view().len(),
        format_thousands(snapshot.header.total_vehicles, 0),
        snapshot.header.regions,
        snapshot.header.years
    );

    println!("\nKey insights");
    print!("{}", snapshot.insights);
}
