use std::fs;
use std::path::Path;

use ev_dashboard::chart::{ChartBody, ChartKind, Panel, Trace};
use ev_dashboard::config::{DashboardConfig, NoticeConfig};
use ev_dashboard::data::filter::FilterField;
use ev_dashboard::data::loader;
use ev_dashboard::data::model::DataSource;
use ev_dashboard::insights::{Growth, Insights};
use ev_dashboard::state::{AppState, NoticeLevel};

const MARKET_CSV: &str = "\
year,region,mode,sales_volume,price,range_km,energy_efficiency
2021,Europe,SUV,100,40000,400,180
2021,Asia-Pacific,Sedan,200,30000,350,160
2022,Europe,Sedan,150,35000,420,170
2022,Asia-Pacific,SUV,300,45000,500,200
2022,Europe,,80,20000,300,150
";

fn write_market(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("market.csv");
    fs::write(&path, MARKET_CSV).unwrap();
    path
}

fn loaded_state(dir: &Path) -> AppState {
    let outcome = loader::load_or_sample(&write_market(dir), None);
    assert!(outcome.fallback_reason.is_none());
    AppState::new(outcome.dataset, NoticeConfig::default())
}

#[test]
fn load_filter_aggregate_and_summarize() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = loaded_state(dir.path());

    // The row without a mode is rejected at ingestion.
    assert_eq!(state.dataset().len(), 4);
    assert!(matches!(state.dataset().source(), DataSource::File(_)));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.by_year.keys(), vec!["2021", "2022"]);
    assert_eq!(snapshot.by_year.values(), vec![300.0, 450.0]);
    assert_eq!(snapshot.header.total_vehicles, 750.0);

    let Insights::Summary(summary) = &snapshot.insights else {
        panic!("expected a summary, got {:?}", snapshot.insights);
    };
    assert_eq!(summary.top_mode.key, "SUV");
    assert_eq!(summary.top_mode.value, 400.0);
    assert_eq!(summary.top_region.key, "Asia-Pacific");
    assert_eq!(summary.growth, Growth::Percent(50.0));
    assert_eq!(summary.avg_price, Some(37500.0));

    state.on_filter_changed(FilterField::Region, Some("Europe".into()));
    let snapshot = state.snapshot();
    assert_eq!(state.view().len(), 2);
    assert_eq!(snapshot.by_mode.keys(), vec!["SUV", "Sedan"]);
    assert_eq!(snapshot.by_year.values(), vec![100.0, 150.0]);
    assert!(snapshot
        .insights
        .lines()
        .iter()
        .any(|l| l.contains("50.0% growth")));
}

#[test]
fn charts_follow_the_filtered_view() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = loaded_state(dir.path());
    state.on_filter_changed(FilterField::Year, Some("2022".into()));

    let spec = state.chart_spec(Panel::Category);
    let ChartBody::Traces(traces) = &spec.body else {
        panic!("category chart should have data");
    };
    match &traces[0] {
        Trace::Pie { labels, values, .. } => {
            assert_eq!(labels, &vec!["Sedan".to_string(), "SUV".to_string()]);
            assert_eq!(values, &vec![150.0, 300.0]);
        }
        other => panic!("expected a pie, got {other:?}"),
    }

    state.set_chart_kind(Panel::Trend, ChartKind::Area).unwrap();
    let trend = state.chart_spec(Panel::Trend);
    assert_eq!(trend.kind, ChartKind::Area);
    let ChartBody::Traces(traces) = &trend.body else {
        panic!("trend chart should have data");
    };
    assert!(matches!(&traces[0], Trace::Line { x, fill: true, .. } if x == &vec![2022.0]));

    state.on_filter_changed(FilterField::Mode, Some("Van".into()));
    for panel in Panel::ALL {
        assert!(!state.chart_spec(panel).has_plot(), "{panel} should be a placeholder");
    }
    assert_eq!(state.snapshot().insights, Insights::InsufficientData);
}

#[test]
fn export_writes_the_visible_rows_and_reset_restores_all() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = loaded_state(dir.path());
    state.on_filter_changed(FilterField::Mode, Some("SUV".into()));

    let out = dir.path().join("export.csv");
    assert_eq!(state.export_csv(&out).unwrap(), 2);
    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Año,Región"));
    assert!(lines[1..].iter().all(|l| l.contains(",SUV,")));

    state.reset_filters();
    assert_eq!(state.view().len(), state.dataset().len());
    assert_eq!(state.snapshot().header.total_vehicles, 750.0);
}

#[test]
fn unreadable_file_falls_back_to_sample_data() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");

    let outcome = loader::load_or_sample(&missing, Some(5));
    assert!(outcome.fallback_reason.is_some());
    let state = AppState::from_load(outcome, &DashboardConfig::default());

    assert_eq!(state.dataset().source(), &DataSource::Sample { seed: 5 });
    assert_eq!(state.dataset().len(), 150);
    assert_eq!(state.notices().len(), 1);
    assert_eq!(state.notices()[0].level, NoticeLevel::Error);
}
