use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use thiserror::Error;

use crate::chart::adapter::{self, ChartInputs};
use crate::chart::{ChartKind, ChartSpec, Panel};
use crate::config::{DashboardConfig, NoticeConfig};
use crate::data::aggregate::{group_sum, Aggregate};
use crate::data::filter::{FilterField, FilterState, FilteredView};
use crate::data::loader::LoadOutcome;
use crate::data::model::{Dataset, Field, Record};
use crate::export::{self, ExportError};
use crate::insights::{self, HeaderStats, Insights};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("{kind} charts are not available for the {panel} panel")]
    UnsupportedChartKind { panel: Panel, kind: ChartKind },
}

// ---------------------------------------------------------------------------
// Notices – transient banners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: Instant,
}

// ---------------------------------------------------------------------------
// Snapshot – everything derived from the current view
// ---------------------------------------------------------------------------

/// Aggregates, insights and header figures for one filter state. Replaced
/// wholesale whenever the filters change.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub by_mode: Aggregate,
    pub by_region: Aggregate,
    pub by_year: Aggregate,
    pub insights: Insights,
    pub header: HeaderStats,
}

impl Snapshot {
    pub fn compute(dataset: &Dataset, view: &FilteredView) -> Self {
        let records = view.records(dataset);
        let by_mode = group_sum(records.clone(), Field::Mode, Field::SalesVolume);
        let by_region = group_sum(records.clone(), Field::Region, Field::SalesVolume);
        let by_year = group_sum(records.clone(), Field::Year, Field::SalesVolume);
        let insights = insights::summarize(&by_mode, &by_region, &by_year, records.clone());
        let header = HeaderStats::compute(records);
        Snapshot {
            by_mode,
            by_region,
            by_year,
            insights,
            header,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering. Every user action
/// maps to one method here.
pub struct AppState {
    dataset: Dataset,
    filters: FilterState,
    view: FilteredView,
    snapshot: Snapshot,
    chart_kinds: BTreeMap<Panel, ChartKind>,
    current_tab: Panel,
    notices: Vec<Notice>,
    notice_config: NoticeConfig,
}

impl AppState {
    pub fn new(dataset: Dataset, notice_config: NoticeConfig) -> Self {
        let view = FilteredView::all(&dataset);
        let snapshot = Snapshot::compute(&dataset, &view);
        Self {
            dataset,
            filters: FilterState::default(),
            view,
            snapshot,
            chart_kinds: Panel::ALL.iter().map(|&p| (p, p.default_kind())).collect(),
            current_tab: Panel::Category,
            notices: Vec::new(),
            notice_config,
        }
    }

    /// Start from a load result, announcing a sample-data fallback.
    pub fn from_load(outcome: LoadOutcome, config: &DashboardConfig) -> Self {
        let mut state = Self::new(outcome.dataset, config.notices);
        if let Some(reason) = outcome.fallback_reason {
            state.push_notice(
                NoticeLevel::Error,
                format!("Could not load the data ({reason}). Showing sample data."),
            );
        }
        state
    }

    /// Swap in a newly loaded dataset; filters are cleared since their
    /// values may not exist in the new data.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.filters.clear();
        self.refilter();
    }

    /// Recompute the view and snapshot after a filter change.
    fn refilter(&mut self) {
        self.view = FilteredView::compute(&self.dataset, &self.filters);
        self.snapshot = Snapshot::compute(&self.dataset, &self.view);
        log::debug!(
            "Filters {:?} keep {} of {} records",
            self.filters,
            self.view.len(),
            self.dataset.len()
        );
    }

    // -- accessors --

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn visible_records(&self) -> Vec<&Record> {
        self.view.records(&self.dataset).collect()
    }

    pub fn current_tab(&self) -> Panel {
        self.current_tab
    }

    pub fn chart_kind(&self, panel: Panel) -> ChartKind {
        self.chart_kinds
            .get(&panel)
            .copied()
            .unwrap_or_else(|| panel.default_kind())
    }

    // -- commands --

    /// Set or clear one selector (`None` or blank clears it).
    pub fn on_filter_changed(&mut self, field: FilterField, value: Option<String>) {
        self.filters.set(field, value);
        self.refilter();
    }

    /// Drop every selector, restoring the unfiltered view.
    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.refilter();
    }

    pub fn set_chart_kind(&mut self, panel: Panel, kind: ChartKind) -> Result<(), StateError> {
        if !panel.supports(kind) {
            return Err(StateError::UnsupportedChartKind { panel, kind });
        }
        self.chart_kinds.insert(panel, kind);
        Ok(())
    }

    pub fn select_tab(&mut self, panel: Panel) {
        self.current_tab = panel;
    }

    /// Chart description for `panel` in its selected render mode.
    pub fn chart_spec(&self, panel: Panel) -> ChartSpec {
        let records = self.visible_records();
        let options = self.dataset.filter_options();
        let inputs = ChartInputs {
            by_mode: &self.snapshot.by_mode,
            by_region: &self.snapshot.by_region,
            by_year: &self.snapshot.by_year,
            records: &records,
            all_regions: &options.regions,
            all_modes: &options.modes,
        };
        adapter::build(panel, self.chart_kind(panel), &inputs)
    }

    /// Write the visible records to `path` and report the outcome as a
    /// notice.
    pub fn export_csv(&mut self, path: &Path) -> Result<usize, ExportError> {
        let result = export::export_csv(path, self.view.records(&self.dataset));
        match &result {
            Ok(rows) => self.push_notice(NoticeLevel::Info, format!("Exported {rows} rows to CSV")),
            Err(e) => {
                log::error!("CSV export failed: {e}");
                self.push_notice(NoticeLevel::Error, format!("CSV export failed: {e}"));
            }
        }
        result
    }

    /// Whether the current tab has a chart to capture. Announces the
    /// problem when it does not.
    pub fn request_png_export(&mut self) -> bool {
        if self.chart_spec(self.current_tab).has_plot() {
            true
        } else {
            self.push_notice(NoticeLevel::Info, "No visible chart to export".to_string());
            false
        }
    }

    // -- notices --

    pub fn push_notice(&mut self, level: NoticeLevel, message: String) {
        let lifetime = match level {
            NoticeLevel::Error => self.notice_config.error_lifetime,
            NoticeLevel::Info => self.notice_config.info_lifetime,
        };
        self.notices.push(Notice {
            level,
            message,
            expires_at: Instant::now() + lifetime,
        });
    }

    /// Drop notices that have expired by `now`.
    pub fn prune_notices(&mut self, now: Instant) {
        self.notices.retain(|n| n.expires_at > now);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(sample::generate(Some(21)), NoticeConfig::default())
    }

    #[test]
    fn starts_unfiltered_with_default_chart_kinds() {
        let s = state();
        assert_eq!(s.view().len(), s.dataset().len());
        assert_eq!(s.chart_kind(Panel::Category), ChartKind::Pie);
        assert_eq!(s.chart_kind(Panel::Comparison), ChartKind::Scatter);
        assert!(matches!(s.snapshot().insights, Insights::Summary(_)));
    }

    #[test]
    fn filter_change_recomputes_snapshot() {
        let mut s = state();
        s.on_filter_changed(FilterField::Region, Some("Europe".into()));
        assert!(s.visible_records().iter().all(|r| r.region == "Europe"));
        assert_eq!(s.snapshot().by_region.keys(), vec!["Europe"]);
        assert_eq!(s.snapshot().header.regions, 1);
    }

    #[test]
    fn reset_restores_the_full_dataset() {
        let mut s = state();
        s.on_filter_changed(FilterField::Year, Some("2020".into()));
        s.on_filter_changed(FilterField::Mode, Some("Van".into()));
        s.reset_filters();

        let visible: Vec<Record> = s.visible_records().into_iter().cloned().collect();
        assert_eq!(visible.as_slice(), s.dataset().records());
        assert!(s.filters().is_empty());
    }

    #[test]
    fn impossible_filters_give_insufficient_data() {
        let mut s = state();
        s.on_filter_changed(FilterField::Region, Some("Nowhere".into()));
        assert!(s.view().is_empty());
        assert_eq!(s.snapshot().insights, Insights::InsufficientData);
        assert!(!s.chart_spec(Panel::Comparison).has_plot());
    }

    #[test]
    fn chart_kind_must_belong_to_panel() {
        let mut s = state();
        assert!(s.set_chart_kind(Panel::Regional, ChartKind::HorizontalBar).is_ok());
        assert_eq!(s.chart_spec(Panel::Regional).kind, ChartKind::HorizontalBar);
        assert_eq!(
            s.set_chart_kind(Panel::Trend, ChartKind::Pie),
            Err(StateError::UnsupportedChartKind {
                panel: Panel::Trend,
                kind: ChartKind::Pie
            })
        );
        assert_eq!(s.chart_kind(Panel::Trend), ChartKind::Line);
    }

    #[test]
    fn png_export_needs_a_visible_chart() {
        let mut s = state();
        s.select_tab(Panel::Comparison);
        assert!(s.request_png_export());

        s.on_filter_changed(FilterField::Mode, Some("Hovercraft".into()));
        assert!(!s.request_png_export());
        assert_eq!(s.notices().len(), 1);
        assert_eq!(s.notices()[0].message, "No visible chart to export");
    }

    #[test]
    fn notices_expire() {
        let mut s = state();
        s.push_notice(NoticeLevel::Info, "hello".into());
        s.push_notice(NoticeLevel::Error, "oops".into());
        s.prune_notices(Instant::now());
        assert_eq!(s.notices().len(), 2);

        s.prune_notices(Instant::now() + Duration::from_secs(4));
        assert_eq!(s.notices().len(), 1);
        assert_eq!(s.notices()[0].level, NoticeLevel::Error);

        s.prune_notices(Instant::now() + Duration::from_secs(6));
        assert!(s.notices().is_empty());
    }

    #[test]
    fn fallback_load_raises_an_error_notice() {
        let outcome = LoadOutcome {
            dataset: sample::generate(Some(2)),
            fallback_reason: Some("file not found".into()),
        };
        let s = AppState::from_load(outcome, &DashboardConfig::default());
        assert_eq!(s.notices()[0].level, NoticeLevel::Error);
        assert!(s.notices()[0].message.contains("file not found"));
    }

    #[test]
    fn csv_export_matches_view_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut s = state();
        s.on_filter_changed(FilterField::Year, Some("2023".into()));

        let rows = s.export_csv(&path).expect("export succeeds");
        assert_eq!(rows, s.view().len());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), rows + 1);
        assert_eq!(s.notices()[0].level, NoticeLevel::Info);
    }
}
