use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use volumen_dashboard::config::DashboardConfig;
use volumen_dashboard::data::aggregate::{Granularity, Report};
use volumen_dashboard::data::cache::DatasetCache;
use volumen_dashboard::data::filter::FilterState;
use volumen_dashboard::data::model::{CategoryColumn, Dataset, DateRange};
use volumen_dashboard::data::period::{resolve_period, RelativePeriod};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Volume,
    Data,
    /// Index into `DashboardConfig::report_images`.
    Report(usize),
}

/// The full UI state, independent of rendering.
///
/// Every mutation that changes what is shown ends in [`AppState::recompute`],
/// which rebuilds the report from the shared dataset in one pass.
pub struct AppState {
    pub config: DashboardConfig,
    cache: DatasetCache,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    /// Current filter selection, owned here and handed to the engine.
    pub filter: FilterState,
    pub period: RelativePeriod,
    pub granularity: Granularity,

    /// Charts and table rows for the current selection.
    pub report: Report,

    /// Sector colours, stable across filter changes.
    pub sector_colors: Option<ColorMap>,

    /// Fatal load error shown in place of the charts.
    pub status_message: Option<String>,
    /// Non-fatal load diagnostics.
    pub notice: Option<String>,

    pub tab: Tab,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: DatasetCache::new(),
            dataset: None,
            filter: FilterState::for_dataset(&Dataset::from_records(Vec::new())),
            period: RelativePeriod::default(),
            granularity: Granularity::default(),
            report: Report::default(),
            sector_colors: None,
            status_message: None,
            notice: None,
            tab: Tab::Volume,
        }
    }

    /// Load (or fetch from cache) the configured source.
    pub fn load(&mut self) {
        match self.cache.get_or_load(&self.config.source) {
            Ok(dataset) => {
                let unchanged = self
                    .dataset
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &dataset));
                if !unchanged {
                    self.set_dataset(dataset);
                }
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", self.config.source.path.display());
                self.dataset = None;
                self.report = Report::default();
                self.sector_colors = None;
                self.notice = None;
                let kind = if e.is_parse_error() { "Invalid data" } else { "Source unavailable" };
                self.status_message = Some(format!("{kind}: {e}"));
            }
        }
    }

    /// Drop the cached dataset and read the source again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.load();
    }

    /// Switch to another source file.
    pub fn open_path(&mut self, path: PathBuf) {
        self.config.source.path = path;
        self.load();
    }

    /// Ingest a newly loaded dataset, initialise filters and colours.
    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.filter = FilterState::for_dataset(&dataset);
        self.period = RelativePeriod::AllHistory;
        self.sector_colors = Some(ColorMap::new(dataset.sectors.iter(), self.config.palette));
        self.notice = (!dataset.warnings.is_empty()).then(|| {
            format!(
                "{} volume values could not be read and are left out of the totals",
                dataset.warnings.len()
            )
        });
        self.dataset = Some(dataset);
        self.recompute();
    }

    /// Rebuild the report for the current selection.
    pub fn recompute(&mut self) {
        self.report = match &self.dataset {
            Some(ds) => Report::build(ds, &self.filter, self.granularity),
            None => Report::default(),
        };
    }

    /// `(min, max)` date of the loaded dataset.
    pub fn bounds(&self) -> Option<DateRange> {
        self.dataset.as_ref().and_then(|ds| ds.bounds)
    }

    // -- Dates --

    /// Apply a period shortcut: resolve it and overwrite the date bounds.
    pub fn set_period(&mut self, period: RelativePeriod) {
        self.period = period;
        if let Some(bounds) = self.bounds() {
            self.filter.range = resolve_period(period, bounds, self.filter.range);
        }
        self.recompute();
    }

    /// Editing a bound by hand switches the shortcut to `Custom`. The other
    /// bound follows if needed to keep `start <= end`.
    pub fn set_start_date(&mut self, start: NaiveDate) {
        self.period = RelativePeriod::Custom;
        self.filter.range = DateRange {
            start,
            end: self.filter.range.end.max(start),
        };
        self.recompute();
    }

    pub fn set_end_date(&mut self, end: NaiveDate) {
        self.period = RelativePeriod::Custom;
        self.filter.range = DateRange {
            start: self.filter.range.start.min(end),
            end,
        };
        self.recompute();
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
        self.recompute();
    }

    // -- Categorical selections --

    fn selection_mut(&mut self, column: CategoryColumn) -> Option<&mut BTreeSet<String>> {
        match column {
            CategoryColumn::Product => Some(&mut self.filter.products),
            CategoryColumn::Department => Some(&mut self.filter.departments),
            CategoryColumn::Sector => None,
        }
    }

    /// Selected values of a filterable column. `None` for sectors, which
    /// are not filterable.
    pub fn selection(&self, column: CategoryColumn) -> Option<&BTreeSet<String>> {
        match column {
            CategoryColumn::Product => Some(&self.filter.products),
            CategoryColumn::Department => Some(&self.filter.departments),
            CategoryColumn::Sector => None,
        }
    }

    /// Check or uncheck one value.
    pub fn set_selected(&mut self, column: CategoryColumn, value: &str, selected: bool) {
        if let Some(set) = self.selection_mut(column) {
            if selected {
                set.insert(value.to_string());
            } else {
                set.remove(value);
            }
        }
        self.recompute();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: CategoryColumn) {
        let Some(all) = self.dataset.as_ref().map(|ds| ds.distinct(column).clone()) else {
            return;
        };
        if let Some(set) = self.selection_mut(column) {
            *set = all;
        }
        self.recompute();
    }

    /// Deselect all values in a column (which lifts the restriction).
    pub fn select_none(&mut self, column: CategoryColumn) {
        if let Some(set) = self.selection_mut(column) {
            set.clear();
        }
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use volumen_dashboard::config::SourceConfig;

    use super::*;

    const CSV: &str = "FECHA;PROD;DEPARTAMENTO;SECTOR;VOLUMEN\n\
        2023-11-15;PRODA;DEPT1;SEC1;10,00\n\
        2024-01-05;PRODA;DEPT1;SEC1;1.234,50\n\
        2024-01-20;PRODA;DEPT1;SEC2;100,00\n\
        2024-01-31;PRODB;DEPT2;SEC1;50,00\n\
        2024-01-31;PRODB;DEPT2;SEC1;s/d\n";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn state_for(dir: &Path) -> AppState {
        let path = dir.join("datos.csv");
        std::fs::write(&path, CSV).unwrap();
        let config = DashboardConfig {
            source: SourceConfig {
                path,
                ..SourceConfig::default()
            },
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load();
        state
    }

    #[test]
    fn test_load_initialises_filter_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        assert!(state.status_message.is_none());
        assert_eq!(state.period, RelativePeriod::AllHistory);
        assert_eq!(state.filter.range, DateRange::new(d(2023, 11, 15), d(2024, 1, 31)));
        assert_eq!(state.report.rows.len(), 5);
        assert_eq!(state.report.missing_volumes, 1);
        assert!(state.notice.is_some());
    }

    #[test]
    fn test_period_shortcut_overwrites_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());

        state.set_period(RelativePeriod::LastMonth);
        assert_eq!(state.filter.range, DateRange::new(d(2023, 12, 31), d(2024, 1, 31)));
        assert_eq!(state.report.rows, vec![1, 2, 3, 4]);

        state.set_period(RelativePeriod::AllHistory);
        assert_eq!(state.report.rows.len(), 5);
    }

    #[test]
    fn test_manual_date_edit_becomes_custom() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());

        state.set_start_date(d(2024, 1, 10));
        assert_eq!(state.period, RelativePeriod::Custom);
        assert_eq!(state.report.rows, vec![2, 3, 4]);

        state.set_end_date(d(2024, 1, 1));
        assert_eq!(state.filter.range, DateRange::new(d(2024, 1, 1), d(2024, 1, 1)));
        assert!(state.report.is_empty());
    }

    #[test]
    fn test_category_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());

        state.set_selected(CategoryColumn::Product, "PRODA", false);
        assert_eq!(state.report.rows, vec![3, 4]);

        state.select_none(CategoryColumn::Product);
        assert!(state.selection(CategoryColumn::Product).is_some_and(|s| s.is_empty()));
        assert_eq!(state.report.rows.len(), 5);

        state.set_selected(CategoryColumn::Department, "DEPT1", false);
        assert_eq!(state.report.department_ranking.len(), 1);

        state.select_all(CategoryColumn::Department);
        assert_eq!(state.selection(CategoryColumn::Department).map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_sectors_have_no_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());
        assert!(state.selection(CategoryColumn::Sector).is_none());

        state.set_selected(CategoryColumn::Sector, "SEC1", false);
        assert!(state.selection(CategoryColumn::Product).is_some_and(|s| s.contains("PRODA")));
        assert_eq!(state.report.rows.len(), 5);
    }

    #[test]
    fn test_granularity_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());
        state.set_granularity(Granularity::Monthly);
        let labels: Vec<&str> = state.report.time_series.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-11", "2024-01"]);
    }

    #[test]
    fn test_reload_keeps_cached_dataset_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());
        let first = state.dataset.clone().unwrap();

        state.set_period(RelativePeriod::LastMonth);
        state.load();
        // Same file version: same dataset, filter untouched.
        assert!(Arc::ptr_eq(&first, state.dataset.as_ref().unwrap()));
        assert_eq!(state.period, RelativePeriod::LastMonth);

        state.reload();
        assert!(!Arc::ptr_eq(&first, state.dataset.as_ref().unwrap()));
        assert_eq!(state.period, RelativePeriod::AllHistory);
    }

    #[test]
    fn test_missing_source_shows_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());
        state.open_path(dir.path().join("otro.xlsx"));

        assert!(state.dataset.is_none());
        assert!(state.report.is_empty());
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.starts_with("Source unavailable"), "{msg}");
        assert!(msg.contains("not found"), "{msg}");
    }

    #[test]
    fn test_bad_source_content_shows_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(dir.path());
        let path = dir.path().join("roto.csv");
        std::fs::write(&path, "FECHA;PROD;DEPARTAMENTO;SECTOR;VOLUMEN\nayer;A;D;S;1\n").unwrap();
        state.open_path(path);

        assert!(state.dataset.is_none());
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.starts_with("Invalid data"), "{msg}");
        assert!(msg.contains("FECHA"), "{msg}");
    }
}
