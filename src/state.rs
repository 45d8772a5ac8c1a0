use chrono::{Days, NaiveDate};

use rusty_waterfall::config::ChartConfig;
use rusty_waterfall::data::compare::{ComparisonRequest, DistributionComparison};
use rusty_waterfall::data::dates::{human_date_labels, parse_date};
use rusty_waterfall::data::model::{Table, ISO_DATE_FORMAT};
use rusty_waterfall::data::selection::DisplayRecord;
use rusty_waterfall::data::waterfall::{WaterfallBar, WaterfallChart};
use rusty_waterfall::data::ChartDataError;

use crate::color::ChartPalette;

const DEFAULT_OFFSET_DAYS: u32 = 30;
const DEFAULT_BIN_SIZE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Waterfall,
    Comparison,
}

// ---------------------------------------------------------------------------
// Comparison controls
// ---------------------------------------------------------------------------

/// Editable inputs of the timeframe comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonControls {
    pub field: Option<String>,
    pub anchors: [NaiveDate; 2],
    pub offset_days: u32,
    /// `None` keeps every non-missing value.
    pub threshold: Option<f64>,
    pub bin_size: f64,
    pub labels: [String; 2],
}

impl ComparisonControls {
    /// Controls seeded from a configured request.
    pub fn from_request(req: &ComparisonRequest) -> Result<Self, ChartDataError> {
        Ok(Self {
            field: Some(req.field.clone()),
            anchors: [
                parse_date(&req.anchors[0], ISO_DATE_FORMAT)?,
                parse_date(&req.anchors[1], ISO_DATE_FORMAT)?,
            ],
            offset_days: req.offset_days,
            threshold: req.threshold.is_finite().then_some(req.threshold),
            bin_size: req.bin_size,
            labels: req.labels.clone(),
        })
    }

    /// Controls guessed from the table: first numeric field, anchors at the
    /// start and middle of the index span.
    pub fn for_table(table: &Table) -> Self {
        let (first, last) = table
            .index_span()
            .unwrap_or((NaiveDate::default(), NaiveDate::default()));
        let half_span = (last - first).num_days().max(0) as u64 / 2;
        let middle = first.checked_add_days(Days::new(half_span)).unwrap_or(first);
        let mut controls = Self {
            field: table.numeric_columns().into_iter().next(),
            anchors: [first, middle],
            offset_days: DEFAULT_OFFSET_DAYS,
            threshold: None,
            bin_size: DEFAULT_BIN_SIZE,
            labels: [String::new(), String::new()],
        };
        controls.relabel();
        controls
    }

    /// Label each series with its anchor's month and year.
    pub fn relabel(&mut self) {
        let anchors = self.anchors.map(|d| d.format(ISO_DATE_FORMAT).to_string());
        if let Ok(labels) = human_date_labels(&anchors, ISO_DATE_FORMAT) {
            for (slot, label) in self.labels.iter_mut().zip(labels) {
                *slot = label;
            }
        }
    }

    pub fn request(&self) -> Option<ComparisonRequest> {
        Some(ComparisonRequest {
            field: self.field.clone()?,
            anchors: self.anchors.map(|d| d.format(ISO_DATE_FORMAT).to_string()),
            offset_days: self.offset_days,
            threshold: self.threshold.unwrap_or(f64::NEG_INFINITY),
            labels: self.labels.clone(),
            bin_size: self.bin_size,
        })
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ChartConfig,

    /// Loaded table (None until user loads a file).
    pub table: Option<Table>,

    /// Waterfall built from the table and config.
    pub chart: Option<WaterfallChart>,

    /// Dropdown entry currently shown; `None` shows the initial row.
    pub active_selection: Option<usize>,

    /// Bars of the displayed record, with its display values.
    pub bars: Vec<WaterfallBar>,
    pub displayed: Option<DisplayRecord>,

    pub controls: Option<ComparisonControls>,
    pub distribution: Option<DistributionComparison>,

    pub view: View,
    pub palette: ChartPalette,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

impl AppState {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            table: None,
            chart: None,
            active_selection: None,
            bars: Vec::new(),
            displayed: None,
            controls: None,
            distribution: None,
            view: View::Waterfall,
            palette: ChartPalette::default(),
            status_message: None,
            loading: false,
        }
    }

    /// Ingest a newly loaded table, build the waterfall and comparison.
    pub fn set_table(&mut self, table: Table) {
        let table = match self.prepare_table(table) {
            Ok(t) => t,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        self.controls = match &self.config.comparison {
            Some(req) => match ComparisonControls::from_request(req) {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("ignoring configured comparison: {e}");
                    Some(ComparisonControls::for_table(&table))
                }
            },
            None => Some(ComparisonControls::for_table(&table)),
        };

        self.table = Some(table);
        self.status_message = None;
        self.loading = false;
        self.rebuild_chart();
        self.rebuild_comparison();
    }

    /// Replace the config and rebuild everything derived from it.
    pub fn set_config(&mut self, config: ChartConfig) {
        self.config = config;
        if let Some(table) = self.table.take() {
            self.set_table(table);
        }
    }

    /// Materialise the index when the dropdown slices on it.
    fn prepare_table(&self, table: Table) -> Result<Table, ChartDataError> {
        let tag = &self.config.dropdown_tag;
        if tag == &self.config.index_column && table.column_position(tag).is_err() {
            table.with_index_column(tag)
        } else {
            Ok(table)
        }
    }

    /// Rebuild the waterfall from the current table and config.
    pub fn rebuild_chart(&mut self) {
        self.chart = None;
        self.active_selection = None;
        self.bars.clear();
        self.displayed = None;

        let Some(table) = &self.table else {
            return;
        };
        let plotted = table.columns().len().saturating_sub(1);
        let result = WaterfallChart::build(
            table,
            &self.config.dropdown_tag,
            &self.config.measures_for(plotted),
            0,
            self.config.precision(),
            self.config.title.clone(),
        );
        match result {
            Ok(chart) => {
                log::info!(
                    "Built waterfall with {} columns and {} dropdown entries",
                    chart.initial.x_labels.len(),
                    chart.selections.len()
                );
                let initial = chart.initial.clone();
                self.chart = Some(chart);
                self.show_record(initial);
            }
            Err(e) => self.report(e),
        }
    }

    /// Switch the waterfall to dropdown entry `i`.
    pub fn select(&mut self, i: usize) {
        let Some(chart) = &self.chart else {
            return;
        };
        match chart.selection_record(i) {
            Some(record) => {
                log::info!("Showing dropdown entry {i} ({})", chart.selections[i].label);
                self.active_selection = Some(i);
                self.show_record(record);
            }
            None => {
                self.status_message = Some(format!("No rows for dropdown entry {i}"));
            }
        }
    }

    fn show_record(&mut self, record: DisplayRecord) {
        let Some(chart) = &self.chart else {
            return;
        };
        match rusty_waterfall::data::waterfall::waterfall_bars(
            &record.x_labels,
            &chart.measures,
            &record.y_values,
        ) {
            Ok(bars) => {
                self.bars = bars;
                self.displayed = Some(record);
                self.status_message = None;
            }
            Err(e) => self.report(e),
        }
    }

    /// Recompute the distribution comparison from the controls.
    pub fn rebuild_comparison(&mut self) {
        self.distribution = None;
        let (Some(table), Some(controls)) = (&self.table, &self.controls) else {
            return;
        };
        let Some(request) = controls.request() else {
            return;
        };
        match request.run(table) {
            Ok(distribution) => {
                log::info!(
                    "Compared '{}': {} vs {} values",
                    distribution.field,
                    distribution.series[0].values.len(),
                    distribution.series[1].values.len()
                );
                self.distribution = Some(distribution);
            }
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, e: ChartDataError) {
        log::error!("{e}");
        self.status_message = Some(format!("Error: {e}"));
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_waterfall::data::model::{CellValue, Row};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, ISO_DATE_FORMAT).unwrap()
    }

    fn flows() -> Table {
        let rows = (0..90u64)
            .map(|d| {
                let day = date("2021-01-01").checked_add_days(Days::new(d)).unwrap();
                Row::new(
                    day,
                    vec![CellValue::Float(100.0 + d as f64), CellValue::Float(-(d as f64) / 2.0)],
                )
            })
            .collect();
        Table::new(vec!["revenue".into(), "cost".into()], rows).unwrap()
    }

    #[test]
    fn date_dropdown_uses_index() {
        let mut state = AppState::default();
        state.set_table(flows());
        assert!(state.status_message.is_none());
        let chart = state.chart.as_ref().unwrap();
        assert_eq!(chart.selections.len(), 90);
        assert_eq!(chart.selections[0].label, "2021-01-01");
        assert_eq!(chart.initial.x_labels, vec!["revenue", "cost"]);
        assert_eq!(state.bars.len(), 2);
        assert_eq!(state.bars[1].end, 100.0);
    }

    #[test]
    fn selecting_restyles_bars() {
        let mut state = AppState::default();
        state.set_table(flows());
        state.select(10);
        assert_eq!(state.active_selection, Some(10));
        assert_eq!(state.bars[0].end, 110.0);
        assert_eq!(state.bars[1].end, 105.0);

        state.select(1000);
        assert_eq!(state.active_selection, Some(10));
        assert!(state.status_message.is_some());
    }

    #[test]
    fn comparison_defaults_to_first_numeric_field() {
        let mut state = AppState::default();
        state.set_table(flows());
        let controls = state.controls.as_ref().unwrap();
        assert_eq!(controls.field.as_deref(), Some("revenue"));
        assert_eq!(controls.anchors, [date("2021-01-01"), date("2021-02-14")]);
        assert_eq!(controls.labels, ["Jan 2021".to_string(), "Feb 2021".to_string()]);
        let distribution = state.distribution.as_ref().unwrap();
        assert_eq!(distribution.series[0].values.len(), 30);
    }

    #[test]
    fn bad_dropdown_reports_error() {
        let config = ChartConfig {
            dropdown_tag: "region".into(),
            ..ChartConfig::default()
        };
        let mut state = AppState::new(config);
        state.set_table(flows());
        assert!(state.chart.is_none());
        assert_eq!(
            state.status_message.as_deref(),
            Some("Error: column 'region' not found")
        );
    }

    #[test]
    fn controls_round_trip_through_request() {
        let controls = ComparisonControls::for_table(&flows());
        let request = controls.request().unwrap();
        assert_eq!(request.threshold, f64::NEG_INFINITY);
        assert_eq!(ComparisonControls::from_request(&request).unwrap(), controls);
    }
}
