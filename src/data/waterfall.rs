//! Waterfall geometry and the dropdown-waterfall chart description.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ChartDataError, Result};
use super::model::{CellValue, Table};
use super::selection::{build_selections, reshape_entries, DisplayRecord, Precision, SelectionRecord};

/// How a waterfall step treats its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Reset the running total to the value.
    Absolute,
    /// Add the value to the running total.
    Relative,
    /// Show the running total; the step's own value is ignored.
    Total,
}

impl FromStr for Measure {
    type Err = ChartDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "absolute" => Ok(Measure::Absolute),
            "relative" => Ok(Measure::Relative),
            "total" => Ok(Measure::Total),
            other => Err(ChartDataError::InvalidArgument(format!(
                "unknown waterfall measure '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Absolute => write!(f, "absolute"),
            Measure::Relative => write!(f, "relative"),
            Measure::Total => write!(f, "total"),
        }
    }
}

/// Default measures: the first step absolute, every later step relative.
pub fn default_measures(n: usize) -> Vec<Measure> {
    (0..n)
        .map(|i| if i == 0 { Measure::Absolute } else { Measure::Relative })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BarDirection {
    Increasing,
    Decreasing,
    Total,
}

/// One floating bar of a waterfall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallBar {
    pub label: String,
    pub base: f64,
    pub end: f64,
    pub direction: BarDirection,
}

impl WaterfallBar {
    /// Signed height from base to end.
    pub fn height(&self) -> f64 {
        self.end - self.base
    }
}

/// Lay out waterfall bars for aligned labels, measures and values.
pub fn waterfall_bars(
    labels: &[String],
    measures: &[Measure],
    values: &[CellValue],
) -> Result<Vec<WaterfallBar>> {
    if labels.len() != measures.len() || labels.len() != values.len() {
        return Err(ChartDataError::InvalidArgument(format!(
            "{} labels, {} measures and {} values must align",
            labels.len(),
            measures.len(),
            values.len()
        )));
    }

    let mut total = 0.0;
    let mut bars = Vec::with_capacity(labels.len());
    for ((label, measure), value) in labels.iter().zip(measures).zip(values) {
        let (base, end, direction) = match measure {
            Measure::Total => (0.0, total, BarDirection::Total),
            Measure::Absolute | Measure::Relative => {
                // a missing step is drawn flat
                let v = if value.is_missing() {
                    0.0
                } else {
                    value.as_f64().ok_or_else(|| {
                        ChartDataError::TypeMismatch(format!("'{value}' at '{label}'"))
                    })?
                };
                let base = if *measure == Measure::Absolute { 0.0 } else { total };
                let end = base + v;
                let direction = if v < 0.0 {
                    BarDirection::Decreasing
                } else {
                    BarDirection::Increasing
                };
                (base, end, direction)
            }
        };
        total = end;
        bars.push(WaterfallBar {
            label: label.clone(),
            base,
            end,
            direction,
        });
    }
    Ok(bars)
}

// ---------------------------------------------------------------------------
// WaterfallChart – everything the renderer needs for a dropdown waterfall
// ---------------------------------------------------------------------------

/// A waterfall with a dropdown of alternative slices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallChart {
    pub title: Option<String>,
    pub dropdown_tag: String,
    pub measures: Vec<Measure>,
    /// The initially displayed row.
    pub initial: DisplayRecord,
    /// One entry per value of the dropdown column, in row order.
    pub selections: Vec<SelectionRecord>,
}

impl WaterfallChart {
    /// Compose selections and the initial record from `table`.
    ///
    /// The dropdown list is every value of `dropdown_tag` in row order,
    /// duplicates included. `initial_row` indexes into `table`.
    pub fn build(
        table: &Table,
        dropdown_tag: &str,
        measures: &[Measure],
        initial_row: usize,
        precision: Precision,
        title: Option<String>,
    ) -> Result<Self> {
        let dropdown_list = table.column(dropdown_tag)?;
        let selections = build_selections(&dropdown_list, table, dropdown_tag, precision)?;

        let row = table.row_entries(initial_row).ok_or_else(|| {
            ChartDataError::InvalidArgument(format!(
                "initial row {initial_row} out of range for {} rows",
                table.len()
            ))
        })?;
        let initial = reshape_entries(&row, table.columns(), dropdown_tag, precision)?;

        if measures.len() != initial.x_labels.len() {
            return Err(ChartDataError::InvalidArgument(format!(
                "{} measures for {} plotted columns",
                measures.len(),
                initial.x_labels.len()
            )));
        }

        Ok(WaterfallChart {
            title,
            dropdown_tag: dropdown_tag.to_string(),
            measures: measures.to_vec(),
            initial,
            selections,
        })
    }

    /// Bars for the initial record.
    pub fn initial_bars(&self) -> Result<Vec<WaterfallBar>> {
        waterfall_bars(&self.initial.x_labels, &self.measures, &self.initial.y_values)
    }

    /// Display record for dropdown entry `i`, restyling the initial one.
    ///
    /// Returns `None` when `i` is out of range or the selection matched no rows.
    pub fn selection_record(&self, i: usize) -> Option<DisplayRecord> {
        let (values, text) = self.selections.get(i)?.as_row()?;
        Some(DisplayRecord {
            x_labels: self.initial.x_labels.clone(),
            y_values: values.to_vec(),
            disp_values: text.to_vec(),
        })
    }
}
