use serde::Serialize;

use super::error::{ChartDataError, Result};
use super::filter::{drop_column, rows_where_eq};
use super::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Precision – how plotted values are turned into display values
// ---------------------------------------------------------------------------

/// Display precision for plotted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Precision {
    /// Display values are the raw values.
    #[default]
    Exact,
    /// Display values are numeric, rounded to this many decimal places.
    Rounded(u32),
}

impl From<Option<u32>> for Precision {
    fn from(places: Option<u32>) -> Self {
        places.map_or(Precision::Exact, Precision::Rounded)
    }
}

impl Precision {
    /// Apply to a single value.
    pub fn display(&self, value: &CellValue) -> Result<CellValue> {
        match self {
            Precision::Exact => Ok(value.clone()),
            Precision::Rounded(_) if value.is_missing() => Ok(value.clone()),
            Precision::Rounded(places) => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| ChartDataError::TypeMismatch(format!("'{value}'")))?;
                Ok(CellValue::Float(round_to(v, *places)))
            }
        }
    }

    /// Apply to every value, failing on the first non-numeric one. Missing
    /// cells pass through unrounded.
    pub fn display_all(&self, values: &[CellValue]) -> Result<Vec<CellValue>> {
        values.iter().map(|v| self.display(v)).collect()
    }
}

/// Round half to even at `places` decimals, as numeric display rounding does.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places.min(i32::MAX as u32) as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / scale
}

// ---------------------------------------------------------------------------
// Selection records – one dropdown entry per selector value
// ---------------------------------------------------------------------------

/// One dropdown entry: the rows matching a selector, minus the dropdown column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionRecord {
    pub label: String,
    /// Plotted values, one inner vec per matching row.
    pub values: Vec<Vec<CellValue>>,
    /// Display values, same shape as `values`.
    pub text: Vec<Vec<CellValue>>,
}

impl SelectionRecord {
    /// The first matching row as `(values, text)`, if any row matched.
    pub fn as_row(&self) -> Option<(&[CellValue], &[CellValue])> {
        Some((self.values.first()?.as_slice(), self.text.first()?.as_slice()))
    }
}

/// Build one [`SelectionRecord`] per selector, in selector order.
///
/// Fails with `NotFound` when `dropdown_tag` is not a column, and with
/// `TypeMismatch` when rounding meets a non-numeric cell.
pub fn build_selections(
    selectors: &[CellValue],
    table: &Table,
    dropdown_tag: &str,
    precision: Precision,
) -> Result<Vec<SelectionRecord>> {
    table.column_position(dropdown_tag)?;
    selectors
        .iter()
        .map(|selector| {
            let slice = drop_column(&rows_where_eq(table, dropdown_tag, selector)?, dropdown_tag)?;
            let values: Vec<Vec<CellValue>> =
                slice.rows().iter().map(|r| r.cells.clone()).collect();
            let text = values
                .iter()
                .map(|row| precision.display_all(row))
                .collect::<Result<Vec<_>>>()?;
            Ok(SelectionRecord {
                label: selector.to_string(),
                values,
                text,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Display record – a single row reshaped for the initial chart
// ---------------------------------------------------------------------------

/// Aligned labels, values and display values for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub x_labels: Vec<String>,
    pub y_values: Vec<CellValue>,
    pub disp_values: Vec<CellValue>,
}

/// Remove the first `dropdown_tag` entry from `labels` and `values`.
///
/// The inputs are borrowed; the returned record owns fresh copies.
pub fn reshape_row(
    values: &[CellValue],
    labels: &[String],
    dropdown_tag: &str,
    precision: Precision,
) -> Result<DisplayRecord> {
    if values.len() != labels.len() {
        return Err(ChartDataError::InvalidArgument(format!(
            "{} values for {} labels",
            values.len(),
            labels.len()
        )));
    }
    let pos = labels
        .iter()
        .position(|l| l == dropdown_tag)
        .ok_or_else(|| ChartDataError::NotFound(dropdown_tag.to_string()))?;

    let mut x_labels = labels.to_vec();
    let mut y_values = values.to_vec();
    x_labels.remove(pos);
    y_values.remove(pos);
    let disp_values = precision.display_all(&y_values)?;

    Ok(DisplayRecord {
        x_labels,
        y_values,
        disp_values,
    })
}

/// [`reshape_row`] over an ordered `(column, value)` row.
pub fn reshape_entries(
    row: &[(String, CellValue)],
    labels: &[String],
    dropdown_tag: &str,
    precision: Precision,
) -> Result<DisplayRecord> {
    let values: Vec<CellValue> = row.iter().map(|(_, v)| v.clone()).collect();
    reshape_row(&values, labels, dropdown_tag, precision)
}
