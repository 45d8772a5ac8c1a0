use chrono::NaiveDate;

use super::error::{ChartDataError, Result};
use super::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Row filters: each returns a new table, the source is left untouched
// ---------------------------------------------------------------------------

/// Rows whose index lies in `(start, end]`.
///
/// The lower bound is exclusive and the upper bound inclusive, so two
/// adjacent windows sharing a boundary never count a row twice.
pub fn filter_date_range(table: &Table, start: NaiveDate, end: NaiveDate) -> Table {
    let rows = table
        .rows()
        .iter()
        .filter(|row| start < row.index && row.index <= end)
        .cloned()
        .collect();
    Table::from_validated(table.columns().to_vec(), rows)
}

/// Rows where `column` equals `value`.
pub fn rows_where_eq(table: &Table, column: &str, value: &CellValue) -> Result<Table> {
    let pos = table.column_position(column)?;
    let rows = table
        .rows()
        .iter()
        .filter(|row| row.cells[pos] == *value)
        .cloned()
        .collect();
    Ok(Table::from_validated(table.columns().to_vec(), rows))
}

/// Copy of the table without `column`.
pub fn drop_column(table: &Table, column: &str) -> Result<Table> {
    let pos = table.column_position(column)?;
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pos)
        .map(|(_, c)| c.clone())
        .collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.cells.remove(pos);
            row
        })
        .collect();
    Ok(Table::from_validated(columns, rows))
}

/// Numeric values of `column`, skipping missing cells and values below
/// `threshold`.
///
/// A cell that is neither numeric nor missing is a `TypeMismatch`.
pub fn numeric_values_at_least(table: &Table, column: &str, threshold: f64) -> Result<Vec<f64>> {
    let pos = table.column_position(column)?;
    let mut out = Vec::with_capacity(table.len());
    for row in table.rows() {
        let cell = &row.cells[pos];
        if cell.is_missing() {
            continue;
        }
        let v = cell
            .as_f64()
            .ok_or_else(|| ChartDataError::TypeMismatch(format!("'{cell}' in column '{column}'")))?;
        if v >= threshold {
            out.push(v);
        }
    }
    Ok(out)
}
