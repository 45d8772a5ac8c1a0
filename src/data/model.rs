use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::error::{ChartDataError, Result};

/// Date format used for date cells and the window generator.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Used as a `BTreeSet` key downstream, so `CellValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format(ISO_DATE_FORMAT)),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Date(d) => serializer.collect_str(&d.format(ISO_DATE_FORMAT)),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl From<NaiveDate> for CellValue {
    fn from(v: NaiveDate) -> Self {
        CellValue::Date(v)
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. Only integers and floats qualify.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Missing data: an explicit null or a NaN float.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Row – one indexed row of a table
// ---------------------------------------------------------------------------

/// A single row: its date index plus one cell per table column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub index: NaiveDate,
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(index: NaiveDate, cells: Vec<CellValue>) -> Self {
        Row { index, cells }
    }
}

// ---------------------------------------------------------------------------
// Table – date-indexed rows with named columns
// ---------------------------------------------------------------------------

/// A date-indexed table with uniquely named columns.
///
/// Every transformation borrows the table and returns new owned data; a
/// `Table` is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, checking column uniqueness and row widths.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(ChartDataError::InvalidArgument(format!(
                    "duplicate column name '{col}'"
                )));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.cells.len() != columns.len() {
                return Err(ChartDataError::InvalidArgument(format!(
                    "row {i} has {} cells but the table has {} columns",
                    row.cells.len(),
                    columns.len()
                )));
            }
        }
        Ok(Table { columns, rows })
    }

    /// Rows already known to match `columns` (e.g. a subset of another table).
    pub(crate) fn from_validated(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Table { columns, rows }
    }

    /// Ordered column names (the index is not a column).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, or `NotFound`.
    pub fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ChartDataError::NotFound(name.to_string()))
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<CellValue>> {
        let pos = self.column_position(name)?;
        Ok(self.rows.iter().map(|r| r.cells[pos].clone()).collect())
    }

    /// The row at `i` as ordered `(column, value)` pairs.
    pub fn row_entries(&self, i: usize) -> Option<Vec<(String, CellValue)>> {
        let row = self.rows.get(i)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.cells.iter().cloned())
                .collect(),
        )
    }

    /// Sorted set of distinct values in a column.
    pub fn unique_values(&self, name: &str) -> Result<BTreeSet<CellValue>> {
        Ok(self.column(name)?.into_iter().collect())
    }

    /// Columns holding at least one number and otherwise only numbers or nulls.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(pos, _)| {
                let mut any_number = false;
                for row in &self.rows {
                    match &row.cells[*pos] {
                        CellValue::Integer(_) | CellValue::Float(_) => any_number = true,
                        CellValue::Null => {}
                        _ => return false,
                    }
                }
                any_number
            })
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Copy of the table with the index materialised as a leading date column.
    pub fn with_index_column(&self, name: &str) -> Result<Table> {
        if self.columns.iter().any(|c| c == name) {
            return Err(ChartDataError::InvalidArgument(format!(
                "duplicate column name '{name}'"
            )));
        }
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(name.to_string());
        columns.extend(self.columns.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = Vec::with_capacity(r.cells.len() + 1);
                cells.push(CellValue::Date(r.index));
                cells.extend(r.cells.iter().cloned());
                Row::new(r.index, cells)
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// First and last index values, if any rows exist.
    pub fn index_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.index).min()?;
        let max = self.rows.iter().map(|r| r.index).max()?;
        Some((min, max))
    }
}
