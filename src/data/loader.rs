use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    UInt16Type, UInt32Type, UInt8Type,
};
use chrono::{DateTime, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::dates::parse_date;
use super::model::{CellValue, Row, Table, ISO_DATE_FORMAT};

/// Formats accepted for index cells, tried in order.
pub const INDEX_DATE_FORMATS: &[&str] = &[
    ISO_DATE_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%d/%m/%Y",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file, using `index_column` as the date index.
/// Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Parquet file with scalar columns
/// * `.json`    – `[{ "date": "2021-01-31", "revenue": 10.5, ... }, ...]`
/// * `.csv`     – header row, one row per record
pub fn load_file(path: &Path, index_column: &str) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, index_column),
        "json" => load_json(path, index_column),
        "csv" => load_csv(path, index_column),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "{}: {} rows, columns {:?}, index span {:?}",
        path.display(),
        table.len(),
        table.columns(),
        table.index_span()
    );
    Ok(table)
}

/// Parse an index cell under any of [`INDEX_DATE_FORMATS`].
pub fn parse_index_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    INDEX_DATE_FORMATS
        .iter()
        .find_map(|fmt| parse_date(s, fmt).ok())
        .with_context(|| format!("'{s}' is not a recognised date"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "date": "2021-01-31", "revenue": 120.5, "cost": -80.0, "period": "q1" },
///   ...
/// ]
/// ```
///
/// The index may be a date string (`date_format='iso'` writes
/// `2021-01-31T00:00:00.000`) or integer milliseconds since the epoch (the
/// `date_format='epoch'` default). Column order follows first appearance
/// across records; keys missing from a record become nulls.
fn load_json(path: &Path, index_column: &str) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if key != index_column && !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let index = match obj.get(index_column) {
            Some(JsonValue::String(s)) => parse_index_date(s).with_context(|| format!("Row {i}"))?,
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .and_then(epoch_millis_to_date)
                .with_context(|| format!("Row {i}: '{n}' is not epoch milliseconds"))?,
            _ => bail!("Row {i}: missing or non-date '{index_column}'"),
        };

        let cells = columns
            .iter()
            .map(|col| obj.get(col).map_or(CellValue::Null, json_to_cell))
            .collect();
        rows.push(Row::new(index, cells));
    }

    Ok(Table::new(columns, rows)?)
}

fn epoch_millis_to_date(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => guess_cell_type(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one of which is the index.
/// Every other column is type-guessed cell by cell.
fn load_csv(path: &Path, index_column: &str) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let index_idx = headers
        .iter()
        .position(|h| h == index_column)
        .with_context(|| format!("CSV missing '{index_column}' column"))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let index = parse_index_date(record.get(index_idx).unwrap_or(""))
            .with_context(|| format!("CSV row {row_no}"))?;

        let cells = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_idx)
            .map(|(_, value)| guess_cell_type(value))
            .collect();

        rows.push(Row::new(index, cells));
    }

    Ok(Table::new(columns, rows)?)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, ISO_DATE_FORMAT) {
        return CellValue::Date(d);
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.
///
/// Expected schema:
/// - the index column: Utf8 dates, Date32/Date64 or a Timestamp
/// - any other columns: strings, ints, floats, bools, dates or timestamps
///   (timestamps are read as their calendar date); anything else is kept
///   as its display text
///
/// Works with files written by both **Pandas** (`df.to_parquet()` after
/// `reset_index()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, index_column: &str) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let index_idx = schema
        .index_of(index_column)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{index_column}' column"))?;
    let columns: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index_idx)
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let index_col = batch.column(index_idx);
        let index_dates = index_as_dates(index_col)?;
        let value_cols = columns
            .iter()
            .map(|(col_idx, name)| {
                normalise_column(batch.column(*col_idx))
                    .with_context(|| format!("reading column '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        for (row, index) in index_dates.into_iter().enumerate() {
            let index = index.with_context(|| format!("Row {row}: null or invalid index"))?;
            let cells = value_cols
                .iter()
                .map(|col| extract_cell_value(col, row))
                .collect();
            rows.push(Row::new(index, cells));
        }
    }

    let columns = columns.into_iter().map(|(_, name)| name).collect();
    Ok(Table::new(columns, rows)?)
}

// -- Parquet / Arrow helpers --

/// Read the index column as dates, one entry per row.
fn index_as_dates(col: &ArrayRef) -> Result<Vec<Option<NaiveDate>>> {
    match col.data_type() {
        DataType::Utf8 => Ok(col
            .as_string::<i32>()
            .iter()
            .map(|s| s.and_then(|s| parse_index_date(s).ok()))
            .collect()),
        DataType::LargeUtf8 => Ok(col
            .as_string::<i64>()
            .iter()
            .map(|s| s.and_then(|s| parse_index_date(s).ok()))
            .collect()),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let dates = cast(col, &DataType::Date32).context("casting index to Date32")?;
            let dates = dates.as_primitive::<Date32Type>();
            Ok((0..dates.len())
                .map(|i| {
                    if dates.is_null(i) {
                        None
                    } else {
                        dates.value_as_date(i)
                    }
                })
                .collect())
        }
        other => bail!("Index column has type {other:?}, expected strings, dates or timestamps"),
    }
}

/// Temporal columns other than Date32 become Date32.
fn normalise_column(col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Date64 | DataType::Timestamp(_, _) => {
            Ok(cast(col, &DataType::Date32).context("casting to Date32")?)
        }
        _ => Ok(col.clone()),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map_or(CellValue::Null, CellValue::Date),
        _ => ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
            .map_or(CellValue::Null, |f| CellValue::String(f.value(row).to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, StringArray, TimestampNanosecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_promotes_index_and_guesses_types() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "flows.csv",
            "revenue,date,cost,period,closed\n\
             100,2021-01-31,-40.5,q1,true\n\
             120.25,2021-02-28,,q1,false\n",
        );
        let table = load_file(&path, "date").unwrap();
        assert_eq!(table.columns(), &["revenue", "cost", "period", "closed"].map(String::from)[..]);
        assert_eq!(table.rows()[1].index, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
        assert_eq!(
            table.rows()[0].cells,
            vec![
                CellValue::Integer(100),
                CellValue::Float(-40.5),
                CellValue::from("q1"),
                CellValue::Bool(true),
            ]
        );
        assert_eq!(table.rows()[1].cells[1], CellValue::Null);
    }

    #[test]
    fn csv_without_index_column_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "flows.csv", "a,b\n1,2\n");
        let err = load_file(&path, "date").unwrap_err();
        assert!(format!("{err:#}").contains("missing 'date'"));
    }

    #[test]
    fn csv_bad_index_reports_row() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "flows.csv", "date,a\n2021-01-01,1\nyesterday,2\n");
        let err = load_file(&path, "date").unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn json_keeps_key_order_and_fills_gaps() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "flows.json",
            r#"[
                {"date": "2021-01-31T00:00:00", "start": 10, "delta": 2.5, "label": "2021-01-31"},
                {"date": "2021-02-28T00:00:00", "start": 12, "extra": null}
            ]"#,
        );
        let table = load_file(&path, "date").unwrap();
        assert_eq!(
            table.columns(),
            &["start", "delta", "label", "extra"].map(String::from)[..]
        );
        assert_eq!(
            table.rows()[0].cells[2],
            CellValue::Date(NaiveDate::from_ymd_opt(2021, 1, 31).unwrap())
        );
        assert_eq!(table.rows()[1].cells[1], CellValue::Null);
    }

    #[test]
    fn parquet_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flows.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("revenue", DataType::Float64, true),
            Field::new("period", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![18_628, 18_656])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
                Arc::new(StringArray::from(vec!["q1", "q1"])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path, "date").unwrap();
        assert_eq!(table.columns(), &["revenue", "period"].map(String::from)[..]);
        assert_eq!(table.rows()[0].index, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(table.rows()[1].cells, vec![CellValue::Null, "q1".into()]);
    }

    #[test]
    fn parquet_timestamp_column_reads_as_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stamps.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("when", DataType::Timestamp(TimeUnit::Nanosecond, None), true),
            Field::new("revenue", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![18_628, 18_659])),
                Arc::new(TimestampNanosecondArray::from(vec![
                    Some(1_612_051_200_000_000_000),
                    None,
                ])),
                Arc::new(Float64Array::from(vec![1.0, 2.0])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path, "date").unwrap();
        assert_eq!(
            table.column("when").unwrap(),
            vec![
                CellValue::Date(NaiveDate::from_ymd_opt(2021, 1, 31).unwrap()),
                CellValue::Null,
            ]
        );
    }

    #[test]
    fn json_reads_pandas_index_dates() {
        let dir = TempDir::new().unwrap();
        let iso = write(
            &dir,
            "iso.json",
            r#"[{"date": "2021-01-31T00:00:00.000", "a": 1},
                {"date": "2021-02-28T00:00:00.000Z", "a": 2}]"#,
        );
        let table = load_file(&iso, "date").unwrap();
        assert_eq!(table.rows()[0].index, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        assert_eq!(table.rows()[1].index, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());

        // 2021-01-31 and 2021-02-28 in epoch milliseconds
        let epoch = write(
            &dir,
            "epoch.json",
            r#"[{"date": 1612051200000, "a": 1}, {"date": 1614470400000, "a": 2}]"#,
        );
        let table = load_file(&epoch, "date").unwrap();
        assert_eq!(table.rows()[0].index, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        assert_eq!(table.rows()[1].index, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());

        let bad = write(&dir, "bad.json", r#"[{"date": true, "a": 1}]"#);
        let err = load_file(&bad, "date").unwrap_err();
        assert!(format!("{err:#}").contains("Row 0"));
    }

    #[test]
    fn unsupported_extension() {
        assert!(load_file(Path::new("table.xlsx"), "date").is_err());
    }

    #[test]
    fn index_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        for s in [
            "2021-03-01",
            "2021-03-01 12:00:00",
            "2021-03-01T00:00:00",
            "2021-03-01T00:00:00.000",
            "01/03/2021",
        ] {
            assert_eq!(parse_index_date(s).unwrap(), expected);
        }
        assert!(parse_index_date("March 1st").is_err());
    }
}
