use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Days, NaiveDate};
use parquet::arrow::ArrowWriter;

use rusty_waterfall::config::ChartConfig;
use rusty_waterfall::data::compare::ComparisonRequest;
use rusty_waterfall::data::waterfall::Measure;

const DAYS: u64 = 730;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One day of a small shop's books.
struct Day {
    date: NaiveDate,
    opening: f64,
    sales: f64,
    returns: f64,
    expenses: f64,
    tax: f64,
}

fn days_since_epoch(d: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (d - epoch).num_days() as i32
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).context("start date")?;

    let mut balance = 1_000.0;
    let mut days = Vec::with_capacity(DAYS as usize);
    for offset in 0..DAYS {
        let date = start
            .checked_add_days(Days::new(offset))
            .context("date out of range")?;
        // Busier weekends, slow growth in the second year.
        let weekend = matches!(date.weekday().number_from_monday(), 6 | 7);
        let growth = 1.0 + offset as f64 / DAYS as f64 * 0.3;
        let sales = round2(rng.gauss(if weekend { 420.0 } else { 300.0 }, 45.0).max(0.0) * growth);
        let returns = -round2((sales * rng.gauss(0.04, 0.015)).max(0.0));
        let expenses = -round2(rng.gauss(220.0, 25.0).max(0.0));
        let tax = -round2(((sales + returns + expenses) * 0.2).max(0.0));
        let opening = round2(balance);
        balance = opening + sales + returns + expenses + tax;
        days.push(Day {
            date,
            opening,
            sales,
            returns,
            expenses,
            tax,
        });
    }

    let closing: Vec<f64> = days
        .iter()
        .map(|d| round2(d.opening + d.sales + d.returns + d.expenses + d.tax))
        .collect();

    // Write Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("opening", DataType::Float64, false),
        Field::new("sales", DataType::Float64, false),
        Field::new("returns", DataType::Float64, false),
        Field::new("expenses", DataType::Float64, false),
        Field::new("tax", DataType::Float64, false),
        Field::new("closing", DataType::Float64, false),
    ]));

    let column = |f: fn(&Day) -> f64| Float64Array::from(days.iter().map(f).collect::<Vec<_>>());
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Date32Array::from(
                days.iter().map(|d| days_since_epoch(d.date)).collect::<Vec<_>>(),
            )),
            Arc::new(column(|d| d.opening)),
            Arc::new(column(|d| d.sales)),
            Arc::new(column(|d| d.returns)),
            Arc::new(column(|d| d.expenses)),
            Arc::new(column(|d| d.tax)),
            Arc::new(Float64Array::from(closing.clone())),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "sample_data.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    // Write CSV with the same columns
    let csv_path = "sample_data.csv";
    let mut csv_writer = csv::Writer::from_path(csv_path).context("creating CSV file")?;
    csv_writer.write_record([
        "date", "opening", "sales", "returns", "expenses", "tax", "closing",
    ])?;
    for (d, close) in days.iter().zip(&closing) {
        csv_writer.write_record([
            d.date.format("%Y-%m-%d").to_string(),
            d.opening.to_string(),
            d.sales.to_string(),
            d.returns.to_string(),
            d.expenses.to_string(),
            d.tax.to_string(),
            close.to_string(),
        ])?;
    }
    csv_writer.flush().context("flushing CSV")?;

    // Chart config matching the files
    let config = ChartConfig {
        measures: Some(vec![
            Measure::Absolute,
            Measure::Relative,
            Measure::Relative,
            Measure::Relative,
            Measure::Relative,
            Measure::Total,
        ]),
        precision: Some(2),
        title: Some("Daily cash flow".to_string()),
        comparison: Some(ComparisonRequest {
            field: "sales".to_string(),
            anchors: ["2021-03-01".to_string(), "2022-03-01".to_string()],
            offset_days: 30,
            threshold: 0.0,
            labels: ["Mar 2021".to_string(), "Mar 2022".to_string()],
            bin_size: 25.0,
        }),
        ..ChartConfig::default()
    };
    let config_path = "sample_chart.json";
    std::fs::write(config_path, serde_json::to_string_pretty(&config)?)
        .context("writing chart config")?;

    println!("Wrote {DAYS} days to {parquet_path} and {csv_path}, config to {config_path}");
    Ok(())
}
