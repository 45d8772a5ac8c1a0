//! End-to-end checks through the public library API: load a table from
//! disk, build the dropdown waterfall and run a timeframe comparison.

use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use rusty_waterfall::config::ChartConfig;
use rusty_waterfall::data::compare::ComparisonRequest;
use rusty_waterfall::data::dates::{date_windows, human_date_labels};
use rusty_waterfall::data::filter::filter_date_range;
use rusty_waterfall::data::loader::load_file;
use rusty_waterfall::data::model::CellValue;
use rusty_waterfall::data::selection::{build_selections, reshape_row, Precision};
use rusty_waterfall::data::waterfall::{Measure, WaterfallChart};
use tempfile::TempDir;

/// Monthly books for 2021, one row per month end.
fn write_monthly_csv(dir: &TempDir) -> PathBuf {
    let mut csv = String::from("month,opening,sales,costs,closing\n");
    let mut opening = 500.0;
    for m in 1..=12u32 {
        let month_end = NaiveDate::from_ymd_opt(2021, m, 1)
            .unwrap()
            .checked_add_months(chrono::Months::new(1))
            .unwrap()
            .pred_opt()
            .unwrap();
        let sales = 100.0 + f64::from(m) * 10.125;
        let costs = -80.0;
        let closing = opening + sales + costs;
        csv.push_str(&format!(
            "{},{opening},{sales},{costs},{closing}\n",
            month_end.format("%Y-%m-%d")
        ));
        opening = closing;
    }
    let path = dir.path().join("monthly.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

#[test]
fn dropdown_waterfall_from_csv() {
    let dir = TempDir::new().unwrap();
    let path = write_monthly_csv(&dir);
    let config = ChartConfig {
        index_column: "month".into(),
        dropdown_tag: "month".into(),
        measures: Some(vec![
            Measure::Absolute,
            Measure::Relative,
            Measure::Relative,
            Measure::Total,
        ]),
        precision: Some(1),
        title: Some("2021".into()),
        comparison: None,
    };

    let table = load_file(&path, &config.index_column)
        .unwrap()
        .with_index_column(&config.dropdown_tag)
        .unwrap();
    assert_eq!(table.len(), 12);

    let chart = WaterfallChart::build(
        &table,
        &config.dropdown_tag,
        &config.measures_for(4),
        0,
        config.precision(),
        config.title.clone(),
    )
    .unwrap();

    assert_eq!(chart.selections.len(), 12);
    assert_eq!(chart.selections[1].label, "2021-02-28");
    assert_eq!(
        chart.initial.x_labels,
        vec!["opening", "sales", "costs", "closing"]
    );
    // 110.125 rounds to even at one decimal
    assert_eq!(chart.initial.disp_values[1], CellValue::Float(110.1));
    assert_eq!(chart.initial.y_values[1], CellValue::Float(110.125));

    let bars = chart.initial_bars().unwrap();
    assert_eq!(bars.last().unwrap().end, 530.125);

    let json = serde_json::to_value(&chart.selections[0]).unwrap();
    assert_eq!(json["label"], "2021-01-31");
    assert_eq!(json["values"][0][0], 500.0);
    assert_eq!(json["text"][0][1], 110.1);
}

#[test]
fn selection_builder_is_pure_and_ordered() {
    let dir = TempDir::new().unwrap();
    let table = load_file(&write_monthly_csv(&dir), "month")
        .unwrap()
        .with_index_column("month")
        .unwrap();
    let snapshot = table.clone();

    let mut selectors = table.column("month").unwrap();
    selectors.reverse();
    let first = build_selections(&selectors, &table, "month", Precision::Rounded(2)).unwrap();
    let second = build_selections(&selectors, &table, "month", Precision::Rounded(2)).unwrap();

    assert_eq!(first.len(), selectors.len());
    assert_eq!(first[0].label, "2021-12-31");
    assert_eq!(first, second);
    assert_eq!(table, snapshot);
}

#[test]
fn reshaping_a_row_leaves_caller_labels_alone() {
    let labels: Vec<String> = ["a", "b", "date"].iter().map(|s| s.to_string()).collect();
    let values = vec![
        CellValue::Integer(1),
        CellValue::Integer(2),
        CellValue::from("2021-01-01"),
    ];
    let record = reshape_row(&values, &labels, "date", Precision::Exact).unwrap();
    assert_eq!(record.x_labels, vec!["a", "b"]);
    assert_eq!(record.disp_values, vec![CellValue::Integer(1), CellValue::Integer(2)]);
    assert_eq!(labels, vec!["a", "b", "date"]);
}

#[test]
fn windows_and_range_filter_agree_on_boundaries() {
    let dir = TempDir::new().unwrap();
    let table = load_file(&write_monthly_csv(&dir), "month").unwrap();

    let windows = date_windows("2021-03-31", 61).unwrap();
    assert_eq!(
        windows.window2_start,
        NaiveDate::from_ymd_opt(2021, 5, 31).unwrap()
    );
    // (05-31, 07-31]: June and July, not May
    let after = filter_date_range(&table, windows.window2_start, windows.window2_end);
    let months: Vec<String> = after
        .rows()
        .iter()
        .map(|r| r.index.format("%Y-%m-%d").to_string())
        .collect();
    assert_eq!(months, vec!["2021-06-30", "2021-07-31"]);

    let labels = human_date_labels(&months, "%Y-%m-%d").unwrap();
    assert_eq!(labels, vec!["Jun 2021", "Jul 2021"]);
}

#[test]
fn comparison_over_daily_json() {
    let dir = TempDir::new().unwrap();
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let records: Vec<serde_json::Value> = (0..120u64)
        .map(|d| {
            let day = start.checked_add_days(Days::new(d)).unwrap();
            let visits = if d % 7 == 0 {
                serde_json::Value::Null
            } else {
                serde_json::Value::from(d % 10)
            };
            serde_json::json!({
                "day": day.format("%Y-%m-%d").to_string(),
                "visits": visits,
            })
        })
        .collect();
    let path = dir.path().join("daily.json");
    std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

    let table = load_file(&path, "day").unwrap();
    let request = ComparisonRequest {
        field: "visits".into(),
        anchors: ["2022-01-10".into(), "2022-03-01".into()],
        offset_days: 14,
        threshold: 3.0,
        labels: ["Jan".into(), "Mar".into()],
        bin_size: 5.0,
    };
    let out = request.run(&table).unwrap();

    for series in &out.series {
        assert!(series.values.iter().all(|v| *v >= 3.0));
        assert_eq!(series.histogram.total(), series.values.len());
        assert!(series.windows.window2_end > series.windows.window2_start);
    }
    assert_eq!(out.series[0].label, "Jan");
    assert_eq!(out.bin_size, 5.0);
}

#[test]
fn gaps_in_plotted_columns_still_chart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gappy.csv");
    std::fs::write(&path, "date,a,b\n2021-01-01,1.234,2\n2021-02-01,,3\n").unwrap();

    let table = load_file(&path, "date")
        .unwrap()
        .with_index_column("date")
        .unwrap();
    let chart = WaterfallChart::build(
        &table,
        "date",
        &[Measure::Absolute, Measure::Relative],
        1,
        Precision::Rounded(1),
        None,
    )
    .unwrap();

    assert_eq!(chart.initial.disp_values, vec![CellValue::Null, CellValue::Float(3.0)]);
    assert_eq!(chart.selections[0].text[0], vec![CellValue::Float(1.2), CellValue::Float(2.0)]);
    let bars = chart.initial_bars().unwrap();
    assert_eq!(bars[0].end, 0.0);
    assert_eq!(bars[1].end, 3.0);
}
