//! Distribution comparison of one field across two date windows.

use serde::{Deserialize, Serialize};

use super::dates::{date_windows, DateWindows};
use super::error::{ChartDataError, Result};
use super::filter::{filter_date_range, numeric_values_at_least};
use super::model::Table;

/// Parameters of a two-timeframe comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Numeric column to compare.
    pub field: String,
    /// Two `YYYY-MM-DD` anchor dates.
    pub anchors: [String; 2],
    pub offset_days: u32,
    /// Values below this are dropped.
    #[serde(default = "neg_infinity")]
    pub threshold: f64,
    /// Legend labels, one per anchor.
    pub labels: [String; 2],
    pub bin_size: f64,
}

fn neg_infinity() -> f64 {
    f64::NEG_INFINITY
}

/// One side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSeries {
    pub label: String,
    pub windows: DateWindows,
    pub values: Vec<f64>,
    pub histogram: Histogram,
}

/// Both series, ready for the distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionComparison {
    pub field: String,
    pub bin_size: f64,
    pub series: [ComparisonSeries; 2],
}

impl ComparisonRequest {
    /// Window each anchor, keep the field's values in `(window2_start,
    /// window2_end]` at or above the threshold, and bin them.
    pub fn run(&self, table: &Table) -> Result<DistributionComparison> {
        check_bin_size(self.bin_size)?;
        let first = self.series(table, 0)?;
        let second = self.series(table, 1)?;
        Ok(DistributionComparison {
            field: self.field.clone(),
            bin_size: self.bin_size,
            series: [first, second],
        })
    }

    fn series(&self, table: &Table, i: usize) -> Result<ComparisonSeries> {
        let windows = date_windows(&self.anchors[i], self.offset_days)?;
        let after = filter_date_range(table, windows.window2_start, windows.window2_end);
        let values = numeric_values_at_least(&after, &self.field, self.threshold)?;
        let histogram = Histogram::from_values(&values, self.bin_size)?;
        Ok(ComparisonSeries {
            label: self.labels[i].clone(),
            windows,
            values,
            histogram,
        })
    }
}

fn check_bin_size(bin_size: f64) -> Result<()> {
    if bin_size.is_finite() && bin_size > 0.0 {
        Ok(())
    } else {
        Err(ChartDataError::InvalidArgument(format!(
            "bin size must be a positive number, got {bin_size}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Upper bound on the number of bins one histogram may hold.
pub const MAX_BINS: usize = 100_000;

/// Fixed-width histogram with bins aligned to multiples of the bin size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bin_size: f64,
    /// Left edge of the first bin.
    pub start: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values`; bin `k` covers `[start + k*size, start + (k+1)*size)`.
    pub fn from_values(values: &[f64], bin_size: f64) -> Result<Self> {
        check_bin_size(bin_size)?;
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min > max {
            return Ok(Histogram {
                bin_size,
                start: 0.0,
                counts: Vec::new(),
            });
        }

        let first_bin = (min / bin_size).floor();
        let last_bin = (max / bin_size).floor();
        let span = last_bin - first_bin;
        if !span.is_finite() || span >= MAX_BINS as f64 {
            return Err(ChartDataError::InvalidArgument(format!(
                "bin size {bin_size} over [{min}, {max}] needs more than {MAX_BINS} bins"
            )));
        }
        let n_bins = span as usize + 1;
        let mut counts = vec![0usize; n_bins];
        for v in values.iter().copied().filter(|v| v.is_finite()) {
            let k = ((v / bin_size).floor() - first_bin) as usize;
            counts[k.min(n_bins - 1)] += 1;
        }
        Ok(Histogram {
            bin_size,
            start: first_bin * bin_size,
            counts,
        })
    }

    /// `(bin centre, count)` for every bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(k, &c)| (self.start + (k as f64 + 0.5) * self.bin_size, c))
    }

    /// Total number of binned values.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}
