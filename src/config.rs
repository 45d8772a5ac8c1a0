use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::compare::ComparisonRequest;
use crate::data::selection::Precision;
use crate::data::waterfall::{default_measures, Measure};

// ---------------------------------------------------------------------------
// Chart configuration (JSON)
// ---------------------------------------------------------------------------

/// Chart settings, read from a JSON file.
///
/// ```json
/// {
///   "index_column": "date",
///   "dropdown_tag": "date",
///   "measures": ["absolute", "relative", "relative", "total"],
///   "precision": 2,
///   "title": "Monthly cash flow",
///   "comparison": {
///     "field": "revenue",
///     "anchors": ["2021-03-01", "2022-03-01"],
///     "offset_days": 30,
///     "threshold": 0.0,
///     "labels": ["2021", "2022"],
///     "bin_size": 5.0
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Column promoted to the date index on load.
    pub index_column: String,
    /// Column whose values populate the dropdown.
    pub dropdown_tag: String,
    /// One per plotted column; defaults to absolute then relative.
    pub measures: Option<Vec<Measure>>,
    /// Decimal places for display values.
    pub precision: Option<u32>,
    pub title: Option<String>,
    pub comparison: Option<ComparisonRequest>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            index_column: "date".to_string(),
            dropdown_tag: "date".to_string(),
            measures: None,
            precision: None,
            title: None,
            comparison: None,
        }
    }
}

impl ChartConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn precision(&self) -> Precision {
        Precision::from(self.precision)
    }

    /// Configured measures, or the default layout for `n` plotted columns.
    pub fn measures_for(&self, n: usize) -> Vec<Measure> {
        self.measures.clone().unwrap_or_else(|| default_measures(n))
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// `rusty-waterfall [DATA_FILE] [--config CONFIG.json]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "rusty-waterfall",
    about = "Dropdown waterfall and timeframe-comparison viewer for date-indexed tables.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct LaunchArgs {
    #[arg(value_name = "DATA_FILE", help = "CSV, JSON or Parquet table to open on launch.")]
    pub data: Option<PathBuf>,
    #[arg(short, long, value_name = "FILE", help = "Chart config (JSON).")]
    pub config: Option<PathBuf>,
}
