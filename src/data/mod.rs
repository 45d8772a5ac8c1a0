//! Data layer: core types, loading, and the chart-shaping transformations.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Table (date index + named columns)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐      ┌──────────┐
//!   │  filter   │ ◀── │  dates    │  (start, end] rows, window quadruples
//!   └──────────┘      └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐     ┌───────────┐
//!   │ selection  │ ──▶ │ waterfall  │  dropdown slices, display records, bars
//!   └───────────┘     └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ compare   │  two after-windows of one field → histograms
//!   └──────────┘
//! ```
//!
//! Everything below `loader` is pure: inputs are borrowed, outputs are new.

pub mod compare;
pub mod dates;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod selection;
pub mod waterfall;

pub use error::ChartDataError;
