//! Reshape date-indexed tables into waterfall and distribution-comparison
//! chart data.

pub mod config;
pub mod data;
