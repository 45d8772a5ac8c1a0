use thiserror::Error;

/// Failures raised by the pure table transformations.
///
/// Loading and configuration use `anyhow` instead; these variants are the
/// ones a caller may want to match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartDataError {
    /// A column or dropdown tag is not present in the labels searched.
    #[error("column '{0}' not found")]
    NotFound(String),

    /// A date string did not parse under the expected format.
    #[error("'{value}' does not match date format '{format}'")]
    InvalidFormat { value: String, format: String },

    /// A numeric operation met a cell that has no numeric interpretation.
    #[error("expected a numeric value, got {0}")]
    TypeMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ChartDataError>;
