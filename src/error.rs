//! Error types for the jump rectification pipeline.

use thiserror::Error;

/// Result type alias for rectifier operations.
pub type Result<T> = std::result::Result<T, RectifierError>;

/// Errors raised by the filter, detector, rectifier and their file collaborators.
///
/// "No jumps found" is deliberately absent: detection and rectification report
/// it through an empty result instead.
#[derive(Error, Debug)]
pub enum RectifierError {
    /// Series too short for the requested filter.
    #[error("Insufficient data: need at least {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Invalid parameter value.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Time and value sequences differ in length.
    #[error("Length mismatch: {times} time samples vs {values} values")]
    LengthMismatch { times: usize, values: usize },

    /// Time axis is not strictly increasing.
    #[error("Time is not strictly increasing at sample {index}")]
    NonIncreasingTime { index: usize },

    /// Detection or rectification requested before the noise filter ran.
    #[error("No filtered data: run a noise filter first")]
    NotFiltered,

    /// Rectification requested before jump detection ran.
    #[error("No jump detection results: run jump detection first")]
    NotDetected,

    /// Malformed line in a sample file.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Generator distribution could not be built.
    #[error("Invalid distribution: {message}")]
    Distribution { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RectifierError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RectifierError::InvalidParameter {
            message: message.into(),
        }
    }
}
