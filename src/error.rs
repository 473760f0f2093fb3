use thiserror::Error;

/// Every failure the trainer can surface. None of them are retried or
/// recovered from inside the crate; they propagate to the caller.
#[derive(Debug, Error)]
pub enum NnError {
    #[error("shape mismatch in {op}: left is {}x{}, right is {}x{}", left.0, left.1, right.0, right.1)]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("backward called without the matching forward pass")]
    NoForwardPass,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, NnError>;

impl NnError {
    pub(crate) fn shape(op: &'static str, left: (usize, usize), right: (usize, usize)) -> NnError {
        NnError::ShapeMismatch { op, left, right }
    }
}
