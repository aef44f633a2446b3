//! Engine-level error taxonomy (§7), generalized from the teacher's
//! `ServiceError` pattern (`src/error.rs`) into `thiserror`-derived variants
//! with the fatal/non-fatal propagation rule encoded as a method rather than
//! re-derived at every call site.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("file too large: {actual} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { actual: u64, limit: u64 },

    #[error("encoding error on column {column}")]
    EncodingError { column: String },

    #[error("malformed row {row_index}: expected {expected_fields} fields, got {actual_fields}")]
    MalformedRow {
        row_index: u64,
        expected_fields: usize,
        actual_fields: usize,
    },

    #[error("accumulator overflow on column {column}")]
    AccumulatorOverflow { column: String },

    #[error("session cancelled")]
    Cancelled,
}

impl EngineError {
    /// Mirrors the propagation column of the §7 error table.
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::UnsupportedFormat(_)
            | EngineError::MalformedHeader(_)
            | EngineError::FileTooLarge { .. }
            | EngineError::AccumulatorOverflow { .. }
            | EngineError::Cancelled => true,
            EngineError::EncodingError { .. } | EngineError::MalformedRow { .. } => false,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
