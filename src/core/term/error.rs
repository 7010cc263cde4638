//! Terminal error types
//!
//! Only caller mistakes surface as errors. Malformed or unsupported input is
//! logged and absorbed by the interpreter instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("Invalid screen dimensions: {columns}x{rows}")]
    InvalidDimensions { columns: usize, rows: usize },

    #[error("Cell ({row}, {col}) is outside the {columns}x{rows} screen")]
    CellOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        columns: usize,
    },

    #[error("Row {row} is outside a screen of {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("Offset {offset} is outside a screen of {len} cells")]
    OffsetOutOfRange { offset: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, TermError>;
