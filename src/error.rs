//! Error types for the sheet engine.
//!
//! Only conditions the caller must react to are errors. Malformed formulas,
//! malformed auto-fill patterns, and edits at the history edge degrade to
//! defined fallbacks instead and never surface here.

use thiserror::Error;

use crate::data::RowId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("Column '{0}' is not part of the header set")]
    UnknownColumn(String),

    #[error("Row {0} no longer exists")]
    UnknownRow(RowId),

    #[error("Header '{0}' appears more than once")]
    DuplicateHeader(String),

    #[error("A sheet needs at least one header")]
    EmptyHeaders,

    #[error("Row has {found} cell(s) but the sheet has {expected} header(s)")]
    HeaderMismatch { expected: usize, found: usize },

    #[error("Row {0} appears more than once")]
    DuplicateRowId(RowId),

    #[error("Row {id} is not below the next row id {next}")]
    RowIdAhead { id: RowId, next: u64 },
}

pub type Result<T> = std::result::Result<T, SheetError>;
