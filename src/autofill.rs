//! Pattern-driven auto-fill.
//!
//! A composite input such as `44-89-77` is split into its measurements and
//! written into the matching columns of the same row, plus a combined
//! `44x89x77` output. Missing target columns are skipped with a warning.

use log::{debug, warn};

use crate::{
    columns::{ColumnClassifier, TargetRole},
    data::CellValue,
};

const PART_SEPARATOR: char = '-';
const PAD_WIDTH: usize = 2;

/// A derived write into the edited row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub column: usize,
    pub value: CellValue,
}

/// Whether `value` is shaped like a composite input at all.
pub fn has_separator(value: &str) -> bool {
    value.contains(PART_SEPARATOR)
}

/// Expands an edit of `input_column` into writes for the target columns.
///
/// Returns no writes when the value has fewer than three parts.
pub fn derive_writes(
    classifier: &dyn ColumnClassifier,
    headers: &[String],
    input_column: &str,
    input_value: &str,
) -> Vec<CellWrite> {
    let parts = input_value
        .split(PART_SEPARATOR)
        .map(str::trim)
        .collect::<Vec<_>>();
    if parts.len() < 3 {
        warn!("Auto-fill skipped: expected XX-XX-XX, got '{input_value}'");
        return Vec::new();
    }
    let padded = [pad(parts[0]), pad(parts[1]), pad(parts[2])];

    let mut writes = Vec::with_capacity(4);
    for (role, part) in [
        TargetRole::Primary,
        TargetRole::Secondary,
        TargetRole::Tertiary,
    ]
    .into_iter()
    .zip(padded.iter())
    {
        match classifier.target(headers, role, input_column) {
            Some(column) => {
                debug!("Auto-fill {} -> '{}' = {part}", role.label(), headers[column]);
                writes.push(CellWrite {
                    column,
                    value: CellValue::Text(part.clone()),
                });
            }
            None => warn!("Auto-fill {} column not found", role.label()),
        }
    }

    match classifier.target(headers, TargetRole::Output, input_column) {
        Some(column) => {
            let composite = padded.join("x");
            debug!("Auto-fill output -> '{}' = {composite}", headers[column]);
            writes.push(CellWrite {
                column,
                value: CellValue::Text(composite),
            });
        }
        None => warn!("Auto-fill output column not found"),
    }
    writes
}

fn pad(part: &str) -> String {
    format!("{part:0>width$}", width = PAD_WIDTH)
}
