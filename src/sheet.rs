//! Table store.
//!
//! A [`Sheet`] owns the fixed header order and the ordered rows. Every row
//! holds exactly one cell per header, and every row carries a [`RowId`] that
//! survives filtering, deletion of other rows, and undo/redo.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    autofill::{self, CellWrite},
    columns::ColumnClassifier,
    data::{CellValue, Row, RowId},
    error::{Result, SheetError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Row>,
    next_id: u64,
}

/// Result of a cell edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Row index was out of range; nothing changed.
    Ignored,
    /// Every write that landed, the edited cell first.
    Applied(Vec<CellWrite>),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }
}

impl Sheet {
    pub fn new(headers: Vec<String>) -> Result<Self> {
        if headers.is_empty() {
            return Err(SheetError::EmptyHeaders);
        }
        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(SheetError::DuplicateHeader(header.clone()));
            }
        }
        Ok(Self {
            headers,
            rows: Vec::new(),
            next_id: 0,
        })
    }

    /// Builds a sheet from decoded records, filling absent trailing cells
    /// with empty values.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Result<Self> {
        let mut sheet = Sheet::new(headers)?;
        for record in records {
            if record.len() > sheet.width() {
                return Err(SheetError::HeaderMismatch {
                    expected: sheet.width(),
                    found: record.len(),
                });
            }
            let id = sheet.allocate_id();
            let mut row = Row::blank(id, sheet.width());
            for (cell, raw) in row.cells.iter_mut().zip(record.iter()) {
                *cell = CellValue::from_input(raw);
            }
            sheet.rows.push(row);
        }
        Ok(sheet)
    }

    /// Re-checks header uniqueness, row arity and row ids, e.g. after
    /// deserializing. Ids must be unique and below the next id to hand out.
    pub fn validate(&self) -> Result<()> {
        let fresh = Sheet::new(self.headers.clone())?;
        let mut ids = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.cells.len() != fresh.width() {
                return Err(SheetError::HeaderMismatch {
                    expected: fresh.width(),
                    found: row.cells.len(),
                });
            }
            if row.id.0 >= self.next_id {
                return Err(SheetError::RowIdAhead {
                    id: row.id,
                    next: self.next_id,
                });
            }
            if !ids.insert(row.id) {
                return Err(SheetError::DuplicateRowId(row.id));
            }
        }
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == column)
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Current position of the row with `id`, if it still exists.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn cell(&self, index: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(index)?.get(col)
    }

    /// Writes `value` into `column` of the row at `index`.
    ///
    /// Edits to the composite input column that contain a `-` also write the
    /// derived auto-fill values into the same row.
    pub fn apply(
        &mut self,
        classifier: &dyn ColumnClassifier,
        index: usize,
        column: &str,
        value: &str,
    ) -> Result<EditOutcome> {
        let col = self
            .column_index(column)
            .ok_or_else(|| SheetError::UnknownColumn(column.to_string()))?;
        if index >= self.rows.len() {
            debug!(
                "Ignoring edit of row {index}; sheet has {} row(s)",
                self.rows.len()
            );
            return Ok(EditOutcome::Ignored);
        }

        let mut writes = vec![CellWrite {
            column: col,
            value: CellValue::from_input(value),
        }];
        if classifier.is_composite_input(&self.headers, column) && autofill::has_separator(value) {
            writes.extend(autofill::derive_writes(
                classifier,
                &self.headers,
                column,
                value,
            ));
        }

        let row = &mut self.rows[index];
        for write in &writes {
            row.cells[write.column] = write.value.clone();
        }
        Ok(EditOutcome::Applied(writes))
    }

    /// Appends a row with every cell empty.
    pub fn add_row(&mut self) -> RowId {
        let id = self.allocate_id();
        self.rows.push(Row::blank(id, self.headers.len()));
        id
    }

    /// Removes the row at `index`. Later rows shift down by one.
    pub fn delete_row(&mut self, index: usize) -> Option<Row> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    pub fn delete_row_by_id(&mut self, id: RowId) -> Result<Row> {
        let index = self.position_of(id).ok_or(SheetError::UnknownRow(id))?;
        Ok(self.rows.remove(index))
    }

    /// Replaces the contents with `snapshot`. Row ids handed out later stay
    /// unique even if the snapshot predates rows created since.
    pub fn restore(&mut self, snapshot: Sheet) {
        let next_id = self.next_id.max(snapshot.next_id);
        *self = snapshot;
        self.next_id = next_id;
    }

    /// Every value in `column`, in row order.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |row| row.get(col))
    }

    fn allocate_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }
}
