//! Editing session over one loaded sheet.
//!
//! [`Editor`] ties the table store to its undo history and to the view state
//! (filters, search term, card cursor). Every mutation is one synchronous
//! step: write, auto-fill expansion, then a history snapshot.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::{
    columns::{ColumnClassifier, HeaderHeuristics, InputKind},
    data::RowId,
    error::{Result, SheetError},
    filter::{self, FilterSet},
    formula,
    history::{DEFAULT_HISTORY_LIMIT, History},
    session::{SessionEntry, SessionLog, SessionState, SessionStore},
    sheet::{EditOutcome, Sheet},
    suggest::{self, CandidateSource, Suggestions},
};

pub struct Editor {
    sheet: Sheet,
    history: History<Sheet>,
    filters: FilterSet,
    search: String,
    card_view: bool,
    card_index: usize,
    file_name: Option<String>,
    sheets: Vec<String>,
    active_sheet: usize,
    classifier: Box<dyn ColumnClassifier>,
}

impl Editor {
    pub fn new(sheet: Sheet) -> Self {
        Self::with_options(sheet, Box::new(HeaderHeuristics), DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_options(
        sheet: Sheet,
        classifier: Box<dyn ColumnClassifier>,
        history_limit: usize,
    ) -> Self {
        let history = History::with_limit(&sheet, history_limit);
        Self {
            sheet,
            history,
            filters: FilterSet::new(),
            search: String::new(),
            card_view: false,
            card_index: 0,
            file_name: None,
            sheets: Vec::new(),
            active_sheet: 0,
            classifier,
        }
    }

    /// Reopens a stored session. History starts over at the stored state.
    pub fn from_session(
        entry: &SessionEntry,
        classifier: Box<dyn ColumnClassifier>,
        history_limit: usize,
    ) -> Result<Self> {
        let state = &entry.state;
        state.sheet.validate()?;
        let mut editor = Self::with_options(state.sheet.clone(), classifier, history_limit);
        editor.filters = state.filters.clone();
        editor.search = state.search_term.clone();
        editor.card_view = state.card_view;
        editor.card_index = state.card_index;
        editor.file_name = Some(entry.file_name.clone());
        editor.sheets = state.sheets.clone();
        editor.active_sheet = state.active_sheet;
        editor.clamp_card_index();
        info!(
            "Restored session '{}' with {} row(s)",
            entry.file_name,
            editor.sheet.len()
        );
        Ok(editor)
    }

    /// Replaces the loaded sheet, resetting history and view state.
    pub fn load(&mut self, sheet: Sheet) {
        self.history = History::with_limit(&sheet, self.history.limit());
        self.sheet = sheet;
        self.filters.clear();
        self.search.clear();
        self.card_index = 0;
    }

    pub fn set_source(&mut self, file_name: impl Into<String>, sheets: Vec<String>, active: usize) {
        self.file_name = Some(file_name.into());
        self.sheets = sheets;
        self.active_sheet = active;
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn history(&self) -> &History<Sheet> {
        &self.history
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn set_cell(&mut self, index: usize, column: &str, value: &str) -> Result<EditOutcome> {
        let outcome = self
            .sheet
            .apply(self.classifier.as_ref(), index, column, value)?;
        if let EditOutcome::Applied(writes) = &outcome {
            debug!(
                "Row {index} '{column}' updated ({} write(s))",
                writes.len()
            );
            self.history.record(&self.sheet);
        }
        Ok(outcome)
    }

    pub fn set_cell_by_id(&mut self, id: RowId, column: &str, value: &str) -> Result<EditOutcome> {
        let index = self.sheet.position_of(id).ok_or(SheetError::UnknownRow(id))?;
        self.set_cell(index, column, value)
    }

    pub fn add_row(&mut self) -> RowId {
        let id = self.sheet.add_row();
        self.history.record(&self.sheet);
        if self.card_view {
            self.card_index = self.visible_indices().len().saturating_sub(1);
        }
        id
    }

    /// Deletes the row at `index`; out-of-range indices are ignored.
    pub fn delete_row(&mut self, index: usize) -> Option<RowId> {
        let removed = self.sheet.delete_row(index)?;
        self.history.record(&self.sheet);
        self.clamp_card_index();
        Some(removed.id)
    }

    pub fn delete_row_by_id(&mut self, id: RowId) -> Result<()> {
        self.sheet.delete_row_by_id(id)?;
        self.history.record(&self.sheet);
        self.clamp_card_index();
        Ok(())
    }

    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.sheet.restore(snapshot);
                self.clamp_card_index();
                true
            }
            None => false,
        }
    }

    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.sheet.restore(snapshot);
                self.clamp_card_index();
                true
            }
            None => false,
        }
    }

    /// Cell text for display, with formulas evaluated against the current sheet.
    pub fn display_value(&self, index: usize, column: &str) -> Option<String> {
        let cell = self.sheet.cell(index, column)?;
        Some(formula::evaluate_cell(cell, &self.sheet))
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn set_filter(&mut self, column: &str, value: &str) {
        self.filters.set(column, value);
        self.card_index = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.card_index = 0;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.card_index = 0;
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        filter::filter_indices(&self.sheet, &self.filters, &self.search)
    }

    pub fn filter_options(&self, column: &str) -> Vec<String> {
        filter::filter_options(&self.sheet, column)
    }

    pub fn suggestions(
        &self,
        column: &str,
        partial: &str,
        source: Option<&dyn CandidateSource>,
    ) -> Suggestions {
        suggest::suggest_with_source(&self.sheet, column, partial, source)
    }

    pub fn input_kind(&self, column: &str) -> InputKind {
        let values = match self.sheet.column_index(column) {
            Some(col) => self.sheet.column_values(col).collect::<Vec<_>>(),
            None => Vec::new(),
        };
        self.classifier.input_kind(column, &values)
    }

    pub fn card_view(&self) -> bool {
        self.card_view
    }

    pub fn set_card_view(&mut self, enabled: bool) {
        self.card_view = enabled;
        self.clamp_card_index();
    }

    pub fn card_index(&self) -> usize {
        self.card_index
    }

    /// Moves the card cursor by `delta` within the visible rows.
    pub fn navigate(&mut self, delta: isize) -> usize {
        let last = self.visible_indices().len().saturating_sub(1);
        self.card_index = self.card_index.saturating_add_signed(delta).min(last);
        self.card_index
    }

    /// Sheet position of the row under the card cursor.
    pub fn card_row(&self) -> Option<usize> {
        self.visible_indices().get(self.card_index).copied()
    }

    fn clamp_card_index(&mut self) {
        let last = self.visible_indices().len().saturating_sub(1);
        self.card_index = self.card_index.min(last);
    }

    pub fn session_entry(&self, file_name: &str, now: DateTime<Utc>) -> SessionEntry {
        SessionEntry {
            file_name: file_name.to_string(),
            timestamp: now,
            sheet_count: self.sheets.len().max(1),
            row_count: self.sheet.len(),
            state: SessionState {
                sheets: self.sheets.clone(),
                active_sheet: self.active_sheet,
                sheet: self.sheet.clone(),
                filters: self.filters.clone(),
                search_term: self.search.clone(),
                card_index: self.card_index,
                card_view: self.card_view,
            },
        }
    }

    /// Records the session in `store`. Skipped (returning `false`) until a
    /// file name is known and the sheet has rows.
    pub fn save_session(&self, store: &dyn SessionStore, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let Some(file_name) = self.file_name.as_deref() else {
            return Ok(false);
        };
        if self.sheet.is_empty() {
            return Ok(false);
        }
        let mut log: SessionLog = store.load()?;
        log.record(self.session_entry(file_name, now));
        store.save(&log)?;
        debug!("Saved session for '{file_name}'");
        Ok(true)
    }
}
