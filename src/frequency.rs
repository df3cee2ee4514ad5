use std::collections::HashMap;

use crate::{data::CellValue, sheet::Sheet};

/// How many locally observed values are offered as suggestions.
pub const COMMON_LIMIT: usize = 25;

/// Counts a column's non-empty values case-insensitively.
///
/// Each key remembers when it was first seen and the original spelling it
/// was first seen with, so ranking is stable and suggestions keep their case.
#[derive(Debug, Default)]
pub struct FrequencyAccumulator {
    entries: HashMap<String, FrequencyEntry>,
}

#[derive(Debug)]
struct FrequencyEntry {
    count: usize,
    first_seen: usize,
    representative: String,
}

impl FrequencyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, value: &CellValue) {
        if value.is_empty() {
            return;
        }
        let display = value.as_display();
        let key = display.to_lowercase();
        let next = self.entries.len();
        self.entries
            .entry(key)
            .and_modify(|entry| entry.count += 1)
            .or_insert(FrequencyEntry {
                count: 1,
                first_seen: next,
                representative: display,
            });
    }

    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// Count for `value`, matched case-insensitively.
    pub fn count(&self, value: &str) -> usize {
        self.entries
            .get(&value.to_lowercase())
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// The `top` most frequent values, ties in first-seen order.
    pub fn ranked(&self, top: usize) -> Vec<(String, usize)> {
        let mut items = self.entries.values().collect::<Vec<_>>();
        items.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        items
            .into_iter()
            .take(top)
            .map(|entry| (entry.representative.clone(), entry.count))
            .collect()
    }
}

/// Most frequent values of `column`, highest count first. Unknown columns
/// yield nothing.
pub fn common_values(sheet: &Sheet, column: &str, top: usize) -> Vec<String> {
    let Some(col) = sheet.column_index(column) else {
        return Vec::new();
    };
    let mut accumulator = FrequencyAccumulator::new();
    for value in sheet.column_values(col) {
        accumulator.ingest(value);
    }
    accumulator
        .ranked(top)
        .into_iter()
        .map(|(value, _)| value)
        .collect()
}
