//! Row filtering: exact-match column filters combined with a free-text search.
//!
//! A row is visible when every filter entry matches its column exactly (after
//! string coercion) and, if the search term is non-empty, at least one cell
//! contains the term case-insensitively. Cells are compared by their stored
//! text, so formula cells match on their source, not their result.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{data::Row, sheet::Sheet};

pub const FILTER_OPTION_LIMIT: usize = 100;

/// Column name to required value. A missing column means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    constraints: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the required value for `column`; an empty value clears it.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        if value.is_empty() {
            self.constraints.remove(&column);
        } else {
            self.constraints.insert(column, value);
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.constraints.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.constraints.get(column).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.constraints.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.constraints
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for (column, value) in iter {
            set.set(column, value);
        }
        set
    }
}

/// Parses `column=value` filter arguments.
pub fn parse_filters(filters: &[String]) -> Result<FilterSet> {
    let mut set = FilterSet::new();
    for filter in filters {
        let (column, value) = parse_filter(filter)?;
        set.set(column, value);
    }
    Ok(set)
}

fn parse_filter(filter: &str) -> Result<(String, String)> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }
    let Some((left, right)) = trimmed.split_once('=') else {
        return Err(anyhow!(
            "Failed to parse filter expression '{trimmed}', expected column=value"
        ));
    };
    let column = left.trim();
    if column.is_empty() {
        return Err(anyhow!("Filter '{trimmed}' is missing a column name"));
    }
    Ok((column.to_string(), unquote(right.trim()).to_string()))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Positions of the visible rows, in sheet order.
pub fn filter_indices(sheet: &Sheet, filters: &FilterSet, search: &str) -> Vec<usize> {
    let constraints = filters
        .iter()
        .map(|(column, value)| (sheet.column_index(column), column, value))
        .collect::<Vec<_>>();
    for (index, column, _) in &constraints {
        if index.is_none() {
            debug!("Filter on unknown column '{column}' matches no rows");
        }
    }
    let needle = search.to_lowercase();

    sheet
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            constraints.iter().all(|(index, _, value)| match index {
                Some(col) => row.text(*col) == *value,
                None => false,
            })
        })
        .filter(|(_, row)| needle.is_empty() || row_contains(row, &needle))
        .map(|(idx, _)| idx)
        .collect()
}

/// The visible rows themselves.
pub fn filter_rows<'a>(sheet: &'a Sheet, filters: &FilterSet, search: &str) -> Vec<&'a Row> {
    filter_indices(sheet, filters, search)
        .into_iter()
        .map(|idx| &sheet.rows()[idx])
        .collect()
}

fn row_contains(row: &Row, needle: &str) -> bool {
    row.cells
        .iter()
        .any(|cell| cell.as_display().to_lowercase().contains(needle))
}

/// Distinct values offered as filter choices for `column`: sorted, without
/// blanks or `-` placeholders, capped at [`FILTER_OPTION_LIMIT`].
pub fn filter_options(sheet: &Sheet, column: &str) -> Vec<String> {
    let Some(col) = sheet.column_index(column) else {
        return Vec::new();
    };
    sheet
        .column_values(col)
        .map(|value| value.as_display())
        .filter(|value| !value.is_empty() && value != "-")
        .unique()
        .sorted()
        .take(FILTER_OPTION_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn people() -> Sheet {
        Sheet::from_records(
            strings(&["name", "status", "city"]),
            vec![
                strings(&["Jon Snow", "active", "Winterfell"]),
                strings(&["Arya", "active", "Braavos"]),
                strings(&["Jonquil", "inactive", "Highgarden"]),
                strings(&["Sansa", "active", "Kings Landing, JONESBORO"]),
                strings(&["Bran", "-", ""]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn combines_exact_filters_with_search() {
        let sheet = people();
        let filters = FilterSet::from_iter([("status", "active")]);
        assert_eq!(filter_indices(&sheet, &filters, "jon"), vec![0, 3]);
    }

    #[test]
    fn empty_inputs_keep_every_row() {
        let sheet = people();
        assert_eq!(filter_indices(&sheet, &FilterSet::new(), "").len(), 5);
    }

    #[test]
    fn filters_are_exact_and_case_sensitive() {
        let sheet = people();
        let filters = FilterSet::from_iter([("status", "Active")]);
        assert!(filter_indices(&sheet, &filters, "").is_empty());
        let filters = FilterSet::from_iter([("status", "activ")]);
        assert!(filter_indices(&sheet, &filters, "").is_empty());
    }

    #[test]
    fn unknown_filter_column_matches_nothing() {
        let sheet = people();
        let filters = FilterSet::from_iter([("age", "3")]);
        assert!(filter_rows(&sheet, &filters, "").is_empty());
    }

    #[test]
    fn setting_empty_value_clears_constraint() {
        let mut filters = FilterSet::from_iter([("status", "active"), ("city", "Braavos")]);
        filters.set("city", "");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("city"), None);
    }

    #[test]
    fn parse_filters_accepts_quoted_values() {
        let set = parse_filters(&strings(&["status = 'active'", "city=A=B"])).unwrap();
        assert_eq!(set.get("status"), Some("active"));
        assert_eq!(set.get("city"), Some("A=B"));
        assert!(parse_filters(&strings(&["status"])).is_err());
        assert!(parse_filters(&strings(&["=x"])).is_err());
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let sheet = people();
        assert_eq!(filter_options(&sheet, "status"), vec!["active", "inactive"]);
        assert!(filter_options(&sheet, "missing").is_empty());
    }

    proptest! {
        #[test]
        fn result_is_an_increasing_subsequence(
            values in proptest::collection::vec("[ab]{0,2}", 0..20),
            term in "[ab]{0,1}",
        ) {
            let records = values.iter().map(|v| vec![v.clone()]).collect::<Vec<_>>();
            let sheet = Sheet::from_records(vec!["v".to_string()], records).unwrap();
            let hits = filter_indices(&sheet, &FilterSet::new(), &term);
            prop_assert!(hits.windows(2).all(|w| w[0] < w[1]));
            for idx in 0..values.len() {
                prop_assert_eq!(hits.contains(&idx), values[idx].contains(term.as_str()));
            }
        }
    }
}
