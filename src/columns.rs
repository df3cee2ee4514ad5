//! Column classification.
//!
//! Deciding which column is the composite input, which columns receive
//! auto-filled parts, and which input kind a column has is pattern matching
//! over human-chosen header names. [`ColumnClassifier`] keeps that decision
//! behind a trait so [`HeaderHeuristics`] can be swapped for
//! [`ExplicitColumns`] loaded from configuration.

use serde::{Deserialize, Serialize};

use crate::data::{CellValue, parse_number};

const NUMERIC_KEYWORDS: &[&str] = &[
    "height", "weight", "chest", "hip", "bmi", "age", "size", "number", "count", "amount", "price",
    "cost", "total", "score", "quantity", "value", "rate", "percent", "id",
];

const DATE_KEYWORDS: &[&str] = &["date", "time", "day", "month", "year", "dob", "birthday"];

/// Columns that receive one part of a composite input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    Primary,
    Secondary,
    Tertiary,
    Output,
}

impl TargetRole {
    pub fn label(self) -> &'static str {
        match self {
            TargetRole::Primary => "primary",
            TargetRole::Secondary => "secondary",
            TargetRole::Tertiary => "tertiary",
            TargetRole::Output => "output",
        }
    }
}

/// Editor widget hint for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Number,
    Date,
    Text,
}

pub trait ColumnClassifier: Send + Sync {
    /// Whether edits to `column` may expand into auto-filled writes.
    fn is_composite_input(&self, headers: &[String], column: &str) -> bool;

    /// Header index for `role`, never returning the `input` column itself.
    fn target(&self, headers: &[String], role: TargetRole, input: &str) -> Option<usize>;

    fn input_kind(&self, column: &str, values: &[&CellValue]) -> InputKind {
        detect_input_kind(column, values)
    }
}

/// Default strategy driven by header names.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderHeuristics;

impl ColumnClassifier for HeaderHeuristics {
    fn is_composite_input(&self, headers: &[String], column: &str) -> bool {
        let lower = column.to_lowercase();
        lower.contains("input")
            || headers.first().is_some_and(|first| first == column)
            || lower.contains("ll-ch-sl")
    }

    fn target(&self, headers: &[String], role: TargetRole, input: &str) -> Option<usize> {
        headers.iter().position(|header| {
            if header == input {
                return false;
            }
            let lower = header.to_lowercase();
            match role {
                TargetRole::Primary => lower.trim() == "ll" || header.trim() == "LL",
                TargetRole::Secondary => lower.contains("chest"),
                TargetRole::Tertiary => lower.contains("sleeve"),
                TargetRole::Output => lower.contains("output") || lower.contains("final"),
            }
        })
    }
}

/// Strategy with every role named up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitColumns {
    pub input: Option<String>,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub tertiary: Option<String>,
    pub output: Option<String>,
}

impl ExplicitColumns {
    fn role_name(&self, role: TargetRole) -> Option<&str> {
        match role {
            TargetRole::Primary => self.primary.as_deref(),
            TargetRole::Secondary => self.secondary.as_deref(),
            TargetRole::Tertiary => self.tertiary.as_deref(),
            TargetRole::Output => self.output.as_deref(),
        }
    }
}

impl ColumnClassifier for ExplicitColumns {
    fn is_composite_input(&self, _headers: &[String], column: &str) -> bool {
        self.input.as_deref() == Some(column)
    }

    fn target(&self, headers: &[String], role: TargetRole, input: &str) -> Option<usize> {
        let name = self.role_name(role)?;
        if name == input {
            return None;
        }
        headers.iter().position(|header| header == name)
    }
}

/// Guesses the input kind from the column name, confirming numeric columns
/// against the values they already hold.
pub fn detect_input_kind(column: &str, values: &[&CellValue]) -> InputKind {
    let lower = column.to_lowercase();
    if NUMERIC_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        let present = values.iter().filter(|v| !v.is_empty()).collect::<Vec<_>>();
        let numeric = present
            .iter()
            .filter(|v| match v {
                CellValue::Number(_) => true,
                CellValue::Text(s) => parse_number(s).is_some(),
                _ => false,
            })
            .count();
        if !present.is_empty() && numeric * 2 > present.len() {
            return InputKind::Number;
        }
    }
    if DATE_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return InputKind::Date;
    }
    InputKind::Text
}
