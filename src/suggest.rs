//! Input suggestions.
//!
//! Suggestions combine values already common in the column with candidates
//! from an optional external [`CandidateSource`]. Requests for the same field
//! may overlap; [`RequestTracker`] only lets the most recent one through and
//! falls back to local suggestions when the source fails.

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::RowId,
    frequency::{self, COMMON_LIMIT},
    sheet::Sheet,
};

pub const BACKEND_LIMIT: usize = 25;
pub const TOTAL_LIMIT: usize = 50;

/// Ranked candidate lists for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    /// Externally sourced candidates.
    pub backend: Vec<String>,
    /// Frequent values already in the column.
    pub common: Vec<String>,
    /// `backend` then `common`, without duplicates.
    pub all: Vec<String>,
}

/// Wire shape of an external candidate response. Only `backend` is used;
/// the common list is always recomputed locally.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionResponse {
    pub backend: Vec<String>,
    pub common: Vec<String>,
    pub all: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SuggestionRequest<'a> {
    pub column: &'a str,
    pub value: &'a str,
    pub sheet: &'a Sheet,
}

/// External provider of suggested values for a column.
pub trait CandidateSource {
    fn candidates(&self, request: &SuggestionRequest<'_>) -> Result<Vec<String>>;
}

/// Candidates from a fixed column-to-values map, typically loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StaticCandidates {
    by_column: HashMap<String, Vec<String>>,
}

impl StaticCandidates {
    pub fn new(by_column: HashMap<String, Vec<String>>) -> Self {
        Self { by_column }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening candidates {path:?}"))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing candidates {path:?}"))
    }
}

impl CandidateSource for StaticCandidates {
    fn candidates(&self, request: &SuggestionRequest<'_>) -> Result<Vec<String>> {
        Ok(self
            .by_column
            .get(request.column)
            .cloned()
            .unwrap_or_default())
    }
}

/// Builds suggestions for `partial` in `column`.
///
/// `external` is the already-fetched candidate list, or `None` for a
/// local-only result.
pub fn suggest(
    sheet: &Sheet,
    column: &str,
    partial: &str,
    external: Option<&[String]>,
) -> Suggestions {
    let needle = partial.to_lowercase();
    let matches = |value: &String| value.to_lowercase().contains(&needle);

    let common = frequency::common_values(sheet, column, COMMON_LIMIT)
        .into_iter()
        .filter(matches)
        .collect::<Vec<_>>();
    let backend = external
        .unwrap_or_default()
        .iter()
        .filter(|value| matches(value))
        .take(BACKEND_LIMIT)
        .cloned()
        .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    let all = backend
        .iter()
        .chain(common.iter())
        .filter(|value| seen.insert(value.as_str()))
        .take(TOTAL_LIMIT)
        .cloned()
        .collect();

    Suggestions {
        backend,
        common,
        all,
    }
}

/// Queries `source` and merges its answer, falling back to local
/// suggestions when it fails.
pub fn suggest_with_source(
    sheet: &Sheet,
    column: &str,
    partial: &str,
    source: Option<&dyn CandidateSource>,
) -> Suggestions {
    let Some(source) = source else {
        return suggest(sheet, column, partial, None);
    };
    let request = SuggestionRequest {
        column,
        value: partial,
        sheet,
    };
    match source.candidates(&request) {
        Ok(candidates) => suggest(sheet, column, partial, Some(&candidates)),
        Err(err) => {
            warn!("Candidate source failed for '{column}', using local suggestions: {err:#}");
            suggest(sheet, column, partial, None)
        }
    }
}

/// The input field a suggestion request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub row: RowId,
    pub column: String,
}

/// Handle for one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    field: FieldKey,
    seq: u64,
    partial: String,
}

impl Ticket {
    pub fn field(&self) -> &FieldKey {
        &self.field
    }

    pub fn partial(&self) -> &str {
        &self.partial
    }
}

/// Last-request-wins bookkeeping for overlapping suggestion requests.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_seq: u64,
    latest: HashMap<FieldKey, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request, superseding earlier ones for the same field.
    pub fn issue(&mut self, field: FieldKey, partial: &str) -> Ticket {
        self.next_seq += 1;
        self.latest.insert(field.clone(), self.next_seq);
        Ticket {
            field,
            seq: self.next_seq,
            partial: partial.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.get(&ticket.field) == Some(&ticket.seq)
    }

    /// Applies a response that arrived for `ticket`.
    ///
    /// Returns `None` when a newer request for the same field exists. A
    /// failed response yields local-only suggestions.
    pub fn resolve(
        &self,
        ticket: &Ticket,
        sheet: &Sheet,
        response: Result<SuggestionResponse>,
    ) -> Option<Suggestions> {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale suggestions for '{}' (request {})",
                ticket.field.column, ticket.seq
            );
            return None;
        }
        let column = ticket.field.column.as_str();
        Some(match response {
            Ok(response) => suggest(sheet, column, &ticket.partial, Some(&response.backend)),
            Err(err) => {
                warn!("Suggestion request for '{column}' failed, using local suggestions: {err:#}");
                suggest(sheet, column, &ticket.partial, None)
            }
        })
    }

    /// Forgets a field, e.g. when its editor closes.
    pub fn release(&mut self, field: &FieldKey) {
        self.latest.remove(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn colors(values: &[&str]) -> Sheet {
        Sheet::from_records(
            vec!["color".to_string()],
            values.iter().map(|v| vec![v.to_string()]).collect(),
        )
        .unwrap()
    }

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    struct Failing;

    impl CandidateSource for Failing {
        fn candidates(&self, _request: &SuggestionRequest<'_>) -> Result<Vec<String>> {
            Err(anyhow!("connection refused"))
        }
    }

    #[test]
    fn local_ranking_with_empty_partial() {
        let sheet = colors(&["red", "blue", "red", "red", "green"]);
        let result = suggest(&sheet, "color", "", None);
        assert_eq!(result.common, owned(&["red", "blue", "green"]));
        assert!(result.backend.is_empty());
        assert_eq!(result.all, result.common);
    }

    #[test]
    fn partial_input_filters_case_insensitively() {
        let sheet = colors(&["Red", "blue", "green", "Reed"]);
        let result = suggest(&sheet, "color", "RE", None);
        assert_eq!(result.common, owned(&["Red", "green", "Reed"]));
    }

    #[test]
    fn union_puts_external_first_without_duplicates() {
        let sheet = colors(&["red", "blue"]);
        let external = owned(&["crimson", "red", "cyan"]);
        let result = suggest(&sheet, "color", "", Some(&external));
        assert_eq!(result.backend, external);
        assert_eq!(result.all, owned(&["crimson", "red", "cyan", "blue"]));
    }

    #[test]
    fn lists_are_capped() {
        let values = (0..40).map(|i| format!("v{i}")).collect::<Vec<_>>();
        let refs = values.iter().map(String::as_str).collect::<Vec<_>>();
        let sheet = colors(&refs);
        let external = (0..40).map(|i| format!("x{i}")).collect::<Vec<_>>();
        let result = suggest(&sheet, "color", "", Some(&external));
        assert_eq!(result.common.len(), COMMON_LIMIT);
        assert_eq!(result.backend.len(), BACKEND_LIMIT);
        assert_eq!(result.all.len(), TOTAL_LIMIT);
        assert_eq!(result.all[0], "x0");
        assert_eq!(result.all[BACKEND_LIMIT], "v0");
    }

    #[test]
    fn failing_source_falls_back_to_local() {
        let sheet = colors(&["red", "blue", "red"]);
        let result = suggest_with_source(&sheet, "color", "", Some(&Failing));
        assert_eq!(result, suggest(&sheet, "color", "", None));
    }

    #[test]
    fn static_source_serves_its_column() {
        let sheet = colors(&["red"]);
        let source = StaticCandidates::new(HashMap::from([(
            "color".to_string(),
            owned(&["maroon", "rose"]),
        )]));
        let result = suggest_with_source(&sheet, "color", "r", Some(&source));
        assert_eq!(result.backend, owned(&["maroon", "rose"]));
        assert_eq!(result.all, owned(&["maroon", "rose", "red"]));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let sheet = colors(&["red", "ruby"]);
        let field = FieldKey {
            row: RowId(0),
            column: "color".into(),
        };
        let mut tracker = RequestTracker::new();
        let first = tracker.issue(field.clone(), "r");
        let second = tracker.issue(field.clone(), "ru");

        let newest = tracker
            .resolve(
                &second,
                &sheet,
                Ok(SuggestionResponse {
                    backend: owned(&["rust"]),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_eq!(newest.all, owned(&["rust", "ruby"]));

        let late = tracker.resolve(&first, &sheet, Ok(SuggestionResponse::default()));
        assert!(late.is_none());
    }

    #[test]
    fn fields_are_tracked_independently() {
        let sheet = colors(&["red"]);
        let mut tracker = RequestTracker::new();
        let a = tracker.issue(
            FieldKey {
                row: RowId(0),
                column: "color".into(),
            },
            "",
        );
        let b = tracker.issue(
            FieldKey {
                row: RowId(1),
                column: "color".into(),
            },
            "",
        );
        assert!(tracker.is_current(&a));
        assert!(tracker.is_current(&b));
        let fallback = tracker.resolve(&a, &sheet, Err(anyhow!("timeout"))).unwrap();
        assert_eq!(fallback.common, owned(&["red"]));
        tracker.release(a.field());
        assert!(!tracker.is_current(&a));
    }
}
