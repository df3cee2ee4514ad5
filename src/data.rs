use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single cell. Formula text is kept verbatim and only evaluated on read.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Formula(String),
}

impl CellValue {
    /// Classifies raw user or file input.
    ///
    /// Text becomes a number only when the number prints back to the same
    /// text, so values such as `007` or `1.50` keep their spelling.
    pub fn from_input(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Empty;
        }
        if raw.starts_with('=') {
            return CellValue::Formula(raw.to_string());
        }
        if let Ok(parsed) = raw.parse::<f64>()
            && parsed.is_finite()
            && format_number(parsed) == raw
        {
            return CellValue::Number(parsed);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Numeric reading of the cell, if it has one. Formula text is never numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number(s),
            CellValue::Empty | CellValue::Formula(_) => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::Formula(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::from_input(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            other => serializer.serialize_str(&other.as_display()),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => CellValue::Number(n),
            Raw::Text(s) => CellValue::from_input(&s),
        })
    }
}

/// Parses trimmed text as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Stable identity of a row, assigned once when the row is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One record. `cells[i]` belongs to the sheet's `i`-th header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn blank(id: RowId, width: usize) -> Self {
        Self {
            id,
            cells: vec![CellValue::Empty; width],
        }
    }

    pub fn get(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// String-coerced cell text, empty for missing cells.
    pub fn text(&self, column: usize) -> String {
        self.cells
            .get(column)
            .map(CellValue::as_display)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_input_classifies_values() {
        assert_eq!(CellValue::from_input(""), CellValue::Empty);
        assert_eq!(CellValue::from_input("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::from_input("2.5"), CellValue::Number(2.5));
        assert_eq!(
            CellValue::from_input("=B2+C2"),
            CellValue::Formula("=B2+C2".to_string())
        );
        assert_eq!(CellValue::from_input("red"), CellValue::Text("red".into()));
    }

    #[test]
    fn from_input_keeps_zero_padded_text() {
        assert_eq!(CellValue::from_input("07"), CellValue::Text("07".into()));
        assert_eq!(CellValue::from_input("1.50"), CellValue::Text("1.50".into()));
        assert_eq!(CellValue::from_input("07").as_number(), Some(7.0));
    }

    #[test]
    fn formula_text_is_not_numeric() {
        assert_eq!(CellValue::Formula("=1".into()).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn serde_uses_plain_json_scalars() {
        let row = Row {
            id: RowId(3),
            cells: vec![
                CellValue::Number(5.0),
                CellValue::Text("red".into()),
                CellValue::Empty,
                CellValue::Formula("=A2".into()),
            ],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":3,"cells":[5.0,"red","","=A2"]}"#);
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
