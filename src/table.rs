//! Plain-text rendering of sheet views.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{formula, sheet::Sheet};

const COLUMN_GAP: &str = "  ";

/// How cell contents are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellDisplay {
    /// Formulas evaluated against the sheet.
    Evaluated,
    /// Stored text, formulas included verbatim.
    Raw,
}

/// Renders the rows at `indices` as an aligned table with a leading row id
/// column.
pub fn render_sheet(sheet: &Sheet, indices: &[usize], display: CellDisplay) -> String {
    let mut headers = Vec::with_capacity(sheet.width() + 1);
    headers.push("#".to_string());
    headers.extend(sheet.headers().iter().cloned());

    let rows = indices
        .iter()
        .filter_map(|&index| sheet.row(index))
        .map(|row| {
            let mut line = Vec::with_capacity(headers.len());
            line.push(row.id.0.to_string());
            line.extend(row.cells.iter().map(|cell| match display {
                CellDisplay::Evaluated => formula::evaluate_cell(cell, sheet),
                CellDisplay::Raw => cell.as_display(),
            }));
            line
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn print_sheet(sheet: &Sheet, indices: &[usize], display: CellDisplay) {
    print!("{}", render_sheet(sheet, indices, display));
}

/// Renders one row as `header: value` lines, headers right-aligned.
pub fn render_card(sheet: &Sheet, index: usize, display: CellDisplay) -> Option<String> {
    let row = sheet.row(index)?;
    let label_width = sheet
        .headers()
        .iter()
        .map(|h| display_width(h))
        .max()
        .unwrap_or_default();
    let mut output = String::new();
    let _ = writeln!(output, "Row {}", row.id);
    for (header, cell) in sheet.headers().iter().zip(&row.cells) {
        let value = match display {
            CellDisplay::Evaluated => formula::evaluate_cell(cell, sheet),
            CellDisplay::Raw => cell.as_display(),
        };
        let pad = label_width.saturating_sub(display_width(header));
        let _ = writeln!(
            output,
            "{}{}: {}",
            " ".repeat(pad),
            sanitize_cell(header),
            sanitize_cell(&value)
        );
    }
    Some(output)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Sheet {
        Sheet::from_records(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec!["label".into(), "5".into(), "7".into()],
                vec!["multi\nline".into(), "".into(), "=B2+C2".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn table_aligns_columns_and_evaluates() {
        let rendered = render_sheet(&sheet(), &[0, 1], CellDisplay::Evaluated);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "#  A           B  C");
        assert_eq!(lines[1], "-  ----------  -  --");
        assert_eq!(lines[2], "0  label       5  7");
        assert_eq!(lines[3], "1  multi line     12");
    }

    #[test]
    fn raw_display_keeps_formulas() {
        let rendered = render_sheet(&sheet(), &[1], CellDisplay::Raw);
        assert!(rendered.contains("=B2+C2"));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn card_lists_every_column() {
        let card = render_card(&sheet(), 0, CellDisplay::Evaluated).unwrap();
        assert_eq!(card, "Row #0\nA: label\nB: 5\nC: 7\n");
        assert!(render_card(&sheet(), 5, CellDisplay::Raw).is_none());
    }
}
