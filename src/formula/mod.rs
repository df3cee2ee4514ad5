//! Formula evaluation.
//!
//! Formulas are cell text starting with `=`. The remainder is tokenized,
//! parsed into an [`Expr`], and evaluated against a sheet snapshot. The
//! language is closed: numbers, quoted strings, A1 references, `+ - * /`,
//! parentheses, `SUM(start:end)` and `CONCAT(...)`.
//!
//! Evaluation never fails from the caller's point of view: [`evaluate`] hands
//! back the original text when anything goes wrong. References see the raw
//! text of other cells, so a formula pointing at another formula reads that
//! formula's source rather than its result.

mod lexer;
mod parser;

use std::fmt;

use log::debug;
use thiserror::Error;

use crate::{
    data::{CellValue, format_number, parse_number},
    sheet::Sheet,
};

pub use lexer::CellRef;
pub use parser::{BinaryOp, ConcatArg, Expr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("{message} at {}..{}", span.start, span.end)]
    Lex { message: String, span: Span },

    #[error("{message} at {}..{}", span.start, span.end)]
    Parse { message: String, span: Span },

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Cannot use '{0}' as a number")]
    NotANumber(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result is not a finite number")]
    NonFinite,
}

impl FormulaError {
    fn lex(message: String, start: usize, end: usize) -> Self {
        FormulaError::Lex {
            message,
            span: Span::new(start, end),
        }
    }

    fn parse(message: impl Into<String>, span: Span) -> Self {
        FormulaError::Parse {
            message: message.into(),
            span,
        }
    }
}

/// Evaluated result of a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
}

impl FormulaValue {
    fn as_number(&self) -> Result<f64, FormulaError> {
        match self {
            FormulaValue::Number(n) => Ok(*n),
            FormulaValue::Text(s) => {
                parse_number(s).ok_or_else(|| FormulaError::NotANumber(s.clone()))
            }
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => write!(f, "{}", format_number(*n)),
            FormulaValue::Text(s) => write!(f, "{s}"),
        }
    }
}

pub fn is_formula(raw: &str) -> bool {
    raw.starts_with('=')
}

/// Display text for `raw`: the evaluated result for formulas, `raw` itself
/// for everything else and for formulas that fail to evaluate.
pub fn evaluate(raw: &str, sheet: &Sheet) -> String {
    if !is_formula(raw) {
        return raw.to_string();
    }
    match try_evaluate(raw, sheet) {
        Ok(value) => value.to_string(),
        Err(err) => {
            debug!("Formula '{raw}' left unevaluated: {err}");
            raw.to_string()
        }
    }
}

/// Display text for a stored cell.
pub fn evaluate_cell(cell: &CellValue, sheet: &Sheet) -> String {
    match cell {
        CellValue::Formula(raw) => evaluate(raw, sheet),
        other => other.as_display(),
    }
}

/// Evaluates formula text, which must start with `=`.
pub fn try_evaluate(raw: &str, sheet: &Sheet) -> Result<FormulaValue, FormulaError> {
    let src = raw.strip_prefix('=').ok_or_else(|| {
        FormulaError::parse("Formula must start with '='", Span::new(0, 0))
    })?;
    let expr = compile(src)?;
    Evaluator { sheet }.eval(&expr)
}

/// Parses the expression part of a formula (without the leading `=`).
pub fn compile(src: &str) -> Result<Expr, FormulaError> {
    let tokens = lexer::tokenize(src)?;
    parser::parse(src, tokens)
}

struct Evaluator<'a> {
    sheet: &'a Sheet,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> Result<FormulaValue, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(FormulaValue::Number(*n)),
            Expr::Text(s) => Ok(FormulaValue::Text(s.clone())),
            Expr::Cell(cell) => Ok(self.reference(*cell)),
            Expr::Sum { start, end } => Ok(FormulaValue::Number(self.sum(*start, *end))),
            Expr::Concat(args) => Ok(FormulaValue::Text(self.concat(args))),
            Expr::Negate(inner) => {
                let value = self.eval(inner)?.as_number()?;
                Ok(FormulaValue::Number(-value))
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.binary(*op, lhs, rhs)
            }
        }
    }

    fn lookup(&self, cell: CellRef) -> Option<&CellValue> {
        let row = self.sheet.row(cell.data_row()?)?;
        row.get(cell.col)
    }

    /// Numbers stay numbers, anything else becomes text. Missing cells and
    /// empty cells read as zero.
    fn reference(&self, cell: CellRef) -> FormulaValue {
        match self.lookup(cell) {
            None | Some(CellValue::Empty) => FormulaValue::Number(0.0),
            Some(CellValue::Number(n)) => FormulaValue::Number(*n),
            Some(value @ (CellValue::Text(_) | CellValue::Formula(_))) => match value.as_number() {
                Some(n) => FormulaValue::Number(n),
                None => FormulaValue::Text(value.as_display()),
            },
        }
    }

    /// Sums columns `start.col..=end.col` on the start reference's row.
    fn sum(&self, start: CellRef, end: CellRef) -> f64 {
        let Some(row) = start.data_row().and_then(|r| self.sheet.row(r)) else {
            return 0.0;
        };
        // Columns past the row width read as zero; stop at the last stored cell.
        let Some(last) = row.cells.len().checked_sub(1).map(|last| end.col.min(last)) else {
            return 0.0;
        };
        // A cell must parse as a number outright: `12cm` counts as 0, not 12.
        (start.col..=last)
            .filter_map(|col| row.get(col))
            .map(|value| value.as_number().unwrap_or(0.0))
            .sum()
    }

    fn concat(&self, args: &[ConcatArg]) -> String {
        args.iter()
            .map(|arg| match arg {
                ConcatArg::Literal(s) | ConcatArg::Bare(s) => s.clone(),
                ConcatArg::Cell { cell, text } => match self.lookup(*cell) {
                    Some(value) => value.as_display(),
                    None => text.clone(),
                },
            })
            .collect()
    }

    fn binary(
        &self,
        op: BinaryOp,
        lhs: FormulaValue,
        rhs: FormulaValue,
    ) -> Result<FormulaValue, FormulaError> {
        if op == BinaryOp::Add {
            return match (lhs, rhs) {
                (FormulaValue::Number(a), FormulaValue::Number(b)) => finite(a + b),
                (lhs, rhs) => Ok(FormulaValue::Text(format!("{lhs}{rhs}"))),
            };
        }
        let a = lhs.as_number()?;
        let b = rhs.as_number()?;
        match op {
            BinaryOp::Add => finite(a + b),
            BinaryOp::Sub => finite(a - b),
            BinaryOp::Mul => finite(a * b),
            BinaryOp::Div if b == 0.0 => Err(FormulaError::DivisionByZero),
            BinaryOp::Div => finite(a / b),
        }
    }
}

fn finite(value: f64) -> Result<FormulaValue, FormulaError> {
    if value.is_finite() {
        Ok(FormulaValue::Number(value))
    } else {
        Err(FormulaError::NonFinite)
    }
}
