use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};

use crate::data::RowId;

#[derive(Debug, Parser)]
#[command(author, version, about = "Edit spreadsheet-style tables from the command line", long_about = None)]
pub struct Cli {
    /// YAML configuration naming the auto-fill columns and history size
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a file as an aligned table, optionally filtered and searched
    View(ViewArgs),
    /// Apply a sequence of edits and write the result
    Edit(EditArgs),
    /// Suggest values for a column from its contents and a candidate list
    Suggest(SuggestArgs),
    /// List, clear, or restore saved editing sessions
    Sessions(SessionsArgs),
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Input file (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Exact-match filters such as `status=open`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Case-insensitive search across every cell
    #[arg(long)]
    pub search: Option<String>,
    /// Show stored formulas instead of their results
    #[arg(long)]
    pub raw: bool,
    /// Limit number of rows shown
    #[arg(long)]
    pub limit: Option<usize>,
    /// Show the Nth visible row (zero-based) as a card instead of a table
    #[arg(long)]
    pub card: Option<usize>,
    /// Print the distinct filter values of this column and exit
    #[arg(long = "options")]
    pub options: Option<String>,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Input file (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Edits applied in order: `set:ROW:COLUMN=VALUE`, `add-row`,
    /// `delete-row:ROW`, `undo`, `redo`. ROW is the row id shown by `view`.
    #[arg(long = "op", required = true, action = clap::ArgAction::Append)]
    pub ops: Vec<EditOp>,
    /// Session log to record the edited file in
    #[arg(long)]
    pub store: Option<PathBuf>,
    /// Delimiter character for input and output
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Input file (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column to suggest values for
    #[arg(short = 'c', long)]
    pub column: String,
    /// Partial value typed so far
    #[arg(long, default_value = "")]
    pub value: String,
    /// JSON file mapping column names to candidate values
    #[arg(long)]
    pub candidates: Option<PathBuf>,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Session log file
    #[arg(long)]
    pub store: PathBuf,
    /// Remove every stored session
    #[arg(long, conflicts_with = "restore")]
    pub clear: bool,
    /// File name of the session to export
    #[arg(long)]
    pub restore: Option<String>,
    /// Destination for the restored sheet (stdout if omitted)
    #[arg(short = 'o', long = "output", requires = "restore")]
    pub output: Option<PathBuf>,
    /// Delimiter character for the restored sheet
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

/// One step of an `edit` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Set {
        row: RowId,
        column: String,
        value: String,
    },
    AddRow,
    DeleteRow(RowId),
    Undo,
    Redo,
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "add-row" => return Ok(EditOp::AddRow),
            "undo" => return Ok(EditOp::Undo),
            "redo" => return Ok(EditOp::Redo),
            _ => {}
        }
        if let Some(row) = value.strip_prefix("delete-row:") {
            return parse_row(row).map(EditOp::DeleteRow);
        }
        if let Some(rest) = value.strip_prefix("set:") {
            let (row, assignment) = rest
                .split_once(':')
                .ok_or_else(|| format!("Expected set:ROW:COLUMN=VALUE, got '{value}'"))?;
            let (column, cell) = assignment
                .split_once('=')
                .ok_or_else(|| format!("Missing '=' in '{value}'"))?;
            if column.is_empty() {
                return Err(format!("Missing column in '{value}'"));
            }
            return Ok(EditOp::Set {
                row: parse_row(row)?,
                column: column.to_string(),
                value: cell.to_string(),
            });
        }
        Err(format!(
            "Unknown edit '{value}' (expected set:ROW:COLUMN=VALUE, add-row, delete-row:ROW, undo or redo)"
        ))
    }
}

fn parse_row(value: &str) -> Result<RowId, String> {
    value
        .trim()
        .parse::<u64>()
        .map(RowId)
        .map_err(|_| format!("Invalid row id '{value}'"))
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_edit_ops() {
        assert_eq!("add-row".parse::<EditOp>(), Ok(EditOp::AddRow));
        assert_eq!("undo".parse::<EditOp>(), Ok(EditOp::Undo));
        assert_eq!(
            "delete-row:3".parse::<EditOp>(),
            Ok(EditOp::DeleteRow(RowId(3)))
        );
        assert_eq!(
            "set:0:Input=44-89-77".parse::<EditOp>(),
            Ok(EditOp::Set {
                row: RowId(0),
                column: "Input".into(),
                value: "44-89-77".into(),
            })
        );
        assert_eq!(
            "set:1:Total==B2+C2".parse::<EditOp>(),
            Ok(EditOp::Set {
                row: RowId(1),
                column: "Total".into(),
                value: "=B2+C2".into(),
            })
        );
    }

    #[test]
    fn rejects_malformed_ops() {
        assert!("set:x:A=1".parse::<EditOp>().is_err());
        assert!("set:0:A".parse::<EditOp>().is_err());
        assert!("set:0:=1".parse::<EditOp>().is_err());
        assert!("rename".parse::<EditOp>().is_err());
    }

    #[test]
    fn delimiter_aliases() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
