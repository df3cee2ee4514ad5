//! Tabular file import and export.
//!
//! Sheets are read from and written to delimited text files:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding and output encoding via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Shape**: the first record is the header set; short records are padded
//!   with empty cells and export follows header order.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::sheet::Sheet;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a sheet from any reader. Records may be shorter than the header row.
pub fn read_sheet<R: Read>(reader: R, delimiter: u8, encoding: &'static Encoding) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader);
    let headers = decode_record(reader.byte_headers()?, encoding).context("Decoding headers")?;
    let mut records = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        records.push(
            decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {}", row_idx + 2))?,
        );
    }
    debug!(
        "Read {} header(s) and {} record(s)",
        headers.len(),
        records.len()
    );
    Ok(Sheet::from_records(headers, records)?)
}

pub fn read_sheet_from_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Sheet> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    read_sheet(reader, delimiter, encoding).with_context(|| format!("Loading sheet from {path:?}"))
}

/// Writes raw cell contents (formulas verbatim) in header order.
pub fn write_sheet<W: Write>(
    sheet: &Sheet,
    mut writer: W,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .double_quote(true)
        .from_writer(Vec::new());
    csv_writer.write_record(sheet.headers())?;
    for row in sheet.rows() {
        csv_writer.write_record(row.cells.iter().map(|cell| cell.as_display()))?;
    }
    let bytes = csv_writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV output: {err}"))?;
    let text = String::from_utf8(bytes).context("CSV output is not valid UTF-8")?;

    if encoding == UTF_8 {
        writer.write_all(text.as_bytes())?;
    } else {
        let (encoded, _, had_errors) = encoding.encode(&text);
        if had_errors {
            return Err(anyhow!("Failed to encode output using {}", encoding.name()));
        }
        writer.write_all(&encoded)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_sheet_to_path(
    sheet: &Sheet,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    match path {
        Some(p) if !is_dash(p) => {
            let file = File::create(p).with_context(|| format!("Creating output file {p:?}"))?;
            write_sheet(sheet, file, delimiter, encoding)
                .with_context(|| format!("Writing sheet to {p:?}"))
        }
        _ => write_sheet(sheet, std::io::stdout().lock(), delimiter, encoding),
    }
}

/// `<stem>_edited_<millis>.csv`, or `edited_<millis>.csv` without a source.
pub fn export_file_name(source: Option<&str>, millis: i64) -> String {
    match source.map(Path::new).and_then(|p| p.file_stem()) {
        Some(stem) => format!("{}_edited_{millis}.csv", stem.to_string_lossy()),
        None => format!("edited_{millis}.csv"),
    }
}
