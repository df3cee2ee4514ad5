pub mod autofill;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod filter;
pub mod formula;
pub mod frequency;
pub mod history;
pub mod io_utils;
pub mod session;
pub mod sheet;
pub mod suggest;
pub mod table;
pub mod yaml_provider;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, EditOp},
    config::Config,
    editor::Editor,
    session::{JsonFileStore, SessionLog, SessionStore},
    sheet::EditOutcome,
    suggest::{CandidateSource, StaticCandidates},
    table::CellDisplay,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_editor", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load_optional(cli.config.as_deref())?;
    match cli.command {
        Commands::View(args) => handle_view(&args, &config),
        Commands::Edit(args) => handle_edit(&args, &config),
        Commands::Suggest(args) => handle_suggest(&args, &config),
        Commands::Sessions(args) => handle_sessions(&args, &config),
    }
}

fn open_editor(
    input: &Path,
    delimiter: Option<u8>,
    encoding: Option<&str>,
    config: &Config,
) -> Result<(Editor, u8)> {
    let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
    let encoding = io_utils::resolve_encoding(encoding)?;
    info!(
        "Loading '{}' with delimiter '{}'",
        input.display(),
        printable_delimiter(delimiter)
    );
    let sheet = io_utils::read_sheet_from_path(input, delimiter, encoding)?;
    let mut editor = Editor::with_options(sheet, config.classifier(), config.history_limit());
    if !io_utils::is_dash(input)
        && let Some(name) = input.file_name()
    {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        editor.set_source(name.to_string_lossy(), vec![stem], 0);
    }
    Ok((editor, delimiter))
}

fn handle_view(args: &cli::ViewArgs, config: &Config) -> Result<()> {
    let (mut editor, _) = open_editor(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        config,
    )?;

    if let Some(column) = &args.options {
        if editor.sheet().column_index(column).is_none() {
            return Err(anyhow!("Column '{column}' not found"));
        }
        for option in editor.filter_options(column) {
            println!("{option}");
        }
        return Ok(());
    }

    for (column, value) in filter::parse_filters(&args.filters)?.iter() {
        editor.set_filter(column, value);
    }
    if let Some(term) = &args.search {
        editor.set_search(term);
    }
    let display = if args.raw {
        CellDisplay::Raw
    } else {
        CellDisplay::Evaluated
    };

    let mut visible = editor.visible_indices();
    info!(
        "{} of {} row(s) match",
        visible.len(),
        editor.sheet().len()
    );

    if let Some(position) = args.card {
        editor.set_card_view(true);
        editor.navigate(isize::try_from(position).unwrap_or(isize::MAX));
        match editor
            .card_row()
            .and_then(|row| table::render_card(editor.sheet(), row, display))
        {
            Some(card) => print!("{card}"),
            None => warn!("No rows to show"),
        }
        return Ok(());
    }

    if let Some(limit) = args.limit {
        visible.truncate(limit);
    }
    table::print_sheet(editor.sheet(), &visible, display);
    Ok(())
}

fn handle_edit(args: &cli::EditArgs, config: &Config) -> Result<()> {
    let (mut editor, input_delimiter) = open_editor(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        config,
    )?;

    for op in &args.ops {
        apply_op(&mut editor, op)?;
    }

    let output = args.output.as_ref().map(|path| {
        if path.is_dir() {
            let millis = Utc::now().timestamp_millis();
            path.join(io_utils::export_file_name(editor.file_name(), millis))
        } else {
            path.clone()
        }
    });
    let delimiter =
        io_utils::resolve_output_delimiter(output.as_deref(), args.delimiter, input_delimiter);
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    io_utils::write_sheet_to_path(editor.sheet(), output.as_deref(), delimiter, encoding)?;
    if let Some(path) = &output {
        info!("Wrote {} row(s) to {path:?}", editor.sheet().len());
    }

    if let Some(path) = &args.store {
        let store = JsonFileStore::new(path);
        if editor.save_session(&store, Utc::now())? {
            info!("Recorded session in {path:?}");
        } else {
            warn!("Session not recorded: no source file name or no rows");
        }
    }
    Ok(())
}

fn apply_op(editor: &mut Editor, op: &EditOp) -> Result<()> {
    match op {
        EditOp::Set { row, column, value } => {
            let outcome = editor
                .set_cell_by_id(*row, column, value)
                .with_context(|| format!("Setting {column} of row {row}"))?;
            if let EditOutcome::Applied(writes) = outcome {
                debug!("Row {row}: {} cell(s) written", writes.len());
            }
        }
        EditOp::AddRow => {
            let id = editor.add_row();
            info!("Added row {id}");
        }
        EditOp::DeleteRow(row) => {
            editor
                .delete_row_by_id(*row)
                .with_context(|| format!("Deleting row {row}"))?;
        }
        EditOp::Undo => {
            if !editor.undo() {
                warn!("Nothing to undo");
            }
        }
        EditOp::Redo => {
            if !editor.redo() {
                warn!("Nothing to redo");
            }
        }
    }
    Ok(())
}

fn handle_suggest(args: &cli::SuggestArgs, config: &Config) -> Result<()> {
    let (editor, _) = open_editor(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        config,
    )?;
    if editor.sheet().column_index(&args.column).is_none() {
        return Err(anyhow!("Column '{}' not found", args.column));
    }
    let candidates = args
        .candidates
        .as_deref()
        .map(StaticCandidates::load)
        .transpose()?;
    let source = candidates.as_ref().map(|c| c as &dyn CandidateSource);
    let suggestions = editor.suggestions(&args.column, &args.value, source);
    debug!(
        "Input kind for '{}': {:?}",
        args.column,
        editor.input_kind(&args.column)
    );
    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}

fn handle_sessions(args: &cli::SessionsArgs, config: &Config) -> Result<()> {
    let store = JsonFileStore::new(&args.store);
    if args.clear {
        store.save(&SessionLog::new())?;
        info!("Cleared sessions in {:?}", args.store);
        return Ok(());
    }

    let log = store.load()?;
    if let Some(name) = &args.restore {
        let entry = log
            .find(name)
            .ok_or_else(|| anyhow!("No saved session for '{name}'"))?;
        let editor = Editor::from_session(entry, config.classifier(), config.history_limit())?;
        let output = args.output.as_deref();
        let delimiter = io_utils::resolve_output_delimiter(
            output,
            args.delimiter,
            io_utils::DEFAULT_CSV_DELIMITER,
        );
        io_utils::write_sheet_to_path(
            editor.sheet(),
            output,
            delimiter,
            io_utils::resolve_encoding(None)?,
        )?;
        return Ok(());
    }

    if log.is_empty() {
        info!("No saved sessions in {:?}", args.store);
        return Ok(());
    }
    let now = Utc::now();
    for entry in log.entries() {
        println!(
            "{}\t{} sheet(s)\t{} row(s)\t{}",
            entry.file_name,
            entry.sheet_count,
            entry.row_count,
            session::time_ago(entry.timestamp, now)
        );
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
