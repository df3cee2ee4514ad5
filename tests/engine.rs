mod common;

use common::sheet;
use encoding_rs::UTF_8;
use proptest::prelude::*;
use sheet_editor::{
    editor::Editor,
    filter::{self, FilterSet},
    formula,
    history::DEFAULT_HISTORY_LIMIT,
    io_utils,
    session::{MemoryStore, SessionStore},
    suggest,
};

fn csv_bytes(editor: &Editor) -> Vec<u8> {
    let mut out = Vec::new();
    io_utils::write_sheet(editor.sheet(), &mut out, b',', UTF_8).unwrap();
    out
}

#[test]
fn formulas_address_cells_by_letter_and_sheet_row() {
    let table = sheet(&["A", "B", "C"], &[&["label", "5", "7"]]);
    assert_eq!(formula::evaluate("=B2+C2", &table), "12");
    assert_eq!(formula::evaluate("=SUM(B2:C2)", &table), "12");
    assert_eq!(formula::evaluate("=B9+C2", &table), "7");
    assert_eq!(formula::evaluate("=SUM(B2:Z2)", &table), "12");
    assert_eq!(formula::evaluate(r#"=CONCAT(B2,"-",C2)"#, &table), "5-7");
    assert_eq!(formula::evaluate("=B2/0", &table), "=B2/0");
    assert_eq!(formula::evaluate("plain", &table), "plain");
}

#[test]
fn chained_formulas_read_raw_text() {
    let table = sheet(&["A", "B"], &[&["2", "=A2*3"], &["", "=B2+1"]]);
    assert_eq!(formula::evaluate("=A2*3", &table), "6");
    // B2 holds formula text, so the reference does not see 6.
    assert_eq!(formula::evaluate("=B2+1", &table), "=A2*31");
}

#[test]
fn autofill_through_editor() {
    let mut editor = Editor::new(sheet(
        &["Input", "LL", "Chest", "Sleeve", "Output"],
        &[&[], &[]],
    ));
    editor.set_cell(0, "Input", "44-89-77").unwrap();
    let values = ["LL", "Chest", "Sleeve", "Output"]
        .iter()
        .map(|c| editor.display_value(0, c).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(values, vec!["44", "89", "77", "44x89x77"]);

    editor.set_cell(1, "Input", "7-8").unwrap();
    assert_eq!(editor.display_value(1, "Input").unwrap(), "7-8");
    assert!(
        ["LL", "Chest", "Sleeve", "Output"]
            .iter()
            .all(|c| editor.display_value(1, c).unwrap().is_empty())
    );
}

#[test]
fn undo_redo_restore_exact_states() {
    let mut editor = Editor::new(sheet(&["name", "qty"], &[&["a", "1"], &["b", "2"]]));
    editor.set_cell(0, "qty", "5").unwrap();
    editor.set_cell(1, "name", "z").unwrap();
    let before_last = csv_bytes(&editor);
    editor.set_cell(0, "name", "=B2*2").unwrap();
    let edited = csv_bytes(&editor);

    assert!(editor.undo());
    assert_eq!(csv_bytes(&editor), before_last);
    assert!(editor.redo());
    assert_eq!(csv_bytes(&editor), edited);

    assert!(editor.undo());
    editor.add_row();
    assert!(!editor.redo());
    assert_eq!(editor.sheet().len(), 3);
}

#[test]
fn history_is_capped() {
    let mut editor = Editor::new(sheet(&["n"], &[&["0"]]));
    for i in 1..=80 {
        editor.set_cell(0, "n", &i.to_string()).unwrap();
    }
    assert_eq!(editor.history().len(), DEFAULT_HISTORY_LIMIT);
    let mut undone = 0;
    while editor.undo() {
        undone += 1;
    }
    assert_eq!(undone, DEFAULT_HISTORY_LIMIT - 1);
    assert_eq!(editor.display_value(0, "n").unwrap(), "31");
}

#[test]
fn filter_combines_exact_match_and_search() {
    let table = sheet(
        &["name", "status"],
        &[
            &["Jon Smith", "active"],
            &["jonas", "inactive"],
            &["Ann", "active"],
            &["MAJONG", "active"],
        ],
    );
    let filters = FilterSet::from_iter([("status", "active")]);
    assert_eq!(filter::filter_indices(&table, &filters, "jon"), vec![0, 3]);
}

#[test]
fn suggestion_ranking_breaks_ties_by_first_encounter() {
    let table = sheet(
        &["color"],
        &[&["red"], &["blue"], &["red"], &["red"], &["green"]],
    );
    let result = suggest::suggest(&table, "color", "", None);
    assert_eq!(result.common, vec!["red", "blue", "green"]);
}

#[test]
fn session_round_trip_restores_view_state() {
    let store = MemoryStore::new();
    let mut editor = Editor::new(sheet(&["name", "status"], &[&["a", "open"], &["b", "done"]]));
    editor.set_source("tasks.csv", vec!["tasks".into()], 0);
    editor.set_filter("status", "open");
    editor.set_cell(1, "name", "bb").unwrap();
    let now = chrono::Utc::now();
    assert!(editor.save_session(&store, now).unwrap());

    let log = store.load().unwrap();
    let entry = log.find("tasks.csv").unwrap();
    let restored = Editor::from_session(
        entry,
        Box::new(sheet_editor::columns::HeaderHeuristics),
        DEFAULT_HISTORY_LIMIT,
    )
    .unwrap();
    assert_eq!(restored.sheet(), editor.sheet());
    assert_eq!(restored.filters().get("status"), Some("open"));
    assert_eq!(restored.visible_indices(), vec![0]);
    assert!(!restored.history().can_undo());
}

proptest! {
    #[test]
    fn filtered_rows_always_satisfy_every_constraint(
        rows in prop::collection::vec(("[ab]{0,2}", "[xy]{0,1}"), 0..20),
        want in "[ab]{0,2}",
        search in "[aby]{0,1}",
    ) {
        let records = rows
            .iter()
            .map(|(a, b)| vec![a.clone(), b.clone()])
            .collect::<Vec<_>>();
        let table = sheet_editor::sheet::Sheet::from_records(
            vec!["k".into(), "v".into()],
            records,
        )
        .unwrap();
        let filters = FilterSet::from_iter([("k", want.as_str())]);
        let hits = filter::filter_indices(&table, &filters, &search);
        for (index, row) in table.rows().iter().enumerate() {
            let key_ok = want.is_empty() || row.text(0) == want;
            let search_ok = (0..2).any(|c| row.text(c).to_lowercase().contains(&search));
            prop_assert_eq!(hits.contains(&index), key_ok && search_ok);
        }
    }
}
