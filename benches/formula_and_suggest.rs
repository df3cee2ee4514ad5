use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use sheet_editor::editor::Editor;
use sheet_editor::filter::{self, FilterSet};
use sheet_editor::formula;
use sheet_editor::sheet::Sheet;
use sheet_editor::suggest;

fn generate_orders(rows: usize) -> Sheet {
    let headers = ["id", "status", "qty", "price", "total"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let records = (0..rows)
        .map(|i| {
            let status = match i % 3 {
                0 => "shipped",
                1 => "pending",
                _ => "processing",
            };
            vec![
                i.to_string(),
                status.to_string(),
                (i % 17).to_string(),
                format!("{}.5", i % 40),
                format!("=C{row}*D{row}", row = i + 2),
            ]
        })
        .collect();
    Sheet::from_records(headers, records).expect("valid sheet")
}

fn bench_formulas(c: &mut Criterion) {
    let sheet = generate_orders(5_000);
    let mut group = c.benchmark_group("formula");
    group.bench_function("evaluate_column", |b| {
        b.iter(|| {
            sheet
                .rows()
                .iter()
                .map(|row| formula::evaluate_cell(&row.cells[4], &sheet))
                .count()
        })
    });
    group.bench_function("sum_range", |b| {
        b.iter(|| formula::evaluate("=SUM(A100:D100)+CONCAT(B2,\"-\",C2)", &sheet))
    });
    group.finish();
}

fn bench_suggest_and_filter(c: &mut Criterion) {
    let sheet = generate_orders(20_000);
    let mut group = c.benchmark_group("lookup");
    group.bench_function("suggest_status", |b| {
        b.iter(|| suggest::suggest(&sheet, "status", "p", None))
    });
    let filters = FilterSet::from_iter([("status", "pending")]);
    group.bench_function("filter_and_search", |b| {
        b.iter(|| filter::filter_indices(&sheet, &filters, "12"))
    });
    group.finish();
}

fn bench_history(c: &mut Criterion) {
    let sheet = generate_orders(2_000);
    c.bench_function("edit_with_history", |b| {
        b.iter_batched(
            || Editor::new(sheet.clone()),
            |mut editor| {
                for i in 0..60 {
                    editor
                        .set_cell(i, "qty", &i.to_string())
                        .expect("known column");
                }
                editor.undo()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_formulas, bench_suggest_and_filter, bench_history);
criterion_main!(benches);
