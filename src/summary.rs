use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};

use crate::pipeline::processing::quality_gate::ValidationCounts;
use crate::pipeline::RunSummary;

/// Console table with the three cleaning counters
pub fn counts_table(counts: &ValidationCounts) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![header_cell("Stage"), header_cell("Records")]);
    table.add_row(vec![Cell::new("Parsed"), Cell::new(counts.parsed)]);
    table.add_row(vec![
        Cell::new("Accepted"),
        Cell::new(counts.accepted).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Rejected"),
        count_cell(counts.rejected, Color::Red),
    ]);
    align_column(&mut table, 1, CellAlignment::Right);
    table
}

pub fn print_counts(counts: &ValidationCounts) {
    println!("{}", counts_table(counts));
}

pub fn print_run_summary(summary: &RunSummary) {
    println!("Run: {}", summary.run_id);
    println!("Output: {}", summary.output_dir.display());
    print_counts(&summary.counts);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![header_cell("Step"), header_cell("Records")]);
    table.add_row(vec![
        Cell::new("Removed by region filter"),
        Cell::new(summary.filter.filtered_by_region),
    ]);
    table.add_row(vec![
        Cell::new("Removed by amount filter"),
        Cell::new(summary.filter.filtered_by_amount),
    ]);
    table.add_row(vec![Cell::new("Enriched"), Cell::new(summary.enriched)]);
    table.add_row(vec![
        Cell::new("Matched in catalogue"),
        Cell::new(summary.matched).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Fallback"),
        count_cell(summary.enriched - summary.matched, Color::Yellow),
    ]);
    align_column(&mut table, 1, CellAlignment::Right);
    println!("{table}");
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        Cell::new(count).fg(Color::DarkGrey)
    } else {
        Cell::new(count).fg(color)
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
