use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use super::{Report, ReportTable};

/// Human-readable rendering of every report, one block per table
pub fn render_reports(reports: &[Report]) -> String {
    let mut out = String::new();
    for report in reports {
        let title = report.kind.title();
        out.push_str(title);
        out.push('\n');
        out.push_str(&"=".repeat(title.len()));
        out.push_str("\n\n");

        for table in &report.tables {
            out.push_str(&heading(table.name));
            out.push('\n');
            if table.rows.is_empty() {
                out.push_str("(no rows)\n\n");
                continue;
            }
            out.push_str(&render_table(table).to_string());
            out.push_str("\n\n");
        }
    }
    out
}

fn heading(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_table(table: &ReportTable) -> Table {
    let mut rendered = Table::new();
    rendered
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(table.columns.iter().map(Cell::new));

    for row in &table.rows {
        rendered.add_row(row.iter().map(|value| {
            let cell = Cell::new(value);
            if is_numeric(value) {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            }
        }));
    }
    rendered
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}
