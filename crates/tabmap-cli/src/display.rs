//! Terminal rendering of proposals and column groups.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tabmap_map::{ColumnGrouping, MappingPreview};
use tabmap_model::Row;

/// A one-row table with the row's columns as header.
pub fn row_table(row: &Row) -> Table {
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.set_header(row.keys().map(header_cell).collect::<Vec<_>>());
    table.add_row(
        row.iter()
            .map(|(_, value)| {
                if value.is_empty() {
                    dim_cell("-")
                } else {
                    Cell::new(value.render())
                }
            })
            .collect::<Vec<_>>(),
    );
    table
}

/// Plain-text column mapping, one target column per line.
pub fn mapping_summary(preview: &MappingPreview) -> String {
    if preview.mapping.is_empty() {
        return "No target value could be traced to a source column.".to_string();
    }
    preview.mapping.to_string()
}

/// Everything shown before asking for a verdict.
pub fn render_preview(preview: &MappingPreview) -> String {
    let mut out = String::new();
    out.push_str("Original row:\n");
    out.push_str(&row_table(&preview.original).to_string());
    out.push_str("\n\nProposed row:\n");
    out.push_str(&row_table(&preview.transformed).to_string());
    out.push_str("\n\nMapping:\n");
    out.push_str(mapping_summary(preview).trim_end());
    out.push('\n');
    if let Some(narration) = &preview.narration {
        out.push('\n');
        out.push_str(narration.trim());
        out.push('\n');
    }
    out
}

pub fn groups_table(grouping: &ColumnGrouping) -> Table {
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.set_header(vec![header_cell("Column"), header_cell("Same values as")]);
    for group in grouping.groups() {
        let duplicates = group.duplicates();
        let members = if duplicates.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(duplicates.join(", ")).fg(Color::Yellow)
        };
        table.add_row(vec![Cell::new(&group.representative), members]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
