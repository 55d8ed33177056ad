use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cdm_metrics::{
    MAPSTREAM_HEADER, MapstreamSummaryRow, NOT_AVAILABLE, STAGE_HEADER, StageSummaryRow,
};

/// Reject percentage at or above which a cell is highlighted.
const HIGH_REJECT_PCT: f64 = 10.0;

pub fn stage_table(rows: &[StageSummaryRow]) -> Table {
    let mut table = Table::new();
    table.set_header(STAGE_HEADER.iter().map(|label| header_cell(label)));
    apply_summary_table_style(&mut table);
    for index in 4..STAGE_HEADER.len() {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for row in rows {
        table.add_row(vec![
            source_cell(&row.source),
            Cell::new(&row.table),
            Cell::new(&row.name),
            Cell::new(&row.column).add_attribute(Attribute::Bold),
            Cell::new(row.before),
            Cell::new(row.after),
            pct_cell(row.reject_pct),
            row.after_formatting
                .map_or_else(|| dim_cell(NOT_AVAILABLE), Cell::new),
            pct_cell(row.format_pct),
        ]);
    }
    table
}

pub fn mapstream_table(rows: &[MapstreamSummaryRow]) -> Table {
    let mut table = Table::new();
    table.set_header(MAPSTREAM_HEADER.iter().map(|label| header_cell(label)));
    apply_summary_table_style(&mut table);
    for index in 3..MAPSTREAM_HEADER.len() {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for row in rows {
        table.add_row(vec![
            source_cell(&row.source),
            Cell::new(&row.field).add_attribute(Attribute::Bold),
            Cell::new(&row.table),
            count_cell(row.input_count, Color::Reset),
            count_cell(row.invalid_person_ids, Color::Red),
            count_cell(row.invalid_source_fields, Color::Red),
            count_cell(row.invalid_date_fields, Color::Yellow),
            count_cell(row.output_count, Color::Green),
        ]);
    }
    table
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn source_cell(source: &str) -> Cell {
    if source == cdm_metrics::UNATTRIBUTED_SOURCE {
        dim_cell(source)
    } else {
        Cell::new(source).fg(Color::Blue)
    }
}

fn pct_cell(pct: Option<f64>) -> Cell {
    match pct {
        Some(value) if value >= HIGH_REJECT_PCT => Cell::new(format!("{value:.3}"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Some(value) => Cell::new(format!("{value:.3}")),
        None => dim_cell(NOT_AVAILABLE),
    }
}

fn count_cell(count: Option<u64>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
