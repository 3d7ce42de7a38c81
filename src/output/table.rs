//! Table output formatting

use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, Width, object::Rows, object::Segment},
};

/// Cells wider than this wrap onto further lines
const MAX_CELL_WIDTH: usize = 60;

/// Placeholder display models use for a missing value
const MISSING: &str = "--";

/// Format rows as a table with a centered header
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "Nothing to show.".to_string();
    }

    Table::new(data)
        .with(Style::rounded())
        .with(Modify::new(Segment::all()).with(Width::wrap(MAX_CELL_WIDTH)))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// Format label/value pairs as a headerless two-column table
///
/// Rows whose value is empty or the missing placeholder are left out.
pub fn format_details(rows: &[(&str, String)]) -> String {
    let mut builder = Builder::default();
    for (label, value) in rows {
        if value.is_empty() || value == MISSING {
            continue;
        }
        builder.push_record([label.to_string(), value.clone()]);
    }

    builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Segment::all()).with(Width::wrap(MAX_CELL_WIDTH)))
        .to_string()
}
