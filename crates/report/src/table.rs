//! Interactive terminal table.
//!
//! Columns are chosen from the fixed column order, keeping those populated on
//! the first row. Numeric columns are right-aligned.
//!
//! ```text
//! ┌─────────────┬─────────┬─────────┬──────────┬───────┐
//! │ status      ┆ command ┆ current ┆ baseline ┆ delta │
//! ╞═════════════╪═════════╪═════════╪══════════╪═══════╡
//! │ ▲ regressed ┆ first   ┆       3 ┆        1 ┆    +2 │
//! └─────────────┴─────────┴─────────┴──────────┴───────┘
//! ```

use crate::format::{format_baseline, format_delta, format_value};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use perfwatch_core::{Column, ReportRow, Status};

/// Rendering options for the interactive table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Colour status cells with ANSI escapes.
    pub color: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TableOptions {
    /// Options without colour, for logs and tests.
    pub fn plain() -> Self {
        Self { color: false }
    }
}

fn header(column: Column) -> &'static str {
    match column {
        Column::Status => "status",
        Column::Command => "command",
        Column::Current => "current",
        Column::Baseline => "baseline",
        Column::Delta => "delta",
    }
}

/// Status label used in the terminal.
pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Regressed => "▲ regressed",
        Status::Improved => "▼ improved",
        Status::Unchanged => "= unchanged",
    }
}

fn right_aligned(column: Column) -> bool {
    matches!(column, Column::Current | Column::Baseline | Column::Delta)
}

fn paint(label: &str, status: Status, options: TableOptions) -> String {
    if !options.color {
        return label.to_string();
    }
    match status {
        Status::Regressed => label.red().bold().to_string(),
        Status::Improved => label.green().to_string(),
        Status::Unchanged => label.dimmed().to_string(),
    }
}

fn cell(row: &ReportRow, column: Column, options: TableOptions) -> Cell {
    if !row.has(column) {
        return Cell::new("");
    }
    match column {
        Column::Status => Cell::new(paint(status_label(row.status), row.status, options)),
        Column::Command => Cell::new(&row.command),
        Column::Current => Cell::new(format_value(row.current)),
        Column::Baseline => Cell::new(format_baseline(row.baseline)),
        Column::Delta => Cell::new(format_delta(row.delta)),
    }
}

/// Render rows as a box-drawn table. Returns an empty string for no rows.
pub fn render(rows: &[ReportRow], options: TableOptions) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let columns = first.columns();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(columns.iter().map(|c| header(*c)));

    for row in rows {
        table.add_row(columns.iter().map(|c| cell(row, *c, options)));
    }

    for (index, column) in columns.iter().enumerate() {
        if right_aligned(*column) {
            if let Some(target) = table.column_mut(index) {
                target.set_cell_alignment(CellAlignment::Right);
            }
        }
    }

    table.to_string()
}
