//! Report rendering for perfwatch.
//!
//! The same report rows are rendered two ways:
//!
//! - [`table`] - a `comfy_table` terminal table with coloured status labels,
//!   showing only the columns populated on the first row
//! - [`markdown`] - a pipe table with a fixed column set, posted as the pull
//!   request comment
//!
//! Header labels and status glyphs differ between the two. Both return an
//! empty string for an empty report.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod format;
pub mod markdown;
pub mod table;

pub use table::TableOptions;

use perfwatch_core::ReportRow;

/// Render the interactive terminal table.
pub fn render_table(rows: &[ReportRow], options: TableOptions) -> String {
    table::render(rows, options)
}

/// Render the markdown comment table.
pub fn render_markdown(rows: &[ReportRow]) -> String {
    markdown::render(rows)
}
