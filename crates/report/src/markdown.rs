//! Markdown report for pull request comments.
//!
//! Always emits the full column set. The command and status headers are left
//! blank so the table reads as a compact list in the comment.

use crate::format::{format_baseline, format_delta, format_value};
use perfwatch_core::{Column, ReportRow, Status};

fn header(column: Column) -> &'static str {
    match column {
        Column::Status | Column::Command => "",
        Column::Current => "Current",
        Column::Baseline => "Baseline",
        Column::Delta => "Δ",
    }
}

/// Status glyph used in markdown output.
pub fn status_glyph(status: Status) -> &'static str {
    match status {
        Status::Regressed => "⬆️",
        Status::Improved => "⬇️",
        Status::Unchanged => "✅",
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

fn cell(row: &ReportRow, column: Column) -> String {
    match column {
        Column::Status => status_glyph(row.status).to_string(),
        Column::Command => escape(&row.command),
        Column::Current => format_value(row.current),
        Column::Baseline => format_baseline(row.baseline),
        Column::Delta => format_delta(row.delta),
    }
}

fn line<I: IntoIterator<Item = String>>(cells: I) -> String {
    format!("| {} |", cells.into_iter().collect::<Vec<_>>().join(" | "))
}

/// Render rows as a markdown pipe table. Returns an empty string for no rows.
pub fn render(rows: &[ReportRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(Column::ALL.iter().map(|c| header(*c).to_string())));
    lines.push(line(Column::ALL.iter().map(|_| "---".to_string())));
    for row in rows {
        lines.push(line(Column::ALL.iter().map(|c| cell(row, *c))));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::{compare, BaselineSet, Measurement};

    fn rows(current: &[(&str, f64)], baseline: &[(&str, f64)]) -> Vec<ReportRow> {
        let measurements: Vec<_> = current
            .iter()
            .map(|(n, v)| Measurement::new(*n, *v))
            .collect();
        let baseline: BaselineSet = baseline
            .iter()
            .map(|(n, v)| Measurement::new(*n, *v))
            .collect();
        compare(&measurements, &baseline)
    }

    #[test]
    fn test_empty_rows_render_nothing() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_render_with_missing_baseline() {
        let table = render(&rows(&[("first", 1.0), ("second", 2.0)], &[("first", 1.0)]));

        assert_eq!(
            table,
            "|  |  | Current | Baseline | Δ |\n\
             | --- | --- | --- | --- | --- |\n\
             | ✅ | first | 1 | 1 | 0 |\n\
             | ✅ | second | 2 | - | 0 |"
        );
    }

    #[test]
    fn test_render_regression_and_improvement() {
        let table = render(&rows(&[("a", 3.0), ("b", 1.5)], &[("a", 1.0), ("b", 2.0)]));
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "| ⬆️ | a | 3 | 1 | +2 |");
        assert_eq!(lines[3], "| ⬇️ | b | 1.5 | 2 | -0.5 |");
    }

    #[test]
    fn test_pipes_in_command_names_are_escaped() {
        let table = render(&rows(&[("a|b", 1.0)], &[]));
        assert!(table.contains("| a\\|b |"));
    }
}
