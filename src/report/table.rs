use std::fmt::Write;

use crate::calc::{ACCURACY_PP, AIM_PP, RecalculatedScore, SPEED_PP};
use crate::ranking::RankedReport;

/// Attribute columns shown for every run. Entries without them show `-`.
pub const DEFAULT_ATTRIBUTE_COLUMNS: [&str; 3] = [AIM_PP, SPEED_PP, ACCURACY_PP];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

struct Column {
    title: String,
    align: Align,
}

impl Column {
    fn new(title: impl Into<String>, align: Align) -> Self {
        Self {
            title: title.into(),
            align,
        }
    }
}

/// `Local PP: ...` line followed by the ranked table.
pub fn render_report(report: &RankedReport, extra_columns: &[String]) -> String {
    let mut out = format!(
        "Local PP: {:.1} (including {:.1}pp from playcount)\n",
        report.local_pp(),
        report.bonus
    );
    out.push_str(&render_table(&report.entries, extra_columns));
    out
}

pub fn render_table(entries: &[RecalculatedScore], extra_columns: &[String]) -> String {
    let mut columns = vec![
        Column::new("#", Align::Left),
        Column::new("beatmap", Align::Left),
        Column::new("mods", Align::Right),
        Column::new("local pp", Align::Right),
        Column::new("acc", Align::Right),
        Column::new("miss", Align::Right),
        Column::new("combo", Align::Right),
    ];
    columns.extend(
        DEFAULT_ATTRIBUTE_COLUMNS
            .iter()
            .map(|name| Column::new(*name, Align::Right)),
    );
    columns.extend(
        extra_columns
            .iter()
            .map(|name| Column::new(name.as_str(), Align::Right)),
    );

    let rows: Vec<Vec<String>> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| row_cells(i, entry, extra_columns))
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(c, column)| {
            rows.iter()
                .map(|row| utf8_slice::len(&row[c]))
                .chain(std::iter::once(utf8_slice::len(&column.title)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| center(&column.title, *width))
        .collect();
    let _ = writeln!(out, " {} ", header.join(" | "));
    let _ = writeln!(out, "{separator}");

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(columns.iter().zip(&widths))
            .map(|(cell, (column, width))| pad(cell, *width, column.align))
            .collect();
        let _ = writeln!(out, " {} ", cells.join(" | "));
    }
    out
}

fn row_cells(index: usize, entry: &RecalculatedScore, extra_columns: &[String]) -> Vec<String> {
    let score = &entry.score;
    let mut cells = vec![
        (index + 1).to_string(),
        entry.map_name.clone(),
        score.mods.to_string(),
        format!("{:.1}", entry.pp),
        format!("{:.2} %", score.accuracy * 100.0),
        score.count_miss.to_string(),
        format!("{}/{}", score.max_combo, score.map_max_combo),
    ];
    cells.extend(
        DEFAULT_ATTRIBUTE_COLUMNS
            .iter()
            .copied()
            .chain(extra_columns.iter().map(String::as_str))
            .map(|name| attribute_cell(entry, name)),
    );
    cells
}

fn attribute_cell(entry: &RecalculatedScore, name: &str) -> String {
    entry
        .attribute(name)
        .map_or_else(|| "-".to_owned(), |value| format!("{value:.1}"))
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{text:<width$}"),
        Align::Right => format!("{text:>width$}"),
    }
}

fn center(text: &str, width: usize) -> String {
    format!("{text:^width$}")
}
