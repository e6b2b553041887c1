//! Plain-text rendering of typed rows for terminal previews.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{cell::Row, types::CellType};

/// Renders a header line, a type line, a separator, and one line per row.
/// Null cells render as empty; columns missing from a short row are blank.
pub fn render_rows(headers: &[String], types: Option<&[CellType]>, rows: &[Row]) -> String {
    let column_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);

    let header_cells = (0..column_count)
        .map(|idx| headers.get(idx).cloned().unwrap_or_default())
        .collect::<Vec<_>>();
    let type_cells = types.map(|types| {
        (0..column_count)
            .map(|idx| {
                types
                    .get(idx)
                    .map(|ty| format!("<{ty}>"))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
    });
    let body = rows
        .iter()
        .map(|row| {
            (0..column_count)
                .map(|idx| {
                    row.get(idx)
                        .and_then(|cell| cell.value.as_ref())
                        .map(|value| value.as_display())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = vec![1usize; column_count];
    for line in std::iter::once(&header_cells)
        .chain(type_cells.iter())
        .chain(body.iter())
    {
        for (idx, cell) in line.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(&header_cells, &widths));
    if let Some(type_cells) = &type_cells {
        let _ = writeln!(output, "{}", format_line(type_cells, &widths));
    }
    let separator = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&separator, &separator_widths));
    for line in &body {
        let _ = writeln!(output, "{}", format_line(line, &widths));
    }
    output
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
