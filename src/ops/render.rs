//! Result table rendering.

use crate::ops::result::{VendorResult, VendorStatus};

/// Messages are wrapped to this many columns.
pub const MESSAGE_WRAP_WIDTH: usize = 90;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

impl VendorStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            VendorStatus::Ok | VendorStatus::Generated => "✓",
            VendorStatus::Drift | VendorStatus::Missing | VendorStatus::Error => "✗",
            VendorStatus::Skipped | VendorStatus::Warning => "○",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            VendorStatus::Ok | VendorStatus::Generated => GREEN,
            VendorStatus::Drift | VendorStatus::Missing | VendorStatus::Error => RED,
            VendorStatus::Skipped | VendorStatus::Warning => YELLOW,
        }
    }
}

/// A cell is one or more lines of plain text plus an optional style.
struct Cell {
    lines: Vec<String>,
    style: Option<&'static str>,
}

impl Cell {
    fn width(&self) -> usize {
        self.lines.iter().map(|l| display_width(l)).max().unwrap_or(0)
    }
}

/// Render `results` as a rounded-border table with File, Status and
/// Message columns. ANSI styling is only emitted when `color` is set.
pub fn render_results(results: &[VendorResult], color: bool) -> String {
    let header = ["File", "Status", "Message"].map(|h| Cell {
        lines: vec![h.to_string()],
        style: Some(BOLD),
    });

    let rows: Vec<[Cell; 3]> = results
        .iter()
        .map(|r| {
            [
                Cell {
                    lines: vec![r.path.display().to_string()],
                    style: None,
                },
                Cell {
                    lines: vec![format!("{} {}", r.status.symbol(), r.status)],
                    style: Some(r.status.color()),
                },
                Cell {
                    lines: wrap(&r.message, MESSAGE_WRAP_WIDTH),
                    style: Some(GRAY),
                },
            ]
        })
        .collect();

    let mut widths = header.each_ref().map(Cell::width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    border(&mut out, &widths, ('╭', '┬', '╮'), color);
    line(&mut out, &header, &widths, color);
    border(&mut out, &widths, ('├', '┼', '┤'), color);
    for row in &rows {
        line(&mut out, row, &widths, color);
    }
    border(&mut out, &widths, ('╰', '┴', '╯'), color);
    out
}

fn border(out: &mut String, widths: &[usize; 3], (left, mid, right): (char, char, char), color: bool) {
    let mut s = String::new();
    s.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            s.push(mid);
        }
        s.extend(std::iter::repeat('─').take(width + 2));
    }
    s.push(right);
    out.push_str(&paint(&s, GRAY, color));
    out.push('\n');
}

fn line(out: &mut String, cells: &[Cell; 3], widths: &[usize; 3], color: bool) {
    let height = cells.iter().map(|c| c.lines.len()).max().unwrap_or(1);
    let bar = paint("│", GRAY, color);

    for i in 0..height {
        out.push_str(&bar);
        for (cell, width) in cells.iter().zip(widths) {
            let text = cell.lines.get(i).map(String::as_str).unwrap_or("");
            let pad = width - display_width(text);
            out.push(' ');
            match cell.style {
                Some(style) if !text.is_empty() => out.push_str(&paint(text, style, color)),
                _ => out.push_str(text),
            }
            out.push_str(&" ".repeat(pad + 1));
            out.push_str(&bar);
        }
        out.push('\n');
    }
}

fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", style, text, RESET)
    } else {
        text.to_string()
    }
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

/// Word-wrap each line of `text` to `width` columns.
///
/// Leading indentation is kept on the first piece of a line. Words longer
/// than `width` are never split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        if display_width(raw) <= width {
            lines.push(raw.to_string());
            continue;
        }

        let indent_len = raw.len() - raw.trim_start().len();
        let mut current = raw[..indent_len].to_string();
        let mut has_word = false;
        for word in raw.split_whitespace() {
            let needed = display_width(word) + usize::from(has_word);
            if has_word && display_width(&current) + needed > width {
                lines.push(std::mem::take(&mut current));
                has_word = false;
            }
            if has_word {
                current.push(' ');
            }
            current.push_str(word);
            has_word = true;
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
