//! Plain-text tables for the inspection commands.

use std::{borrow::Cow, fmt::Write as _};

const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers = headers.into_iter().map(Into::into).collect::<Vec<_>>();
        let align = vec![Align::Left; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
        }
    }

    /// Right-aligns the given column positions (counts, percentages).
    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &idx in columns {
            if let Some(slot) = self.align.get_mut(idx) {
                *slot = Align::Right;
            }
        }
        self
    }

    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row = cells.into_iter().map(Into::into).collect::<Vec<String>>();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths = self
            .headers
            .iter()
            .map(|h| display_width(h).max(3))
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(&flatten(cell)));
            }
        }

        let mut output = String::new();
        let _ = writeln!(output, "{}", self.line(&self.headers, &widths));
        let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
        let _ = writeln!(output, "{}", self.line(&rule, &widths));
        for row in &self.rows {
            let _ = writeln!(output, "{}", self.line(row, &widths));
        }
        output
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        let rendered = cells
            .iter()
            .zip(widths)
            .zip(&self.align)
            .map(|((cell, &width), align)| {
                let cell = flatten(cell);
                let pad = " ".repeat(width.saturating_sub(display_width(&cell)));
                match align {
                    Align::Left => format!("{cell}{pad}"),
                    Align::Right => format!("{pad}{cell}"),
                }
            })
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        rendered.trim_end().to_string()
    }
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

/// Newlines and tabs would break row alignment.
fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_rule_and_aligned_rows() {
        let mut table = Table::new(["name", "count"]).align_right(&[1]);
        table.push_row(["alpha", "7"]);
        table.push_row(["b", "1234"]);
        assert_eq!(
            table.render(),
            "name   count\n-----  -----\nalpha      7\nb       1234\n"
        );
    }

    #[test]
    fn short_rows_are_padded_and_control_chars_flattened() {
        let mut table = Table::new(["a", "b"]);
        table.push_row(["x\ny"]);
        let rendered = table.render();
        assert!(rendered.lines().nth(2).unwrap().starts_with("x y"));
        assert!(!table.is_empty());
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let mut table = Table::new(["city"]);
        table.push_row(["München"]);
        let rendered = table.render();
        assert_eq!(rendered.lines().nth(1).unwrap(), "-------");
    }
}
