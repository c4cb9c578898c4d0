//! Minimal titled table with text and HTML renderings.

use std::fmt::Write as _;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

impl Align {
    fn css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right => "right",
            Align::Center => "center",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Column {
    header: String,
    align: Align,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    title: String,
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, header: impl Into<String>, align: Align) -> Self {
        self.columns.push(Column {
            header: header.into(),
            align,
        });
        self
    }

    /// Missing trailing cells render empty; extra cells are dropped.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .columns
            .iter()
            .map(|c| c.header.chars().count())
            .collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        // Widen the last column if the title does not fit.
        let inner: usize = widths.iter().map(|w| w + 2).sum();
        let title_needs = self.title.chars().count() + 2;
        if title_needs > inner {
            if let Some(last) = widths.last_mut() {
                *last += title_needs - inner;
            }
        }
        widths
    }

    /// Framed plain text: outer border only, columns separated by padding.
    pub fn to_text(&self) -> String {
        let widths = self.widths();
        let inner: usize = widths
            .iter()
            .map(|w| w + 2)
            .sum::<usize>()
            .max(self.title.chars().count() + 2);
        let rule = format!("+{}+", "-".repeat(inner));

        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "|{:^inner$}|", self.title);
        let _ = writeln!(out, "{rule}");

        let header: Vec<(&str, Align)> = self
            .columns
            .iter()
            .map(|c| (c.header.as_str(), Align::Center))
            .collect();
        let _ = writeln!(out, "{}", render_line(&header, &widths));
        let _ = writeln!(out, "{rule}");

        for row in &self.rows {
            let cells: Vec<(&str, Align)> = row
                .iter()
                .zip(&self.columns)
                .map(|(cell, col)| (cell.as_str(), col.align))
                .collect();
            let _ = writeln!(out, "{}", render_line(&cells, &widths));
        }
        if !self.rows.is_empty() {
            let _ = writeln!(out, "{rule}");
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<table>\n");
        let _ = writeln!(out, "    <caption>{}</caption>", escape_html(&self.title));
        out.push_str("    <thead>\n        <tr>\n");
        for col in &self.columns {
            let _ = writeln!(out, "            <th>{}</th>", escape_html(&col.header));
        }
        out.push_str("        </tr>\n    </thead>\n    <tbody>\n");
        for row in &self.rows {
            out.push_str("        <tr>\n");
            for (cell, col) in row.iter().zip(&self.columns) {
                let _ = writeln!(
                    out,
                    "            <td style=\"text-align: {}\">{}</td>",
                    col.align.css(),
                    escape_html(cell)
                );
            }
            out.push_str("        </tr>\n");
        }
        out.push_str("    </tbody>\n</table>");
        out
    }
}

fn render_line(cells: &[(&str, Align)], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for ((cell, align), &w) in cells.iter().zip(widths) {
        let padded = match align {
            Align::Left => format!("{cell:<w$}"),
            Align::Right => format!("{cell:>w$}"),
            Align::Center => format!("{cell:^w$}"),
        };
        let _ = write!(line, " {padded} ");
    }
    line.push('|');
    line
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
