use std::fmt::{Display, Write};
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Align {
    Left,
    Right,
}

impl Default for Align {
    fn default() -> Self {
        Align::Right
    }
}

#[derive(Default, Debug)]
struct Column {
    name: String,
    align: Align,
    vals: Vec<String>,
}

/// Builds a box drawn table for the terminal.
#[derive(Default, Debug)]
pub struct TablePrinter {
    title: Option<String>,
    header: Option<String>,
    footer: Option<String>,
    columns: Vec<Column>,
    fill: String,
}

impl TablePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title<T>(self, title: T) -> Self
    where
        Option<String>: From<T>,
    {
        Self {
            title: Option::from(title),
            ..self
        }
    }

    pub fn with_header<T>(self, header: T) -> Self
    where
        Option<String>: From<T>,
    {
        Self {
            header: Option::from(header),
            ..self
        }
    }

    pub fn with_footer<T>(self, footer: T) -> Self
    where
        Option<String>: From<T>,
    {
        Self {
            footer: Option::from(footer),
            ..self
        }
    }

    /// Text shown in cells of columns shorter than the longest one.
    pub fn with_fill<T: AsRef<str>>(self, fill_string: T) -> Self {
        Self {
            fill: fill_string.as_ref().to_owned(),
            ..self
        }
    }

    /// Add a right aligned column.
    pub fn with_column<T, V>(self, col_name: T, col_vals: &[V]) -> Self
    where
        T: Display,
        V: Display,
    {
        self.with_aligned_column(col_name, col_vals, Align::Right)
    }

    /// Add a left aligned column, for names and other text.
    pub fn with_text_column<T, V>(self, col_name: T, col_vals: &[V]) -> Self
    where
        T: Display,
        V: Display,
    {
        self.with_aligned_column(col_name, col_vals, Align::Left)
    }

    fn with_aligned_column<T, V>(mut self, col_name: T, col_vals: &[V], align: Align) -> Self
    where
        T: Display,
        V: Display,
    {
        self.columns.push(Column {
            name: col_name.to_string(),
            align,
            vals: col_vals.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn add_row(&mut self, row_vals: Vec<String>) {
        debug_assert!(row_vals.len() == self.columns.len());
        for (col, val) in self.columns.iter_mut().zip(row_vals) {
            col.vals.push(val);
        }
    }

    pub fn print(self) -> Result<(), std::fmt::Error> {
        print!("{}", self.render(0)?);
        Ok(())
    }

    /// Draw the table, at least `min_width` characters wide inside the border.
    pub fn render(&self, min_width: usize) -> Result<String, std::fmt::Error> {
        let mut out = String::with_capacity(2000);
        writeln!(out)?;

        if self.columns.is_empty() {
            return Ok(out);
        }

        let (table_width, col_widths) = self.widths(min_width);
        let full = [table_width];

        // Each section opens with a border whose corners depend on what is above it.
        let mut top = true;
        if let Some(ref title) = self.title {
            rule(&mut out, '\u{250c}', '\u{2500}', '\u{2510}', &full)?;
            writeln!(out, "\u{2502}{0:^1$}\u{2502}", title, table_width)?;
            top = false;
        }

        if let Some(ref header) = self.header {
            let (l, r) = corners(top);
            rule(&mut out, l, '\u{2500}', r, &full)?;
            for line in wrapper(header, table_width) {
                writeln!(out, "\u{2502}{0:<1$}\u{2502}", line, table_width)?;
            }
            top = false;
        }

        let (l, r) = corners(top);
        rule(&mut out, l, '\u{252c}', r, &col_widths)?;
        for (col, width) in self.columns.iter().zip(&col_widths) {
            write!(out, "\u{2502} {0:^1$} ", col.name, width - 2)?;
        }
        writeln!(out, "\u{2502}")?;
        rule(&mut out, '\u{251c}', '\u{253c}', '\u{2524}', &col_widths)?;

        let num_rows = self.columns.iter().map(|c| c.vals.len()).max().unwrap_or(0);
        for i in 0..num_rows {
            for (col, width) in self.columns.iter().zip(&col_widths) {
                let val = col.vals.get(i).unwrap_or(&self.fill);
                let pad = (width - 2).saturating_sub(UnicodeWidthStr::width(val.as_str()));
                match col.align {
                    Align::Left => write!(out, "\u{2502} {}{} ", val, " ".repeat(pad))?,
                    Align::Right => write!(out, "\u{2502} {}{} ", " ".repeat(pad), val)?,
                }
            }
            writeln!(out, "\u{2502}")?;
        }

        match self.footer {
            Some(ref footer) => {
                rule(&mut out, '\u{251c}', '\u{2534}', '\u{2524}', &col_widths)?;
                for line in wrapper(footer, table_width) {
                    writeln!(out, "\u{2502}{0:<1$}\u{2502}", line, table_width)?;
                }
                rule(&mut out, '\u{2514}', '\u{2500}', '\u{2518}', &full)?;
            }
            None => rule(&mut out, '\u{2514}', '\u{2534}', '\u{2518}', &col_widths)?,
        }

        Ok(out)
    }

    /// The width inside the outer border and the width of each column including padding.
    fn widths(&self, min_width: usize) -> (usize, Vec<usize>) {
        let title_width = self
            .title
            .as_ref()
            .map(|title| UnicodeWidthStr::width(title.as_str()) + 2)
            .unwrap_or(0);

        let mut col_widths: Vec<usize> = self
            .columns
            .iter()
            .map(|col| {
                col.vals
                    .iter()
                    .chain(std::iter::once(&col.name))
                    .map(|s| UnicodeWidthStr::width(s.as_str()) + 2)
                    .max()
                    .unwrap_or(2)
            })
            .collect();

        let target = min_width.max(title_width);
        let inner = |widths: &[usize]| widths.iter().sum::<usize>() + widths.len() - 1;

        // Widen the narrowest columns until the title fits.
        while inner(&col_widths) < target {
            let narrowest = col_widths.iter().cloned().min().unwrap_or(0);
            for width in col_widths.iter_mut().filter(|w| **w == narrowest) {
                *width += 1;
            }
        }

        (target.max(inner(&col_widths)), col_widths)
    }
}

fn corners(top: bool) -> (char, char) {
    if top {
        ('\u{250c}', '\u{2510}')
    } else {
        ('\u{251c}', '\u{2524}')
    }
}

/// A horizontal border with `joint` between the segments.
fn rule(
    out: &mut String,
    left: char,
    joint: char,
    right: char,
    widths: &[usize],
) -> std::fmt::Result {
    out.push(left);
    for (i, &width) in widths.iter().enumerate() {
        if i > 0 {
            out.push(joint);
        }
        out.push_str(&"\u{2500}".repeat(width));
    }
    out.push(right);
    writeln!(out)
}

/// Split header and footer text into lines no wider than the table.
fn wrapper(text: &str, table_width: usize) -> Vec<&str> {
    let mut lines = vec![];

    let mut remaining = text;
    while remaining.len() > table_width {
        let guess = match remaining.get(..table_width) {
            Some(guess) => guess,
            None => break,
        };

        let right_edge = guess
            .find('\n')
            .or_else(|| guess.rfind(char::is_whitespace))
            .filter(|&edge| edge > 0)
            .unwrap_or(table_width);
        lines.push(&remaining[..right_edge]);
        remaining = remaining[right_edge..].trim();
    }
    lines.push(remaining);

    lines
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_alignment() {
        let table = TablePrinter::new()
            .with_title("KPDX".to_owned())
            .with_text_column("Name", &["amy", "roberto"])
            .with_column("Score", &["100.00", "50.00"]);

        let text = table.render(0).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[2].contains("KPDX"));
        assert!(text.contains("\u{2502} amy     \u{2502} 100.00 \u{2502}"));
        assert!(text.contains("\u{2502} roberto \u{2502}  50.00 \u{2502}"));

        let widths: Vec<usize> = lines[1..]
            .iter()
            .map(|l| UnicodeWidthStr::width(*l))
            .collect();
        assert!(widths.iter().all(|&w| w == widths[0]));
    }

    #[test]
    fn test_fill_and_footer() {
        let mut table = TablePrinter::new()
            .with_footer("3 rows".to_owned())
            .with_fill("-")
            .with_column("A", &[1, 2])
            .with_column("B", &[3]);
        table.add_row(vec!["5".to_owned(), "6".to_owned()]);

        let text = table.render(0).unwrap();
        assert!(text.contains("\u{2502} 2 \u{2502} 6 \u{2502}"));
        assert!(text.contains("\u{2502} 5 \u{2502} - \u{2502}"));
        assert!(text.contains("3 rows"));
    }
}
