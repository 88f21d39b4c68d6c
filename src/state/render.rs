//! Status sinks.

use super::{StatusRecord, StatusUpdate};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

const HEADERS: [&str; 3] = ["EP", "Output", "Files"];

/// Receives status changes from the aggregator's render thread.
///
/// `on_update` is called once per report, in report order. `render` is called
/// with the full record set after one or more updates; snapshots that were
/// already stale when the renderer got to them are skipped.
pub trait StatusSink: Send + Sync {
    fn on_update(&self, _update: &StatusUpdate) {}

    fn render(&self, _header: &str, _rows: &[StatusRecord]) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {}

/// Append-only sink: one log line per report, no redraws.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn on_update(&self, update: &StatusUpdate) {
        info!(
            episode = %update.episode,
            files = update.files.len(),
            "{}",
            update.label
        );
    }
}

/// Full-refresh terminal table: clears the screen, prints the header and the
/// bordered `EP | Output | Files` table, then pauses so a person can read it.
#[derive(Debug, Clone)]
pub struct TableSink {
    pause: Duration,
}

impl TableSink {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }
}

impl StatusSink for TableSink {
    fn render(&self, header: &str, rows: &[StatusRecord]) {
        let mut out = std::io::stdout().lock();

        if let Err(e) = execute!(out, Clear(ClearType::All), MoveTo(0, 0)) {
            debug!("Failed to clear terminal: {}", e);
        }
        if let Err(e) = draw(&mut out, header, rows) {
            debug!("Failed to draw status table: {}", e);
        }
        drop(out);

        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
    }
}

/// Write the header and the table, then flush.
fn draw<W: Write>(out: &mut W, header: &str, rows: &[StatusRecord]) -> io::Result<()> {
    writeln!(out, "{}", header)?;
    writeln!(out, "{}", render_table(rows))?;
    out.flush()
}

/// Render records as a fully bordered, left-aligned table. Cells may span
/// several lines; every row is closed by a horizontal rule.
pub fn render_table(rows: &[StatusRecord]) -> String {
    let cells: Vec<[String; 3]> = rows
        .iter()
        .map(|r| [r.episode.to_string(), r.output_text(), r.files_text()])
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            let longest = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            *width = (*width).max(longest);
        }
    }

    let rule = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    out.push_str(&rule);

    for row in &cells {
        out.push('\n');
        push_row(&mut out, row, &widths);
        out.push_str(&rule);
    }

    out
}

fn push_row(out: &mut String, row: &[String; 3], widths: &[usize; 3]) {
    let lines: Vec<Vec<&str>> = row.iter().map(|c| c.lines().collect()).collect();
    let height = lines.iter().map(Vec::len).max().unwrap_or(0).max(1);

    for i in 0..height {
        out.push('|');
        for (cell, width) in lines.iter().zip(widths) {
            let text = cell.get(i).copied().unwrap_or("");
            let pad = width - text.chars().count();
            out.push(' ');
            out.push_str(text);
            out.push_str(&" ".repeat(pad + 1));
            out.push('|');
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::EpisodeNumber;

    fn record(ep: &str, labels: &[&str], files: &[&str]) -> StatusRecord {
        StatusRecord {
            episode: EpisodeNumber::from_digits(ep),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let table = render_table(&[]);
        assert_eq!(
            table,
            "+----+--------+-------+\n\
             | EP | Output | Files |\n\
             +----+--------+-------+"
        );
    }

    #[test]
    fn test_multiline_cells() {
        let rows = vec![record(
            "1",
            &["Merge: started", "Merge: done"],
            &["/in/a.mkv", "/in/a.eng.ass"],
        )];
        let table = render_table(&rows);
        let expected = "\
+----+----------------+---------------+
| EP | Output         | Files         |
+----+----------------+---------------+
| 01 | Merge: started | /in/a.mkv     |
|    | Merge: done    | /in/a.eng.ass |
+----+----------------+---------------+";
        assert_eq!(table, expected);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_draw_writes_header_then_table() {
        let mut out = Vec::new();
        draw(&mut out, "Info:", &[record("3", &["Merge: started"], &["a"])]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Info:\n+----+"));
        assert!(text.contains("| 03 | Merge: started |"));
    }

    #[test]
    fn test_draw_reports_write_errors() {
        let err = draw(&mut BrokenPipe, "Info:", &[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_every_row_closed_by_rule() {
        let rows = vec![
            record("1", &["Merge: started"], &["a"]),
            record("2", &["Merge: started"], &["b"]),
        ];
        let table = render_table(&rows);
        let rules = table.lines().filter(|l| l.starts_with('+')).count();
        assert_eq!(rules, 4);
    }
}
