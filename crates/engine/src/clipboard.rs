//! Tab-separated clipboard text.
//!
//! Rows are separated by `\n` (a trailing `\r` is tolerated), cells by `\t`.
//! A single trailing newline, as spreadsheet apps append, does not create an
//! extra empty row.

/// Parse clipboard text into a 2-D block.
pub fn parse_tsv(text: &str) -> Vec<Vec<String>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 && lines.last().is_some_and(|l| l.trim_end_matches('\r').is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .map(|line| {
            line.trim_end_matches('\r')
                .split('\t')
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Format a 2-D block as clipboard text. Tabs and line breaks inside cells
/// become spaces so the shape survives a round trip.
pub fn format_tsv(block: &[Vec<String>]) -> String {
    block
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| sanitize(cell))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn sanitize(cell: &str) -> String {
    cell.chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}
