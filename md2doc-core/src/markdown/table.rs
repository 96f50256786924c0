//! Pipe-table cell parsing

use super::classify::is_separator_line;

/// Parse a raw pipe-table block into rows of trimmed cells.
///
/// Separator lines are dropped and one leading and trailing `|` is stripped
/// from each remaining line. Rows are not padded: a row keeps exactly as many
/// cells as its own line had, so callers must handle jagged grids.
pub fn parse_table(raw: &str) -> Vec<Vec<String>> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !is_separator_line(line))
        .map(parse_table_row)
        .filter(|row| !(row.len() == 1 && row[0].is_empty()))
        .collect()
}

fn parse_table_row(line: &str) -> Vec<String> {
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);

    line.split('|').map(|s| s.trim().to_string()).collect()
}
