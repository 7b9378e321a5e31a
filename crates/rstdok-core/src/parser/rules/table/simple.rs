use super::separator::{parse_simple_separator, TableSeparator};
use super::{RawCell, RawRow, RawTable};
use crate::parser::lines::{dedent, is_blank, trim_blank_edges};

fn border(line: &str) -> Option<TableSeparator> {
    parse_simple_separator(line).filter(|s| s.header)
}

/// Number of lines in the simple table starting at `lines[0]`.
///
/// The table closes at the second or third `=` border that is followed by
/// a blank line or the end of input. `None` when no such border exists.
pub fn simple_block(lines: &[String]) -> Option<usize> {
    border(lines.first()?)?;
    let mut borders = 1;

    for (i, line) in lines.iter().enumerate().skip(1) {
        if border(line).is_none() {
            continue;
        }
        borders += 1;
        let closes = lines.get(i + 1).map_or(true, |l| is_blank(l));
        if borders >= 2 && closes {
            return Some(i + 1);
        }
        if borders == 3 {
            return None;
        }
    }
    None
}

struct PendingRow {
    line: usize,
    lines: Vec<Vec<char>>,
    /// Column index ranges `[first, last)` from a `-` span line
    spans: Option<Vec<[usize; 2]>>,
}

/// Split a simple table block (as measured by [`simple_block`]) into rows
pub fn parse_simple_table(lines: &[String]) -> Result<RawTable, String> {
    let borders: Vec<(usize, TableSeparator)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| border(l).map(|s| (i, s)))
        .collect();
    let Some((_, top)) = borders.first() else {
        return Err("missing top border".to_string());
    };
    let columns = top.parts.clone();
    if borders.iter().any(|(_, b)| b.parts != columns) {
        return Err("borders disagree on column boundaries".to_string());
    }

    let last = lines.len() - 1;
    let (header, body) = match borders.as_slice() {
        [_, (end, _)] if *end == last => (None, 1..last),
        [_, (middle, _), (end, _)] if *end == last => (Some(1..*middle), middle + 1..last),
        _ => return Err("expected two or three borders".to_string()),
    };

    let mut table = RawTable {
        column_widths: columns.iter().map(|[s, e]| e - s).collect(),
        ..RawTable::default()
    };
    if let Some(range) = header {
        table.header_rows = parse_rows(lines, range, &columns)?;
    }
    table.rows = parse_rows(lines, body, &columns)?;
    Ok(table)
}

fn parse_rows(
    lines: &[String],
    range: std::ops::Range<usize>,
    columns: &[[usize; 2]],
) -> Result<Vec<RawRow>, String> {
    let mut rows: Vec<PendingRow> = Vec::new();
    let mut open = false;

    for index in range {
        let line = &lines[index];
        if is_blank(line) {
            open = false;
            continue;
        }

        if let Some(separator) = parse_simple_separator(line).filter(|s| !s.header) {
            let spans = column_spans(&separator, columns)
                .ok_or_else(|| format!("column span line {} does not match the columns", index + 1))?;
            let row = rows
                .last_mut()
                .ok_or_else(|| format!("column span line {} has no row above it", index + 1))?;
            row.spans = Some(spans);
            open = false;
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let first_column_blank = chars
            .iter()
            .take(columns[0][1])
            .all(|c| c.is_whitespace());
        match rows.last_mut() {
            Some(row) if open && first_column_blank => row.lines.push(chars),
            _ => {
                rows.push(PendingRow {
                    line: index,
                    lines: vec![chars],
                    spans: None,
                });
                open = true;
            }
        }
    }

    rows.into_iter().map(|row| finish_row(row, columns)).collect()
}

/// Map the dash runs of a span line onto column index ranges
fn column_spans(separator: &TableSeparator, columns: &[[usize; 2]]) -> Option<Vec<[usize; 2]>> {
    let mut spans = Vec::new();
    for [start, end] in &separator.parts {
        let first = columns.iter().position(|c| c[0] == *start)?;
        let last = if first == columns.len() - 1 {
            first
        } else {
            columns.iter().position(|c| c[1] == *end)?
        };
        if last < first {
            return None;
        }
        spans.push([first, last + 1]);
    }
    Some(spans)
}

fn finish_row(row: PendingRow, columns: &[[usize; 2]]) -> Result<RawRow, String> {
    let spans = row
        .spans
        .unwrap_or_else(|| (0..columns.len()).map(|c| [c, c + 1]).collect());

    for pair in spans.windows(2) {
        let (from, to) = (columns[pair[0][1] - 1][1], columns[pair[1][0]][0]);
        for (i, chars) in row.lines.iter().enumerate() {
            if chars.iter().take(to).skip(from).any(|c| !c.is_whitespace()) {
                return Err(format!("text in a column margin at line {}", row.line + i + 1));
            }
        }
    }

    let cells = spans
        .iter()
        .map(|[first, last]| {
            let start = columns[*first][0];
            // the last column runs to the end of the line
            let end = if *last == columns.len() {
                usize::MAX
            } else {
                columns[last - 1][1]
            };
            let text: Vec<String> = row
                .lines
                .iter()
                .map(|chars| {
                    chars
                        .iter()
                        .skip(start)
                        .take(end.saturating_sub(start))
                        .collect::<String>()
                        .trim_end()
                        .to_string()
                })
                .collect();
            RawCell {
                lines: trim_blank_edges(dedent(&text)),
                colspan: last - first,
            }
        })
        .collect();

    Ok(RawRow {
        line: row.line,
        cells,
    })
}
