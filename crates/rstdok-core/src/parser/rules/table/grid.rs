use std::collections::BTreeSet;

use super::separator::{parse_grid_separator, TableSeparator};
use super::{RawCell, RawRow, RawTable};
use crate::parser::lines::{dedent, trim_blank_edges};

/// Lines of a grid table starting at the top border
pub fn grid_block(lines: &[String]) -> &[String] {
    let len = lines
        .iter()
        .take_while(|l| l.starts_with('+') || l.starts_with('|'))
        .count();
    &lines[..len]
}

/// Split a grid table into rows and cells.
///
/// Column boundaries are the union of every `+` drawn in a separator line.
/// A row whose content lines omit the `|` at a boundary spans that column.
pub fn parse_grid_table(lines: &[String]) -> Result<RawTable, String> {
    let rows: Vec<Vec<char>> = lines.iter().map(|l| l.trim_end().chars().collect()).collect();
    let width = rows.first().map(Vec::len).unwrap_or_default();
    if width < 3 {
        return Err("table is too narrow".to_string());
    }
    if rows.iter().any(|r| r.len() != width) {
        return Err("table lines have different widths".to_string());
    }

    let separators: Vec<(usize, TableSeparator)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| parse_grid_separator(l).map(|s| (i, s)))
        .collect();
    match (separators.first(), separators.last()) {
        (Some((0, _)), Some((last, _))) if *last == lines.len() - 1 && *last > 0 => {}
        _ => return Err("table must start and end with a border".to_string()),
    }

    let mut boundaries = BTreeSet::from([0, width - 1]);
    for (_, separator) in &separators {
        for [start, end] in &separator.parts {
            boundaries.insert(start - 1);
            boundaries.insert(*end);
        }
    }
    let boundaries: Vec<usize> = boundaries.into_iter().collect();

    let headers: Vec<usize> = separators
        .iter()
        .enumerate()
        .filter(|(_, (_, s))| s.header)
        .map(|(n, _)| n)
        .collect();
    let header_at = match headers.as_slice() {
        [] => None,
        [n] if *n > 0 && *n < separators.len() - 1 => Some(*n),
        [_] => return Err("header separator cannot open or close the table".to_string()),
        _ => return Err("more than one header separator".to_string()),
    };

    let mut table = RawTable {
        column_widths: boundaries.windows(2).map(|w| w[1] - w[0] - 1).collect(),
        ..RawTable::default()
    };

    for (n, pair) in separators.windows(2).enumerate() {
        let (top, bottom) = (pair[0].0, pair[1].0);
        if bottom == top + 1 {
            return Err(format!("empty row at line {}", bottom + 1));
        }
        let row = parse_row(&rows[top + 1..bottom], &boundaries, top + 1)?;
        if header_at.is_some_and(|h| n < h) {
            table.header_rows.push(row);
        } else {
            table.rows.push(row);
        }
    }

    Ok(table)
}

fn parse_row(lines: &[Vec<char>], boundaries: &[usize], line: usize) -> Result<RawRow, String> {
    let mut pipes: Option<Vec<usize>> = None;

    for (i, chars) in lines.iter().enumerate() {
        if chars.first() != Some(&'|') || chars.last() != Some(&'|') {
            return Err(format!("row line {} is not enclosed in `|`", line + i + 1));
        }
        if boundaries.iter().any(|b| chars[*b] == '+') {
            return Err(format!("row spans are not supported (line {})", line + i + 1));
        }
        let found: Vec<usize> = boundaries.iter().copied().filter(|b| chars[*b] == '|').collect();
        match &pipes {
            Some(expected) if *expected != found => {
                return Err(format!("inconsistent column boundaries at line {}", line + i + 1));
            }
            Some(_) => {}
            None => pipes = Some(found),
        }
    }

    let pipes = pipes.unwrap_or_default();
    let cells = pipes
        .windows(2)
        .map(|w| {
            let (start, end) = (w[0], w[1]);
            let text: Vec<String> = lines
                .iter()
                .map(|chars| chars[start + 1..end].iter().collect::<String>().trim_end().to_string())
                .collect();
            RawCell {
                lines: trim_blank_edges(dedent(&text)),
                colspan: boundaries.iter().filter(|b| **b > start && **b <= end).count(),
            }
        })
        .collect();

    Ok(RawRow { line, cells })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    fn cell_text(cell: &RawCell) -> String {
        cell.lines.join("\n")
    }

    #[test]
    fn test_header_and_body() {
        let table = parse_grid_table(&lines(
            "+-----+-------+\n\
             | A   | B     |\n\
             +=====+=======+\n\
             | 1   | two   |\n\
             |     | lines |\n\
             +-----+-------+",
        ))
        .unwrap();

        assert_eq!(table.header_rows.len(), 1);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.column_widths, vec![5, 7]);
        assert_eq!(cell_text(&table.header_rows[0].cells[1]), "B");
        assert_eq!(cell_text(&table.rows[0].cells[1]), "two\nlines");
        assert_eq!(table.rows[0].line, 3);
    }

    #[test]
    fn test_column_span() {
        let table = parse_grid_table(&lines(
            "+---+---+---+\n\
             | wide  | x |\n\
             +---+---+---+\n\
             | a | b | c |\n\
             +---+---+---+",
        ))
        .unwrap();

        assert!(table.header_rows.is_empty());
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[0].colspan, 2);
        assert_eq!(cell_text(&table.rows[0].cells[0]), "wide");
        assert_eq!(table.rows[1].cells.len(), 3);
    }

    #[test]
    fn test_row_span_is_rejected() {
        let result = parse_grid_table(&lines(
            "+---+---+\n\
             | a | b |\n\
             +---+   +\n\
             | c |   |\n\
             +---+---+",
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_ragged_lines_are_rejected() {
        let result = parse_grid_table(&lines("+---+---+\n| a | b  |\n+---+---+"));
        assert!(result.is_err());
    }

    #[test]
    fn test_block_stops_at_blank_line() {
        let input = lines("+---+\n| a |\n+---+\n\nafter");
        assert_eq!(grid_block(&input).len(), 3);
    }
}
