//! Table delimiter lines

/// A parsed delimiter line. `parts` are the `[start, end)` character
/// columns of each dash run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSeparator {
    /// Drawn with `=`: closes the table header
    pub header: bool,
    pub parts: Vec<[usize; 2]>,
}

/// `+---+----+` or `+===+====+`
pub fn parse_grid_separator(line: &str) -> Option<TableSeparator> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    if chars.len() < 3 || chars[0] != '+' || chars[chars.len() - 1] != '+' {
        return None;
    }

    let fill = chars[1];
    if fill != '-' && fill != '=' {
        return None;
    }

    let mut parts = Vec::new();
    let mut start = 1;
    for (i, c) in chars.iter().enumerate().skip(1) {
        match *c {
            '+' => {
                if i == start {
                    return None;
                }
                parts.push([start, i]);
                start = i + 1;
            }
            c if c == fill => {}
            _ => return None,
        }
    }

    Some(TableSeparator {
        header: fill == '=',
        parts,
    })
}

/// `=====  ======` or `-----  ------`
pub fn parse_simple_separator(line: &str) -> Option<TableSeparator> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    let fill = *chars.first()?;
    if fill != '=' && fill != '-' {
        return None;
    }

    let mut parts = Vec::new();
    let mut start = None;
    for (i, c) in chars.iter().enumerate() {
        match (*c, start) {
            (c, None) if c == fill => start = Some(i),
            (' ', Some(s)) => {
                parts.push([s, i]);
                start = None;
            }
            (c, _) if c == fill || c == ' ' => {}
            _ => return None,
        }
    }
    if let Some(s) = start {
        parts.push([s, chars.len()]);
    }

    Some(TableSeparator {
        header: fill == '=',
        parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_header_separator() {
        let separator = parse_simple_separator("== ===").unwrap();
        assert!(separator.header);
        assert_eq!(separator.parts, vec![[0, 2], [3, 6]]);
    }

    #[test]
    fn test_simple_column_span_line() {
        let separator = parse_simple_separator("-----  ---   ").unwrap();
        assert!(!separator.header);
        assert_eq!(separator.parts, vec![[0, 5], [7, 10]]);
    }

    #[test]
    fn test_simple_rejects_mixed_fill() {
        assert!(parse_simple_separator("==-- ===").is_none());
        assert!(parse_simple_separator("   ===").is_none());
        assert!(parse_simple_separator("").is_none());
    }

    #[test]
    fn test_grid_header_separator() {
        let separator = parse_grid_separator("+==+===+").unwrap();
        assert!(separator.header);
        assert_eq!(separator.parts, vec![[1, 3], [4, 7]]);
    }

    #[test]
    fn test_grid_body_separator() {
        let separator = parse_grid_separator("+----+---+").unwrap();
        assert!(!separator.header);
        assert_eq!(separator.parts, vec![[1, 5], [6, 9]]);
    }

    #[test]
    fn test_grid_rejects_malformed() {
        assert!(parse_grid_separator("+===/====").is_none());
        assert!(parse_grid_separator("========").is_none());
        assert!(parse_grid_separator("+==+--+").is_none());
        assert!(parse_grid_separator("+==++").is_none());
        assert!(parse_grid_separator("| a | b |").is_none());
    }
}
