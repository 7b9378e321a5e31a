//! Grid and simple tables
//!
//! Both rules first split the block into a [`RawTable`] of cell lines, then
//! parse every cell as nested body content. A block whose delimiters do not
//! line up is reported and left to the paragraph rule.

pub mod grid;
pub mod separator;
pub mod simple;

use rstdok_ast::{Node, TableCell, TableKind, TableNode, TableRow};

use super::{Grammar, Rule};
use crate::diagnostics::codes;
use crate::error::ParseError;
use crate::parser::context::BlockContext;

/// Table cells before their content is parsed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub header_rows: Vec<RawRow>,
    pub rows: Vec<RawRow>,
    pub column_widths: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Index of the row's first line within the table block
    pub line: usize,
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    /// Dedented cell text
    pub lines: Vec<String>,
    pub colspan: usize,
}

fn build_table(
    context: &mut BlockContext<'_>,
    grammar: &Grammar,
    raw: RawTable,
    kind: TableKind,
    block_len: usize,
) -> Result<Option<Node>, ParseError> {
    let base = context.lines.source_line();
    context.lines.skip(block_len);

    let header_rows = parse_rows(context, grammar, raw.header_rows, base)?;
    let rows = parse_rows(context, grammar, raw.rows, base)?;

    Ok(Some(Node::Table(TableNode {
        table_kind: kind,
        header_rows,
        rows,
        column_widths: raw.column_widths,
    })))
}

fn parse_rows(
    context: &mut BlockContext<'_>,
    grammar: &Grammar,
    rows: Vec<RawRow>,
    base: usize,
) -> Result<Vec<TableRow>, ParseError> {
    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in row.cells {
            cells.push(TableCell {
                children: grammar.parse_nested(context, cell.lines, base + row.line)?,
                colspan: cell.colspan,
            });
        }
        parsed.push(TableRow { cells });
    }
    Ok(parsed)
}

/// `+---+` bordered tables
pub struct GridTableRule;

impl GridTableRule {
    fn block(context: &BlockContext<'_>) -> Vec<String> {
        grid::grid_block(context.lines.remaining()).to_vec()
    }
}

impl Rule for GridTableRule {
    fn name(&self) -> &'static str {
        "grid_table"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        let Some(line) = context.current() else {
            return false;
        };
        if !(line.starts_with("+-") || line.starts_with("+=")) {
            return false;
        }
        match grid::parse_grid_table(&Self::block(context)) {
            Ok(_) => true,
            Err(reason) => {
                context.warning(codes::MALFORMED_TABLE, format!("Malformed grid table: {}", reason));
                false
            }
        }
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let block = Self::block(context);
        match grid::parse_grid_table(&block) {
            Ok(raw) => build_table(context, grammar, raw, TableKind::Grid, block.len()),
            Err(_) => Ok(None),
        }
    }
}

/// `=====  =====` delimited tables
pub struct SimpleTableRule;

impl SimpleTableRule {
    fn block(context: &BlockContext<'_>) -> Option<Vec<String>> {
        let remaining = context.lines.remaining();
        simple::simple_block(remaining).map(|len| remaining[..len].to_vec())
    }
}

impl Rule for SimpleTableRule {
    fn name(&self) -> &'static str {
        "simple_table"
    }

    fn applies(&self, context: &BlockContext<'_>) -> bool {
        let Some(block) = Self::block(context) else {
            return false;
        };
        match simple::parse_simple_table(&block) {
            Ok(_) => true,
            Err(reason) => {
                context.warning(codes::MALFORMED_TABLE, format!("Malformed simple table: {}", reason));
                false
            }
        }
    }

    fn apply(
        &self,
        context: &mut BlockContext<'_>,
        grammar: &Grammar,
    ) -> Result<Option<Node>, ParseError> {
        let Some(block) = Self::block(context) else {
            return Ok(None);
        };
        match simple::parse_simple_table(&block) {
            Ok(raw) => build_table(context, grammar, raw, TableKind::Simple, block.len()),
            Err(_) => Ok(None),
        }
    }
}
