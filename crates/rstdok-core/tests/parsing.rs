//! Integration tests for the reStructuredText parser
//!
//! Exercises the block rules, the inline lexer and the raw directive
//! handling through the public API.

use std::collections::BTreeMap;
use std::sync::Arc;

use rstdok_ast::{InlineNode, ListKind, Node, ProjectNode, TableKind};
use rstdok_core::compiler::{Compiler, UrlGenerator};
use rstdok_core::diagnostics::codes;
use rstdok_core::directives::DirectiveRegistry;
use rstdok_core::parser::inline::TokenStream;
use rstdok_core::parser::rules::table::separator::{parse_grid_separator, parse_simple_separator};
use rstdok_core::{InputFormat, MemoryFilesystem, Parser, Reporter};

fn sections(nodes: &[Node]) -> Vec<(usize, String, usize)> {
    let mut out = Vec::new();
    for node in nodes {
        if let Node::Section(section) = node {
            out.push((section.title.level, section.title.text(), section.children.len()));
            out.extend(sections(&section.children));
        }
    }
    out
}

#[test]
fn test_section_levels_follow_first_appearance() {
    let text = "\
Guide
=====

Intro.

Install
-------

Steps.

Details
~~~~~~~

More.

Usage
-----

Use it.

Appendix
========
";
    let doc = Parser::new().parse(text, InputFormat::Rst).unwrap();
    assert_eq!(doc.children.len(), 2);
    let found: Vec<(usize, String)> = sections(&doc.children)
        .into_iter()
        .map(|(level, title, _)| (level, title))
        .collect();
    assert_eq!(
        found,
        vec![
            (1, "Guide".to_string()),
            (2, "Install".to_string()),
            (3, "Details".to_string()),
            (2, "Usage".to_string()),
            (1, "Appendix".to_string()),
        ]
    );
}

#[test]
fn test_same_text_parses_identically() {
    let text = "Alpha\n=====\n\nBeta\n----\n\nGamma\n=====\n\nDelta\n-----\n\ntext\n";
    let parser = Parser::new();
    let first = parser.parse(text, InputFormat::Rst).unwrap();
    let second = parser.parse(text, InputFormat::Rst).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        sections(&first.children),
        vec![
            (1, "Alpha".to_string(), 1),
            (2, "Beta".to_string(), 0),
            (1, "Gamma".to_string(), 1),
            (2, "Delta".to_string(), 1),
        ]
    );
}

#[test]
fn test_unclosed_markup_stays_plain_text() {
    let doc = Parser::new()
        .parse("An *unclosed marker and ``code``.\n", InputFormat::Rst)
        .unwrap();
    let Node::Paragraph(paragraph) = &doc.children[0] else {
        panic!("expected a paragraph, got {:?}", doc.children[0]);
    };
    assert!(!paragraph
        .content
        .children
        .iter()
        .any(|n| matches!(n, InlineNode::Emphasis(_))));
    assert!(paragraph
        .content
        .children
        .contains(&InlineNode::Literal("code".to_string())));
    assert_eq!(paragraph.content.to_plain_text(), "An *unclosed marker and code.");
}

#[test]
fn test_rollback_restores_the_cursor() {
    let mut stream = TokenStream::from_text("*a b c");
    stream.snapshot();
    stream.next_token();
    stream.next_token();
    stream.rollback();
    assert_eq!(stream.position(), 0);
    assert_eq!(stream.depth(), 0);

    // rolling back with nothing saved is a no-op
    stream.rollback();
    assert_eq!(stream.position(), 0);
}

#[test]
fn test_table_separators() {
    let simple = parse_simple_separator("== ===").unwrap();
    assert_eq!(simple.parts, vec![[0, 2], [3, 6]]);

    let grid = parse_grid_separator("+==+===+").unwrap();
    assert!(grid.header);
    assert_eq!(grid.parts, vec![[1, 3], [4, 7]]);

    assert!(parse_grid_separator("+===/====").is_none());
    assert!(parse_grid_separator("========").is_none());
}

#[test]
fn test_tables_and_lists() {
    let text = "\
=====  =====
Name   Value
=====  =====
alpha  1
beta   2
=====  =====

* first
* second

1. one
2. two
";
    let doc = Parser::new().parse(text, InputFormat::Rst).unwrap();
    let Node::Table(table) = &doc.children[0] else {
        panic!("expected a table, got {:?}", doc.children[0]);
    };
    assert_eq!(table.table_kind, TableKind::Simple);
    assert_eq!(table.header_rows.len(), 1);
    assert_eq!(table.rows.len(), 2);

    let kinds: Vec<bool> = doc.children[1..]
        .iter()
        .map(|n| match n {
            Node::List(list) => matches!(list.list_kind, ListKind::Bullet { .. }),
            other => panic!("expected a list, got {:?}", other),
        })
        .collect();
    assert_eq!(kinds, vec![true, false]);
}

#[test]
fn test_unknown_directive_keeps_its_body() {
    let text = "\
.. frobnicate:: arg
   :level: 3

   Body *text*

     indented more
";
    let reporter = Reporter::new();
    let parser = Parser::new().with_reporter(reporter.clone());
    let doc = parser.parse_document("index", text, InputFormat::Rst).unwrap();
    assert!(matches!(doc.children[0], Node::Directive(_)));

    let mut documents = BTreeMap::new();
    documents.insert("index".to_string(), doc);
    let mut compiler = Compiler::with_default_passes(
        parser,
        DirectiveRegistry::with_defaults(),
        Arc::new(MemoryFilesystem::new()),
        UrlGenerator::default(),
    );
    let mut project = ProjectNode::new(None, None);
    let compiled = compiler.compile(documents, &mut project, &reporter).unwrap();

    let Node::GeneralDirective(general) = &compiled["index"].children[0] else {
        panic!("expected a general directive");
    };
    assert_eq!(general.name, "frobnicate");
    assert_eq!(general.data, "arg");
    assert_eq!(general.options.get("level").map(String::as_str), Some("3"));
    assert!(general.raw_content.starts_with("Body *text*"));
    assert!(general.raw_content.contains("\n  indented more"));
    assert!(!general.children.is_empty());
    assert!(reporter
        .diagnostics()
        .iter()
        .any(|d| d.code.as_deref() == Some(codes::UNKNOWN_DIRECTIVE)));
}

#[cfg(feature = "markdown")]
#[test]
fn test_markdown_uses_the_same_model() {
    let doc = Parser::new()
        .parse("# Title\n\nSee [setup](setup.md).\n\n## Part\n", InputFormat::Markdown)
        .unwrap();
    assert_eq!(doc.title().map(|t| t.text()), Some("Title".to_string()));
    let found = sections(&doc.children);
    assert_eq!(found[1].0, 2);
}
