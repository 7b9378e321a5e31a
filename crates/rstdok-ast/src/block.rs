//! Block-level elements for document structure
//!
//! This module defines the `Node` sum type: sections, paragraphs, lists,
//! tables, directives and the typed nodes directives resolve into.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inline::InlineCompoundNode;

/// Block-level content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// A section with its title and content
    Section(SectionNode),
    /// A paragraph of text
    Paragraph(ParagraphNode),
    /// A bullet or enumerated list
    List(ListNode),
    /// A single list item
    ListItem(ListItemNode),
    /// A definition list
    DefinitionList(DefinitionListNode),
    /// A field list (`:name: value`)
    FieldList(FieldListNode),
    /// A grid or simple table
    Table(TableNode),
    /// A literal or code block
    Code(CodeNode),
    /// A block quote
    Quote(QuoteNode),
    /// A comment
    Comment(CommentNode),
    /// A transition
    Separator,
    /// An internal link target (`.. _name:`)
    Anchor(AnchorNode),
    /// A directive not yet dispatched to its handler
    Directive(DirectiveNode),
    /// A directive with no registered handler
    GeneralDirective(GeneralDirectiveNode),
    /// An admonition (note, warning, ...)
    Admonition(AdmonitionNode),
    /// An image
    Image(ImageNode),
    /// A figure: image plus caption
    Figure(FigureNode),
    /// A table-of-contents tree
    Toctree(TocNode),
    /// A local table of contents
    Contents(ContentsNode),
    /// A UML diagram source
    Uml(UmlNode),
    /// Raw output-format content
    Raw(RawNode),
    /// A generic container (container, topic, sidebar, rubric, class)
    Container(ContainerNode),
    /// Nodes spliced in from another source, rendered transparently
    Collection(CollectionNode),
}

/// Discriminant of a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Section,
    Paragraph,
    List,
    ListItem,
    DefinitionList,
    FieldList,
    Table,
    Code,
    Quote,
    Comment,
    Separator,
    Anchor,
    Directive,
    GeneralDirective,
    Admonition,
    Image,
    Figure,
    Toctree,
    Contents,
    Uml,
    Raw,
    Container,
    Collection,
}

impl NodeKind {
    /// Stable snake_case name, used for template lookup and diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Section => "section",
            NodeKind::Paragraph => "paragraph",
            NodeKind::List => "list",
            NodeKind::ListItem => "list_item",
            NodeKind::DefinitionList => "definition_list",
            NodeKind::FieldList => "field_list",
            NodeKind::Table => "table",
            NodeKind::Code => "code",
            NodeKind::Quote => "quote",
            NodeKind::Comment => "comment",
            NodeKind::Separator => "separator",
            NodeKind::Anchor => "anchor",
            NodeKind::Directive => "directive",
            NodeKind::GeneralDirective => "general_directive",
            NodeKind::Admonition => "admonition",
            NodeKind::Image => "image",
            NodeKind::Figure => "figure",
            NodeKind::Toctree => "toctree",
            NodeKind::Contents => "contents",
            NodeKind::Uml => "uml",
            NodeKind::Raw => "raw",
            NodeKind::Container => "container",
            NodeKind::Collection => "collection",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    /// The discriminant of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Section(_) => NodeKind::Section,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::List(_) => NodeKind::List,
            Node::ListItem(_) => NodeKind::ListItem,
            Node::DefinitionList(_) => NodeKind::DefinitionList,
            Node::FieldList(_) => NodeKind::FieldList,
            Node::Table(_) => NodeKind::Table,
            Node::Code(_) => NodeKind::Code,
            Node::Quote(_) => NodeKind::Quote,
            Node::Comment(_) => NodeKind::Comment,
            Node::Separator => NodeKind::Separator,
            Node::Anchor(_) => NodeKind::Anchor,
            Node::Directive(_) => NodeKind::Directive,
            Node::GeneralDirective(_) => NodeKind::GeneralDirective,
            Node::Admonition(_) => NodeKind::Admonition,
            Node::Image(_) => NodeKind::Image,
            Node::Figure(_) => NodeKind::Figure,
            Node::Toctree(_) => NodeKind::Toctree,
            Node::Contents(_) => NodeKind::Contents,
            Node::Uml(_) => NodeKind::Uml,
            Node::Raw(_) => NodeKind::Raw,
            Node::Container(_) => NodeKind::Container,
            Node::Collection(_) => NodeKind::Collection,
        }
    }

    /// Every child vector owned by this node, in document order.
    ///
    /// Leaf nodes return an empty list. Tables return one vector per cell,
    /// definition and field lists one per definition/value.
    pub fn child_lists(&self) -> Vec<&Vec<Node>> {
        match self {
            Node::Section(section) => vec![&section.children],
            Node::List(list) => vec![&list.items],
            Node::ListItem(item) => vec![&item.children],
            Node::DefinitionList(list) => list.items.iter().map(|i| &i.definitions).collect(),
            Node::FieldList(list) => list.fields.iter().map(|f| &f.value).collect(),
            Node::Table(table) => table
                .header_rows
                .iter()
                .chain(table.rows.iter())
                .flat_map(|row| row.cells.iter().map(|cell| &cell.children))
                .collect(),
            Node::Quote(quote) => vec![&quote.children],
            Node::GeneralDirective(directive) => vec![&directive.children],
            Node::Admonition(admonition) => vec![&admonition.children],
            Node::Figure(figure) => vec![&figure.caption],
            Node::Container(container) => vec![&container.children],
            Node::Collection(collection) => vec![&collection.children],
            _ => Vec::new(),
        }
    }

    /// Mutable counterpart of [`Node::child_lists`]
    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<Node>> {
        match self {
            Node::Section(section) => vec![&mut section.children],
            Node::List(list) => vec![&mut list.items],
            Node::ListItem(item) => vec![&mut item.children],
            Node::DefinitionList(list) => list
                .items
                .iter_mut()
                .map(|i| &mut i.definitions)
                .collect(),
            Node::FieldList(list) => list.fields.iter_mut().map(|f| &mut f.value).collect(),
            Node::Table(table) => table
                .header_rows
                .iter_mut()
                .chain(table.rows.iter_mut())
                .flat_map(|row| row.cells.iter_mut().map(|cell| &mut cell.children))
                .collect(),
            Node::Quote(quote) => vec![&mut quote.children],
            Node::GeneralDirective(directive) => vec![&mut directive.children],
            Node::Admonition(admonition) => vec![&mut admonition.children],
            Node::Figure(figure) => vec![&mut figure.caption],
            Node::Container(container) => vec![&mut container.children],
            Node::Collection(collection) => vec![&mut collection.children],
            _ => Vec::new(),
        }
    }

    /// Inline compounds held directly by this node (titles, paragraphs, terms)
    pub fn inline_compounds_mut(&mut self) -> Vec<&mut InlineCompoundNode> {
        match self {
            Node::Section(section) => vec![&mut section.title.content],
            Node::Paragraph(paragraph) => vec![&mut paragraph.content],
            Node::DefinitionList(list) => list
                .items
                .iter_mut()
                .flat_map(|item| {
                    std::iter::once(&mut item.term).chain(item.classifiers.iter_mut())
                })
                .collect(),
            Node::Admonition(admonition) => admonition.title.iter_mut().collect(),
            Node::Container(container) => container.title.iter_mut().collect(),
            _ => Vec::new(),
        }
    }
}

/// A section heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleNode {
    /// Section level (1 is the highest)
    pub level: usize,
    /// Anchor id derived from the title text
    pub id: String,
    /// Title content
    pub content: InlineCompoundNode,
}

impl TitleNode {
    /// Plain-text title
    pub fn text(&self) -> String {
        self.content.to_plain_text()
    }
}

/// A section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    /// Section title
    pub title: TitleNode,
    /// Section content, including nested sections
    pub children: Vec<Node>,
}

/// A paragraph block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphNode {
    /// Inline content
    pub content: InlineCompoundNode,
}

/// Enumeration style of an ordered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumeratorStyle {
    Arabic,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
    Auto,
}

/// List type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListKind {
    /// Bullet list with its marker character
    Bullet { marker: char },
    /// Enumerated list
    Enumerated {
        style: EnumeratorStyle,
        /// First ordinal value
        start: u32,
    },
}

/// A bullet or enumerated list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    /// List type
    pub list_kind: ListKind,
    /// Items, each a [`Node::ListItem`]
    pub items: Vec<Node>,
}

impl ListNode {
    /// Whether this is an enumerated list
    pub fn is_ordered(&self) -> bool {
        matches!(self.list_kind, ListKind::Enumerated { .. })
    }
}

/// A list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItemNode {
    /// The marker as written (`*`, `3.`, `(b)`)
    pub prefix: String,
    /// Item body
    pub children: Vec<Node>,
}

/// A definition list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionListNode {
    /// Terms with their definitions
    pub items: Vec<DefinitionListItem>,
}

/// A term and its definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionListItem {
    /// The term
    pub term: InlineCompoundNode,
    /// Classifiers following ` : `
    pub classifiers: Vec<InlineCompoundNode>,
    /// Definition body
    pub definitions: Vec<Node>,
}

/// A field list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldListNode {
    /// Fields in source order
    pub fields: Vec<FieldListItem>,
}

/// A single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldListItem {
    /// Field name
    pub name: String,
    /// Field body
    pub value: Vec<Node>,
}

/// Table syntax the node was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Grid,
    Simple,
    Markdown,
}

/// A table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    /// Source syntax
    pub table_kind: TableKind,
    /// Rows above the header separator
    pub header_rows: Vec<TableRow>,
    /// Body rows
    pub rows: Vec<TableRow>,
    /// Column widths in characters, taken from the delimiter lines
    pub column_widths: Vec<usize>,
}

/// A table row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in this row
    pub cells: Vec<TableCell>,
}

/// A table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content
    pub children: Vec<Node>,
    /// Number of columns spanned
    pub colspan: usize,
}

/// A literal or code block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeNode {
    /// The literal content
    pub value: String,
    /// Language for syntax highlighting
    pub language: Option<String>,
    /// Line number of the first line, when line numbering is enabled
    pub starting_line_number: Option<u32>,
    /// Whether to show line numbers
    pub line_numbers: bool,
    /// Optional caption
    pub caption: Option<String>,
    /// Lines to emphasise (1-based)
    pub emphasize_lines: Vec<u32>,
    /// Extra CSS classes
    pub classes: Vec<String>,
}

/// A block quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteNode {
    /// Quoted content
    pub children: Vec<Node>,
}

/// A comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    /// Comment text
    pub value: String,
}

/// An internal link target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorNode {
    /// Normalised anchor name
    pub name: String,
}

/// A directive as recognised by the parser, before dispatch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectiveNode {
    /// Directive name as written
    pub name: String,
    /// Argument on the directive line
    pub data: String,
    /// Substitution name for `.. |name| directive::`
    pub variable: Option<String>,
    /// Option fields
    pub options: BTreeMap<String, String>,
    /// Directive body, dedented, verbatim otherwise
    pub content: String,
    /// 1-based source line of the directive marker
    pub line: usize,
}

impl DirectiveNode {
    /// Option value by name
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(|s| s.as_str())
    }

    /// Whether a flag option is present
    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}

/// A directive without a registered handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralDirectiveNode {
    /// Directive name
    pub name: String,
    /// Argument on the directive line
    pub data: String,
    /// Option fields
    pub options: BTreeMap<String, String>,
    /// The directive body exactly as it appeared (dedented)
    pub raw_content: String,
    /// The body parsed as nested content
    pub children: Vec<Node>,
}

/// Admonition kind name plus content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmonitionNode {
    /// Admonition name (`note`, `warning`, ... or `admonition`)
    pub name: String,
    /// Optional title
    pub title: Option<InlineCompoundNode>,
    /// Extra CSS classes
    pub classes: Vec<String>,
    /// Admonition content
    pub children: Vec<Node>,
}

/// An image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageNode {
    /// Image source path or URL
    pub src: String,
    /// Alternative text
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub align: Option<String>,
    /// Link target when the image is clickable
    pub target: Option<String>,
    /// Extra CSS classes
    pub classes: Vec<String>,
}

/// An image with a caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureNode {
    /// The image
    pub image: ImageNode,
    /// Caption and legend
    pub caption: Vec<Node>,
}

/// A resolved table-of-contents entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    /// Document path
    pub file: String,
    /// Section anchor, `None` for the document itself
    pub anchor: Option<String>,
    /// Document or section title
    pub title: String,
    /// Nested entries (sections or child documents), limited by depth
    pub children: Vec<MenuEntry>,
}

/// A toctree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TocNode {
    /// Entries exactly as written in the directive body
    pub entries: Vec<String>,
    /// Resolved document paths in toctree order
    pub files: Vec<String>,
    /// Explicit titles given as `Title <path>`
    pub titles: BTreeMap<String, String>,
    pub caption: Option<String>,
    /// Maximum depth of the rendered menu, 0 for unlimited
    pub max_depth: usize,
    /// Hidden toctrees only contribute to navigation
    pub hidden: bool,
    pub glob: bool,
    pub titles_only: bool,
    /// Menu resolved by the compiler
    pub menu: Vec<MenuEntry>,
}

/// A section entry in a local table of contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentsEntry {
    /// Section title
    pub title: String,
    /// Section anchor
    pub anchor: String,
    /// Nested sections
    pub children: Vec<ContentsEntry>,
}

/// A local table of contents (`.. contents::`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentsNode {
    pub title: Option<String>,
    /// Maximum depth, unlimited when `None`
    pub depth: Option<usize>,
    /// Only list sections below the directive's own section
    pub local: bool,
    /// Entries filled in by the compiler
    pub entries: Vec<ContentsEntry>,
}

/// A UML diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UmlNode {
    /// Diagram source
    pub source: String,
    pub caption: Option<String>,
    pub classes: Vec<String>,
}

/// Raw content for a given output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Output format (`html`, `latex`, ...)
    pub format: String,
    /// Raw content
    pub content: String,
}

/// A generic container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    /// Directive the container came from (`container`, `topic`, ...)
    pub name: String,
    pub title: Option<InlineCompoundNode>,
    pub classes: Vec<String>,
    pub children: Vec<Node>,
}

/// Spliced nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionNode {
    pub children: Vec<Node>,
}
