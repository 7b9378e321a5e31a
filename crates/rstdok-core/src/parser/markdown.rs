//! Markdown input
//!
//! Builds the same node tree as the reStructuredText parser from
//! pulldown-cmark events. Headings open sections, nested by level.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use rstdok_ast::{
    CodeNode, DocumentNode, HyperlinkNode, InlineCompoundNode, InlineImageNode, InlineNode,
    ListItemNode, ListKind, ListNode, EnumeratorStyle, Node, ParagraphNode, QuoteNode, RawNode,
    ReferenceKind, ReferenceNode, SectionNode, TableCell, TableKind, TableNode, TableRow,
    TitleNode,
};

use super::document::compute_source_hash;
use super::slugify;

enum FrameKind {
    Root,
    Paragraph,
    Heading(usize),
    Quote,
    List(Option<u64>),
    Item,
    Code(Option<String>),
    Html,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Link(String),
    Image(String),
    Other,
}

struct Frame {
    kind: FrameKind,
    blocks: Vec<Node>,
    inlines: Vec<InlineNode>,
    text: String,
    rows: Vec<TableRow>,
    header_rows: Vec<TableRow>,
    cells: Vec<TableCell>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            blocks: Vec::new(),
            inlines: Vec::new(),
            text: String::new(),
            rows: Vec::new(),
            header_rows: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Loose inline content becomes a paragraph (tight list items)
    fn flush_inlines(&mut self) {
        if !self.inlines.is_empty() {
            let children = std::mem::take(&mut self.inlines);
            self.blocks.push(Node::Paragraph(ParagraphNode {
                content: InlineCompoundNode::new(children),
            }));
        }
    }

    fn into_blocks(mut self) -> Vec<Node> {
        self.flush_inlines();
        self.blocks
    }
}

fn plain_text(nodes: &[InlineNode]) -> String {
    InlineCompoundNode::new(nodes.to_vec()).to_plain_text()
}

fn link_node(url: String, inlines: Vec<InlineNode>) -> InlineNode {
    let text = plain_text(&inlines);
    let text = (!text.is_empty()).then_some(text);

    if let Some(anchor) = url.strip_prefix('#') {
        return InlineNode::Reference(ReferenceNode::new(ReferenceKind::Ref, anchor, text));
    }
    let is_external = url.contains("://") || url.starts_with("mailto:");
    let path = url.split('#').next().unwrap_or_default();
    if !is_external {
        if let Some(document) = path.strip_suffix(".md") {
            return InlineNode::Reference(ReferenceNode::new(ReferenceKind::Doc, document, text));
        }
    }
    InlineNode::Hyperlink(HyperlinkNode {
        text: text.unwrap_or_else(|| url.clone()),
        url,
    })
}

fn push_text(frame: &mut Frame, text: &str) {
    match frame.kind {
        FrameKind::Code(_) | FrameKind::Html => frame.text.push_str(text),
        _ => match frame.inlines.last_mut() {
            Some(InlineNode::Plain(existing)) => existing.push_str(text),
            _ => frame.inlines.push(InlineNode::Plain(text.to_string())),
        },
    }
}

/// Fold a finished frame into its parent
fn close(frame: Frame, parent: &mut Frame) {
    if matches!(
        frame.kind,
        FrameKind::Paragraph
            | FrameKind::Heading(_)
            | FrameKind::Quote
            | FrameKind::List(_)
            | FrameKind::Code(_)
            | FrameKind::Html
            | FrameKind::Table
    ) {
        parent.flush_inlines();
    }

    match frame.kind {
        FrameKind::Paragraph => {
            parent.blocks.push(Node::Paragraph(ParagraphNode {
                content: InlineCompoundNode::new(frame.inlines),
            }));
        }
        FrameKind::Heading(level) => {
            let content = InlineCompoundNode::new(frame.inlines);
            parent.blocks.push(Node::Section(SectionNode {
                title: TitleNode {
                    level,
                    id: slugify(&content.to_plain_text()),
                    content,
                },
                children: Vec::new(),
            }));
        }
        FrameKind::Quote => {
            let children = frame.into_blocks();
            parent.blocks.push(Node::Quote(QuoteNode { children }));
        }
        FrameKind::List(start) => {
            let list_kind = match start {
                Some(start) => ListKind::Enumerated {
                    style: EnumeratorStyle::Arabic,
                    start: u32::try_from(start).unwrap_or(1),
                },
                None => ListKind::Bullet { marker: '-' },
            };
            parent.blocks.push(Node::List(ListNode {
                list_kind,
                items: frame.blocks,
            }));
        }
        FrameKind::Item => {
            let children = frame.into_blocks();
            parent.blocks.push(Node::ListItem(ListItemNode {
                prefix: String::new(),
                children,
            }));
        }
        FrameKind::Code(language) => {
            let value = frame.text.strip_suffix('\n').unwrap_or(&frame.text).to_string();
            parent.blocks.push(Node::Code(CodeNode {
                value,
                language,
                ..Default::default()
            }));
        }
        FrameKind::Html => {
            parent.blocks.push(Node::Raw(RawNode {
                format: "html".to_string(),
                content: frame.text.trim_end().to_string(),
            }));
        }
        FrameKind::Table => {
            let column_count = frame
                .header_rows
                .iter()
                .chain(&frame.rows)
                .map(|r| r.cells.len())
                .max()
                .unwrap_or_default();
            parent.blocks.push(Node::Table(TableNode {
                table_kind: TableKind::Markdown,
                header_rows: frame.header_rows,
                rows: frame.rows,
                column_widths: vec![0; column_count],
            }));
        }
        // pulldown-cmark puts header cells directly below the head
        FrameKind::TableHead => {
            parent.header_rows.push(TableRow { cells: frame.cells });
        }
        FrameKind::TableRow => {
            parent.rows.push(TableRow { cells: frame.cells });
        }
        FrameKind::TableCell => {
            let children = frame.into_blocks();
            parent.cells.push(TableCell {
                children,
                colspan: 1,
            });
        }
        FrameKind::Emphasis => parent.inlines.push(InlineNode::Emphasis(plain_text(&frame.inlines))),
        FrameKind::Strong => parent.inlines.push(InlineNode::Strong(plain_text(&frame.inlines))),
        FrameKind::Link(url) => parent.inlines.push(link_node(url, frame.inlines)),
        FrameKind::Image(src) => parent.inlines.push(InlineNode::Image(InlineImageNode {
            src,
            alt: plain_text(&frame.inlines),
        })),
        FrameKind::Root | FrameKind::Other => {
            parent.blocks.extend(frame.blocks);
            parent.inlines.extend(frame.inlines);
        }
    }
}

/// Turn the flat heading sequence into nested sections
fn nest_sections(nodes: Vec<Node>) -> Vec<Node> {
    let mut root = Vec::new();
    let mut open: Vec<SectionNode> = Vec::new();

    fn attach(root: &mut Vec<Node>, open: &mut [SectionNode], node: Node) {
        match open.last_mut() {
            Some(section) => section.children.push(node),
            None => root.push(node),
        }
    }

    for node in nodes {
        match node {
            Node::Section(section) => {
                while open.last().is_some_and(|s| s.title.level >= section.title.level) {
                    if let Some(done) = open.pop() {
                        attach(&mut root, &mut open, Node::Section(done));
                    }
                }
                open.push(section);
            }
            other => attach(&mut root, &mut open, other),
        }
    }
    while let Some(done) = open.pop() {
        attach(&mut root, &mut open, Node::Section(done));
    }
    root
}

/// Parse a Markdown document
pub fn parse(file_path: &str, text: &str) -> DocumentNode {
    let mut stack = vec![Frame::new(FrameKind::Root)];

    for event in Parser::new_ext(text, Options::ENABLE_TABLES) {
        match event {
            Event::Start(tag) => {
                let kind = match tag {
                    Tag::Paragraph => FrameKind::Paragraph,
                    Tag::Heading { level, .. } => FrameKind::Heading(level as usize),
                    Tag::BlockQuote(_) => FrameKind::Quote,
                    Tag::List(start) => FrameKind::List(start),
                    Tag::Item => FrameKind::Item,
                    Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                        let language = info.split_whitespace().next().map(str::to_string);
                        FrameKind::Code(language)
                    }
                    Tag::CodeBlock(CodeBlockKind::Indented) => FrameKind::Code(None),
                    Tag::HtmlBlock => FrameKind::Html,
                    Tag::Table(_) => FrameKind::Table,
                    Tag::TableHead => FrameKind::TableHead,
                    Tag::TableRow => FrameKind::TableRow,
                    Tag::TableCell => FrameKind::TableCell,
                    Tag::Emphasis => FrameKind::Emphasis,
                    Tag::Strong => FrameKind::Strong,
                    Tag::Link { dest_url, .. } => FrameKind::Link(dest_url.to_string()),
                    Tag::Image { dest_url, .. } => FrameKind::Image(dest_url.to_string()),
                    _ => FrameKind::Other,
                };
                stack.push(Frame::new(kind));
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    if let (Some(frame), Some(parent)) = (stack.pop(), stack.last_mut()) {
                        close(frame, parent);
                    }
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                if let Some(frame) = stack.last_mut() {
                    push_text(frame, &text);
                }
            }
            Event::Code(code) => {
                if let Some(frame) = stack.last_mut() {
                    frame.inlines.push(InlineNode::Literal(code.to_string()));
                }
            }
            Event::SoftBreak => {
                if let Some(frame) = stack.last_mut() {
                    push_text(frame, "\n");
                }
            }
            Event::HardBreak => {
                if let Some(frame) = stack.last_mut() {
                    frame.inlines.push(InlineNode::LineBreak);
                }
            }
            Event::Rule => {
                if let Some(frame) = stack.last_mut() {
                    frame.flush_inlines();
                    frame.blocks.push(Node::Separator);
                }
            }
            _ => {}
        }
    }

    let mut root = Frame::new(FrameKind::Root);
    while let Some(frame) = stack.pop() {
        close(frame, &mut root);
    }

    let mut document = DocumentNode::new(file_path, compute_source_hash(text));
    document.children = nest_sections(root.into_blocks());
    tracing::debug!(file = file_path, nodes = document.children.len(), "Parsed Markdown document");
    document
}
