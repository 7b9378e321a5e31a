//! HTML output
//!
//! Converts compiled nodes into HTML fragments. Child lists are rendered
//! back through the [`RenderContext`], so a renderer registered for a single
//! kind also applies inside containers.

use rstdok_ast::{
    AdmonitionNode, CodeNode, ContainerNode, ContentsEntry, EnumeratorStyle, ImageNode,
    InlineCompoundNode, InlineNode, ListKind, ListNode, MenuEntry, Node, NodeKind, TableNode,
    TableRow, TocNode,
};

use super::{NodeRenderer, RenderContext};
use crate::error::Result;

/// Escape text for HTML content and attribute values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn class_attr(classes: &[String]) -> String {
    if classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", html_escape(&classes.join(" ")))
    }
}

/// Inline content as HTML
pub fn render_inlines(inlines: &[InlineNode], out: &mut String) {
    for inline in inlines {
        match inline {
            InlineNode::Plain(text) => out.push_str(&html_escape(text)),
            InlineNode::Emphasis(text) => out.push_str(&format!("<em>{}</em>", html_escape(text))),
            InlineNode::Strong(text) => {
                out.push_str(&format!("<strong>{}</strong>", html_escape(text)))
            }
            InlineNode::Literal(text) => {
                out.push_str(&format!("<code class=\"literal\">{}</code>", html_escape(text)))
            }
            InlineNode::Role(role) => match &role.title {
                Some(title) if role.role == "abbreviation" => out.push_str(&format!(
                    "<abbr title=\"{}\">{}</abbr>",
                    html_escape(title),
                    html_escape(&role.content)
                )),
                _ => out.push_str(&format!(
                    "<span class=\"role-{}\">{}</span>",
                    html_escape(&role.role),
                    html_escape(&role.content)
                )),
            },
            InlineNode::Hyperlink(link) => out.push_str(&format!(
                "<a class=\"reference external\" href=\"{}\">{}</a>",
                html_escape(&link.url),
                html_escape(&link.text)
            )),
            InlineNode::Reference(reference) => match &reference.url {
                Some(url) => out.push_str(&format!(
                    "<a class=\"reference internal\" href=\"{}\">{}</a>",
                    html_escape(url),
                    html_escape(reference.display_text())
                )),
                None => out.push_str(&format!(
                    "<span class=\"reference unresolved\">{}</span>",
                    html_escape(reference.display_text())
                )),
            },
            InlineNode::Variable(variable) => match &variable.value {
                Some(value) => render_inlines(value, out),
                None => out.push_str(&html_escape(&format!("|{}|", variable.name))),
            },
            InlineNode::Image(image) => out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" />",
                html_escape(&image.src),
                html_escape(&image.alt)
            )),
            InlineNode::Nbsp => out.push_str("&nbsp;"),
            InlineNode::LineBreak => out.push_str("<br />\n"),
        }
    }
}

fn inline_html(compound: &InlineCompoundNode) -> String {
    let mut out = String::new();
    render_inlines(&compound.children, &mut out);
    out
}

/// Built-in renderer for every kind a compiled tree can contain
pub struct HtmlRenderer;

impl NodeRenderer for HtmlRenderer {
    fn name(&self) -> &'static str {
        "html"
    }

    fn supports(&self, kind: NodeKind) -> bool {
        kind != NodeKind::Directive
    }

    fn render(&self, node: &Node, context: &RenderContext<'_>) -> Result<String> {
        let html = match node {
            Node::Section(section) => {
                let level = section.title.level.clamp(1, 6);
                format!(
                    "<section id=\"{id}\">\n<h{level}>{title}</h{level}>\n{body}\n</section>",
                    id = html_escape(&section.title.id),
                    level = level,
                    title = inline_html(&section.title.content),
                    body = context.render_nodes(&section.children)?,
                )
            }
            Node::Paragraph(paragraph) => format!("<p>{}</p>", inline_html(&paragraph.content)),
            Node::List(list) => render_list(list, context)?,
            Node::ListItem(item) => format!("<li>{}</li>", context.render_nodes(&item.children)?),
            Node::DefinitionList(list) => {
                let mut out = String::from("<dl>\n");
                for item in &list.items {
                    out.push_str("<dt>");
                    out.push_str(&inline_html(&item.term));
                    for classifier in &item.classifiers {
                        out.push_str(&format!(
                            " <span class=\"classifier\">{}</span>",
                            inline_html(classifier)
                        ));
                    }
                    out.push_str("</dt>\n");
                    out.push_str(&format!("<dd>{}</dd>\n", context.render_nodes(&item.definitions)?));
                }
                out.push_str("</dl>");
                out
            }
            Node::FieldList(list) => {
                let mut out = String::from("<dl class=\"field-list\">\n");
                for field in &list.fields {
                    out.push_str(&format!(
                        "<dt>{}</dt>\n<dd>{}</dd>\n",
                        html_escape(&field.name),
                        context.render_nodes(&field.value)?
                    ));
                }
                out.push_str("</dl>");
                out
            }
            Node::Table(table) => render_table(table, context)?,
            Node::Code(code) => render_code(code),
            Node::Quote(quote) => format!(
                "<blockquote>\n{}\n</blockquote>",
                context.render_nodes(&quote.children)?
            ),
            Node::Comment(_) => String::new(),
            Node::Separator => "<hr />".to_string(),
            Node::Anchor(anchor) => format!("<span id=\"{}\"></span>", html_escape(&anchor.name)),
            Node::GeneralDirective(directive) => format!(
                "<div class=\"directive directive-{}\">\n{}\n</div>",
                html_escape(&directive.name),
                context.render_nodes(&directive.children)?
            ),
            Node::Admonition(admonition) => render_admonition(admonition, context)?,
            Node::Image(image) => render_image(image),
            Node::Figure(figure) => {
                let align = figure
                    .image
                    .align
                    .as_ref()
                    .map(|a| format!(" class=\"align-{}\"", html_escape(a)))
                    .unwrap_or_default();
                let caption = context.render_nodes(&figure.caption)?;
                let caption = if caption.is_empty() {
                    String::new()
                } else {
                    format!("\n<figcaption>{}</figcaption>", caption)
                };
                format!("<figure{}>\n{}{}\n</figure>", align, render_image(&figure.image), caption)
            }
            Node::Toctree(toc) => render_toctree(toc, context),
            Node::Contents(contents) => {
                let title = contents.title.as_deref().unwrap_or("Contents");
                format!(
                    "<nav class=\"contents\">\n<p class=\"topic-title\">{}</p>\n{}\n</nav>",
                    html_escape(title),
                    render_contents_entries(&contents.entries)
                )
            }
            Node::Uml(uml) => {
                let caption = uml
                    .caption
                    .as_ref()
                    .map(|c| format!("\n<figcaption>{}</figcaption>", html_escape(c)))
                    .unwrap_or_default();
                let mut classes = vec!["uml".to_string()];
                classes.extend(uml.classes.iter().cloned());
                format!(
                    "<figure{}>\n<pre>{}</pre>{}\n</figure>",
                    class_attr(&classes),
                    html_escape(&uml.source),
                    caption
                )
            }
            Node::Raw(raw) if raw.format.eq_ignore_ascii_case("html") => raw.content.clone(),
            Node::Raw(_) => String::new(),
            Node::Container(container) => render_container(container, context)?,
            Node::Collection(collection) => context.render_nodes(&collection.children)?,
            Node::Directive(directive) => {
                format!("<!-- unprocessed directive: {} -->", html_escape(&directive.name))
            }
        };
        Ok(html)
    }
}

fn render_list(list: &ListNode, context: &RenderContext<'_>) -> Result<String> {
    let (tag, attrs) = match &list.list_kind {
        ListKind::Bullet { .. } => ("ul", String::new()),
        ListKind::Enumerated { style, start } => {
            let kind = match style {
                EnumeratorStyle::LowerAlpha => " type=\"a\"",
                EnumeratorStyle::UpperAlpha => " type=\"A\"",
                EnumeratorStyle::LowerRoman => " type=\"i\"",
                EnumeratorStyle::UpperRoman => " type=\"I\"",
                EnumeratorStyle::Arabic | EnumeratorStyle::Auto => "",
            };
            let start = if *start == 1 {
                String::new()
            } else {
                format!(" start=\"{}\"", start)
            };
            ("ol", format!("{}{}", kind, start))
        }
    };
    Ok(format!(
        "<{tag}{attrs}>\n{items}\n</{tag}>",
        tag = tag,
        attrs = attrs,
        items = context.render_nodes(&list.items)?
    ))
}

fn render_rows(rows: &[TableRow], cell_tag: &str, context: &RenderContext<'_>) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            let span = if cell.colspan > 1 {
                format!(" colspan=\"{}\"", cell.colspan)
            } else {
                String::new()
            };
            out.push_str(&format!(
                "<{tag}{span}>{body}</{tag}>",
                tag = cell_tag,
                span = span,
                body = context.render_nodes(&cell.children)?
            ));
        }
        out.push_str("</tr>\n");
    }
    Ok(out)
}

fn render_table(table: &TableNode, context: &RenderContext<'_>) -> Result<String> {
    let mut out = String::from("<table>\n");
    if !table.header_rows.is_empty() {
        out.push_str("<thead>\n");
        out.push_str(&render_rows(&table.header_rows, "th", context)?);
        out.push_str("</thead>\n");
    }
    out.push_str("<tbody>\n");
    out.push_str(&render_rows(&table.rows, "td", context)?);
    out.push_str("</tbody>\n</table>");
    Ok(out)
}

fn render_code(code: &CodeNode) -> String {
    let mut classes = vec!["highlight".to_string()];
    classes.extend(code.classes.iter().cloned());

    let first = code.starting_line_number.unwrap_or(1);
    let mut body = String::new();
    for (i, line) in code.value.lines().enumerate() {
        let number = first + i as u32;
        let mut line_html = html_escape(line);
        if code.line_numbers {
            line_html = format!("<span class=\"lineno\">{}</span>{}", number, line_html);
        }
        // emphasis is counted from the first line of the block
        if code.emphasize_lines.contains(&(i as u32 + 1)) {
            line_html = format!("<span class=\"hll\">{}</span>", line_html);
        }
        if i > 0 {
            body.push('\n');
        }
        body.push_str(&line_html);
    }

    let language = code
        .language
        .as_ref()
        .map(|l| format!(" class=\"language-{}\"", html_escape(l)))
        .unwrap_or_default();
    let caption = code
        .caption
        .as_ref()
        .map(|c| format!("<div class=\"code-block-caption\">{}</div>\n", html_escape(c)))
        .unwrap_or_default();
    format!(
        "<div{}>\n{}<pre><code{}>{}</code></pre>\n</div>",
        class_attr(&classes),
        caption,
        language,
        body
    )
}

fn admonition_title(name: &str) -> String {
    match name {
        "seealso" => "See also".to_string(),
        _ => {
            let mut chars = name.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        }
    }
}

fn render_admonition(admonition: &AdmonitionNode, context: &RenderContext<'_>) -> Result<String> {
    let title = match &admonition.title {
        Some(title) => inline_html(title),
        None => html_escape(&admonition_title(&admonition.name)),
    };
    let mut classes = vec!["admonition".to_string()];
    if admonition.name != "admonition" {
        classes.push(admonition.name.clone());
    }
    classes.extend(admonition.classes.iter().cloned());
    Ok(format!(
        "<div{}>\n<p class=\"admonition-title\">{}</p>\n{}\n</div>",
        class_attr(&classes),
        title,
        context.render_nodes(&admonition.children)?
    ))
}

fn render_image(image: &ImageNode) -> String {
    let mut attrs = format!("src=\"{}\"", html_escape(&image.src));
    attrs.push_str(&format!(
        " alt=\"{}\"",
        html_escape(image.alt.as_deref().unwrap_or_default())
    ));
    if let Some(width) = &image.width {
        attrs.push_str(&format!(" width=\"{}\"", html_escape(width)));
    }
    if let Some(height) = &image.height {
        attrs.push_str(&format!(" height=\"{}\"", html_escape(height)));
    }
    let mut classes = image.classes.clone();
    if let Some(align) = &image.align {
        classes.push(format!("align-{}", align));
    }
    let img = format!("<img {}{} />", attrs, class_attr(&classes));
    match &image.target {
        Some(target) => format!("<a href=\"{}\">{}</a>", html_escape(target), img),
        None => img,
    }
}

fn render_menu(entries: &[MenuEntry], context: &RenderContext<'_>, out: &mut String) {
    if entries.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for entry in entries {
        let url = context
            .urls
            .relative_url(context.file_path(), &entry.file, entry.anchor.as_deref());
        out.push_str(&format!(
            "<li><a class=\"reference internal\" href=\"{}\">{}</a>",
            html_escape(&url),
            html_escape(&entry.title)
        ));
        if !entry.children.is_empty() {
            out.push('\n');
            render_menu(&entry.children, context, out);
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
}

fn render_toctree(toc: &TocNode, context: &RenderContext<'_>) -> String {
    if toc.hidden {
        return String::new();
    }
    let mut out = String::from("<div class=\"toctree-wrapper\">\n");
    if let Some(caption) = &toc.caption {
        out.push_str(&format!("<p class=\"caption\">{}</p>\n", html_escape(caption)));
    }
    render_menu(&toc.menu, context, &mut out);
    out.push_str("</div>");
    out
}

fn render_contents_entries(entries: &[ContentsEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul>\n");
    for entry in entries {
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            html_escape(&entry.anchor),
            html_escape(&entry.title)
        ));
        let nested = render_contents_entries(&entry.children);
        if !nested.is_empty() {
            out.push('\n');
            out.push_str(&nested);
            out.push('\n');
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>");
    out
}

fn render_container(container: &ContainerNode, context: &RenderContext<'_>) -> Result<String> {
    let title = container.title.as_ref().map(inline_html);
    if container.name == "rubric" {
        let mut classes = vec!["rubric".to_string()];
        classes.extend(container.classes.iter().cloned());
        return Ok(format!("<p{}>{}</p>", class_attr(&classes), title.unwrap_or_default()));
    }

    let mut classes = vec![container.name.clone()];
    classes.extend(container.classes.iter().cloned());
    let heading = title
        .map(|t| format!("<p class=\"{}-title\">{}</p>\n", html_escape(&container.name), t))
        .unwrap_or_default();
    Ok(format!(
        "<div{}>\n{}{}\n</div>",
        class_attr(&classes),
        heading,
        context.render_nodes(&container.children)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::UrlGenerator;
    use crate::diagnostics::Reporter;
    use crate::render::RendererRegistry;
    use rstdok_ast::{
        DocumentNode, HyperlinkNode, ParagraphNode, ProjectNode, ReferenceKind, ReferenceNode,
    };

    fn render(node: Node, path: &str) -> String {
        let registry = RendererRegistry::with_defaults();
        let mut document = DocumentNode::new(path, "");
        document.push(node);
        registry
            .render_document(&document, &ProjectNode::default(), &UrlGenerator::default(), &Reporter::new())
            .unwrap()
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape(r#"say "hello""#), "say &quot;hello&quot;");
    }

    #[test]
    fn test_paragraph_inlines() {
        let mut resolved = ReferenceNode::new(ReferenceKind::Ref, "foo", None);
        resolved.url = Some("a.html#foo".to_string());
        resolved.resolved_title = Some("Foo".to_string());
        let paragraph = Node::Paragraph(ParagraphNode {
            content: InlineCompoundNode::new(vec![
                InlineNode::Plain("a < b ".to_string()),
                InlineNode::Strong("bold".to_string()),
                InlineNode::Plain(" ".to_string()),
                InlineNode::Reference(resolved),
                InlineNode::Plain(" ".to_string()),
                InlineNode::Reference(ReferenceNode::new(ReferenceKind::Ref, "nope", None)),
                InlineNode::Hyperlink(HyperlinkNode {
                    text: "Rust".to_string(),
                    url: "https://rust-lang.org".to_string(),
                }),
            ]),
        });
        let html = render(paragraph, "b");
        assert_eq!(
            html,
            "<p>a &lt; b <strong>bold</strong> <a class=\"reference internal\" href=\"a.html#foo\">Foo</a> \
             <span class=\"reference unresolved\">nope</span>\
             <a class=\"reference external\" href=\"https://rust-lang.org\">Rust</a></p>"
        );
    }

    #[test]
    fn test_code_block_line_numbers_and_emphasis() {
        let code = Node::Code(CodeNode {
            value: "let a = 1;\nlet b = a < 2;".to_string(),
            language: Some("rust".to_string()),
            starting_line_number: Some(10),
            line_numbers: true,
            emphasize_lines: vec![2],
            ..Default::default()
        });
        let html = render(code, "index");
        assert!(html.contains("<code class=\"language-rust\">"));
        assert!(html.contains("<span class=\"lineno\">10</span>let a = 1;"));
        assert!(html.contains("<span class=\"hll\"><span class=\"lineno\">11</span>let b = a &lt; 2;</span>"));
    }

    #[test]
    fn test_toctree_links_are_relative() {
        let toc = Node::Toctree(TocNode {
            caption: Some("Guide".to_string()),
            menu: vec![MenuEntry {
                file: "guide/install".to_string(),
                anchor: None,
                title: "Install".to_string(),
                children: vec![MenuEntry {
                    file: "guide/install".to_string(),
                    anchor: Some("linux".to_string()),
                    title: "Linux".to_string(),
                    children: vec![],
                }],
            }],
            ..Default::default()
        });
        let html = render(toc, "guide/index");
        assert!(html.contains("<p class=\"caption\">Guide</p>"));
        assert!(html.contains("href=\"install.html\">Install</a>"));
        assert!(html.contains("href=\"install.html#linux\">Linux</a>"));

        let hidden = Node::Toctree(TocNode {
            hidden: true,
            ..Default::default()
        });
        assert_eq!(render(hidden, "index"), "");
    }

    #[test]
    fn test_admonition_default_title() {
        let note = Node::Admonition(AdmonitionNode {
            name: "seealso".to_string(),
            title: None,
            classes: vec![],
            children: vec![],
        });
        assert!(render(note, "index").contains("<p class=\"admonition-title\">See also</p>"));
        assert_eq!(admonition_title("warning"), "Warning");
    }
}
