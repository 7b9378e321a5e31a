use rstdok_ast::{CodeNode, DirectiveNode, Node};

use super::{classes, DirectiveContext, DirectiveHandler};
use crate::diagnostics::codes;
use crate::error::ParseError;

/// Parse `1,3-5` into sorted line numbers
pub fn parse_line_ranges(ranges: &str) -> Option<Vec<u32>> {
    let mut lines = Vec::new();
    for part in ranges.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from: u32 = from.trim().parse().ok()?;
                let to: u32 = to.trim().parse().ok()?;
                if from == 0 || to < from {
                    return None;
                }
                lines.extend(from..=to);
            }
            None => {
                let line: u32 = part.parse().ok()?;
                if line == 0 {
                    return None;
                }
                lines.push(line);
            }
        }
    }
    lines.sort_unstable();
    lines.dedup();
    Some(lines)
}

/// Options shared by `code-block` and `literalinclude`
fn apply_code_options(node: &mut CodeNode, directive: &DirectiveNode, context: &DirectiveContext<'_>) {
    if directive.has_option("linenos") {
        node.line_numbers = true;
        node.starting_line_number = Some(1);
    }
    if let Some(start) = directive.option("lineno-start") {
        match start.trim().parse::<u32>() {
            Ok(start) => {
                node.line_numbers = true;
                node.starting_line_number = Some(start);
            }
            Err(_) => context.warning(
                codes::INVALID_OPTION,
                directive,
                format!("Invalid :lineno-start: value '{}'", start),
            ),
        }
    }
    if let Some(ranges) = directive.option("emphasize-lines") {
        match parse_line_ranges(ranges) {
            Some(lines) => node.emphasize_lines = lines,
            None => context.warning(
                codes::INVALID_OPTION,
                directive,
                format!("Invalid :emphasize-lines: value '{}'", ranges),
            ),
        }
    }
    node.caption = directive
        .option("caption")
        .map(str::to_string)
        .filter(|c| !c.is_empty());
    node.classes = classes(directive);
}

/// `.. code-block:: language`
pub struct CodeBlockDirective;

impl DirectiveHandler for CodeBlockDirective {
    fn name(&self) -> &'static str {
        "code-block"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["code", "sourcecode"]
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let language = Some(directive.data.trim().to_string()).filter(|l| !l.is_empty());
        let mut node = CodeNode {
            value: directive.content.clone(),
            language,
            ..Default::default()
        };
        apply_code_options(&mut node, directive, context);
        Ok(Some(Node::Code(node)))
    }
}

/// `.. literalinclude:: path` reads a code block from a file
pub struct LiteralIncludeDirective;

impl DirectiveHandler for LiteralIncludeDirective {
    fn name(&self) -> &'static str {
        "literalinclude"
    }

    fn process(
        &self,
        directive: &DirectiveNode,
        context: &mut DirectiveContext<'_>,
    ) -> Result<Option<Node>, ParseError> {
        let path = context.resolve_path(&directive.data);
        let source = match context.filesystem.read(&path) {
            Ok(source) => source,
            Err(err) => {
                context.error(
                    codes::MISSING_FILE,
                    directive,
                    format!("Cannot read literal include '{}': {}", path, err),
                );
                return Ok(None);
            }
        };
        context.state.add_dependency(path.clone());

        let mut value = source.trim_end_matches('\n').to_string();
        if let Some(ranges) = directive.option("lines") {
            match parse_line_ranges(ranges) {
                Some(selected) => {
                    let lines: Vec<&str> = source.lines().collect();
                    value = selected
                        .iter()
                        .filter_map(|n| lines.get(*n as usize - 1).copied())
                        .collect::<Vec<_>>()
                        .join("\n");
                }
                None => context.warning(
                    codes::INVALID_OPTION,
                    directive,
                    format!("Invalid :lines: value '{}'", ranges),
                ),
            }
        }

        let language = directive
            .option("language")
            .map(str::to_string)
            .or_else(|| path.rsplit_once('.').map(|(_, ext)| ext.to_string()));
        let mut node = CodeNode {
            value,
            language,
            ..Default::default()
        };
        apply_code_options(&mut node, directive, context);
        Ok(Some(Node::Code(node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::tests::{directive, run};
    use crate::fs::MemoryFilesystem;

    #[test]
    fn test_line_ranges() {
        assert_eq!(parse_line_ranges("1,3-5"), Some(vec![1, 3, 4, 5]));
        assert_eq!(parse_line_ranges("4, 2, 2"), Some(vec![2, 4]));
        assert_eq!(parse_line_ranges("5-3"), None);
        assert_eq!(parse_line_ranges("x"), None);
    }

    #[test]
    fn test_code_block_options() {
        let mut raw = directive("code", "python", "print(1)\nprint(2)");
        raw.options.insert("lineno-start".to_string(), "10".to_string());
        raw.options.insert("emphasize-lines".to_string(), "2".to_string());
        raw.options.insert("caption".to_string(), "Example".to_string());
        let (node, _, _) = run(&raw, &MemoryFilesystem::new(), "index");

        let Some(Node::Code(code)) = node else {
            panic!("expected code");
        };
        assert_eq!(code.language.as_deref(), Some("python"));
        assert_eq!(code.starting_line_number, Some(10));
        assert!(code.line_numbers);
        assert_eq!(code.emphasize_lines, vec![2]);
        assert_eq!(code.caption.as_deref(), Some("Example"));
    }

    #[test]
    fn test_invalid_lineno_start_is_ignored() {
        let mut raw = directive("code-block", "rust", "fn main() {}");
        raw.options.insert("lineno-start".to_string(), "ten".to_string());
        let (node, _, reporter) = run(&raw, &MemoryFilesystem::new(), "index");

        let Some(Node::Code(code)) = node else {
            panic!("expected code");
        };
        assert_eq!(code.starting_line_number, None);
        assert!(!code.line_numbers);
        assert_eq!(reporter.problem_count(), 1);
    }

    #[test]
    fn test_literal_include_selects_lines() {
        let fs = MemoryFilesystem::with_files([("guide/src/main.rs", "// head\nfn main() {}\n// tail\n")]);
        let mut raw = directive("literalinclude", "src/main.rs", "");
        raw.options.insert("lines".to_string(), "2".to_string());
        let (node, state, _) = run(&raw, &fs, "guide/index");

        let Some(Node::Code(code)) = node else {
            panic!("expected code");
        };
        assert_eq!(code.value, "fn main() {}");
        assert_eq!(code.language.as_deref(), Some("rs"));
        assert_eq!(state.dependencies, vec!["guide/src/main.rs".to_string()]);
    }

    #[test]
    fn test_missing_literal_include_is_dropped() {
        let raw = directive("literalinclude", "missing.py", "");
        let (node, _, reporter) = run(&raw, &MemoryFilesystem::new(), "index");
        assert!(node.is_none());
        assert!(reporter.has_errors());
    }
}
