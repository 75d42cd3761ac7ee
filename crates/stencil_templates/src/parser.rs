//! Template compilation: source text to tag trees.
//!
//! Supported syntax:
//!
//! - `{{name}}` escaped variable, `{{{name}}}` and `{{&name}}` unescaped
//! - `{{#name}}...{{/name}}` sections, `{{^name}}...{{/name}}` inverted
//!   sections, closed by name or anonymously with `{{/}}`
//! - `{{! comment }}`, `{{> partial}}`, `{{=<% %>=}}` delimiter changes
//! - `{{% CONTENT_TYPE:TEXT }}` and `{{% CONTENT_TYPE:HTML }}` pragmas
//!
//! Expressions are `.`, identifiers made of `[A-Za-z0-9_$@-]`, dotted paths
//! (`a.b`, `.b`) and filter calls (`f(x)`, `f(g(x)).y`).

use std::mem;
use std::sync::Arc;

use regex::Regex;
use stencil_core::{ContentType, Expression, Node, Tag, TagKind};
use tracing::debug;

use crate::error::{CompileError, CompileResult};

const DEFAULT_OPEN: &str = "{{";
const DEFAULT_CLOSE: &str = "}}";

/// Output of the compiler.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub nodes: Arc<Vec<Node>>,
    /// Content type requested by a pragma, if any.
    pub content_type: Option<ContentType>,
}

/// Compiles template source into tag trees.
#[derive(Debug, Clone)]
pub struct TemplateParser {
    identifier_pattern: Regex,
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A section whose closing tag has not been seen yet.
struct OpenSection {
    kind: TagKind,
    expression: Expression,
    name: String,
    line: usize,
    body_start: usize,
    parent: Vec<Node>,
}

/// Tracks line numbers over monotonically increasing offsets.
struct LineCounter {
    line: usize,
    offset: usize,
}

impl LineCounter {
    fn line_at(&mut self, source: &str, offset: usize) -> usize {
        self.line += source[self.offset..offset].matches('\n').count();
        self.offset = offset;
        self.line
    }
}

impl TemplateParser {
    pub fn new() -> Self {
        Self {
            identifier_pattern: Regex::new(r"^[A-Za-z0-9_$@\-]+").expect("valid identifier pattern"),
        }
    }

    /// Compiles `source` to its tag tree.
    pub fn parse(&self, source: &str) -> CompileResult<Vec<Node>> {
        let compiled = self.compile(source)?;
        Ok(Arc::try_unwrap(compiled.nodes).unwrap_or_else(|nodes| nodes.as_ref().clone()))
    }

    /// Compiles `source`, keeping pragma information.
    pub fn compile(&self, source: &str) -> CompileResult<CompiledTemplate> {
        let mut open = DEFAULT_OPEN.to_string();
        let mut close = DEFAULT_CLOSE.to_string();
        let mut lines = LineCounter { line: 1, offset: 0 };
        let mut content_type = None;
        let mut nodes = Vec::new();
        let mut stack: Vec<OpenSection> = Vec::new();
        let mut pos = 0;

        while let Some(offset) = source[pos..].find(open.as_str()) {
            let tag_start = pos + offset;
            push_text(&mut nodes, &source[pos..tag_start]);
            let line = lines.line_at(source, tag_start);
            let inner_start = tag_start + open.len();

            // {{{name}}}
            if source[inner_start..].starts_with('{') {
                let closing = format!("}}{}", close);
                let content_start = inner_start + 1;
                let end = source[content_start..]
                    .find(closing.as_str())
                    .ok_or(CompileError::UnclosedTag { line })?;
                pos = content_start + end + closing.len();
                let expression = self.parse_expression(&source[content_start..content_start + end], line)?;
                nodes.push(Node::tag(Tag::variable(expression, false)));
                continue;
            }

            let end = source[inner_start..]
                .find(close.as_str())
                .ok_or(CompileError::UnclosedTag { line })?;
            let tag_end = inner_start + end + close.len();
            let content = source[inner_start..inner_start + end].trim();
            pos = tag_end;

            let mut chars = content.chars();
            let Some(sigil) = chars.next() else {
                return Err(CompileError::EmptyTag { line });
            };
            let rest = chars.as_str().trim();

            match sigil {
                '!' => {}
                '=' => {
                    let (new_open, new_close) = parse_delimiters(content, line)?;
                    debug!("Delimiters changed to {} {} on line {}", new_open, new_close, line);
                    open = new_open;
                    close = new_close;
                }
                '%' => {
                    if let Some(pragma) = parse_pragma(rest) {
                        content_type = Some(pragma);
                    } else {
                        debug!("Ignoring unknown pragma {} on line {}", rest, line);
                    }
                }
                '&' => {
                    let expression = self.parse_expression(rest, line)?;
                    nodes.push(Node::tag(Tag::variable(expression, false)));
                }
                '>' => {
                    if rest.is_empty() {
                        return Err(CompileError::EmptyTag { line });
                    }
                    nodes.push(Node::partial(rest));
                }
                '#' | '^' => {
                    let expression = self.parse_expression(rest, line)?;
                    stack.push(OpenSection {
                        kind: if sigil == '#' {
                            TagKind::Section
                        } else {
                            TagKind::InvertedSection
                        },
                        name: expression.to_string(),
                        expression,
                        line,
                        body_start: tag_end,
                        parent: mem::take(&mut nodes),
                    });
                }
                '/' => {
                    let section = stack.pop().ok_or_else(|| CompileError::UnexpectedClose {
                        name: rest.to_string(),
                        line,
                    })?;
                    if !rest.is_empty() && self.parse_expression(rest, line)?.to_string() != section.name {
                        return Err(CompileError::MismatchedClose {
                            expected: section.name,
                            found: rest.to_string(),
                            line,
                        });
                    }

                    let body = mem::replace(&mut nodes, section.parent);
                    let nested_source = &source[section.body_start..tag_start];
                    let tag = match section.kind {
                        TagKind::InvertedSection => {
                            Tag::inverted_section(section.expression, body, nested_source)
                        }
                        _ => Tag::section(section.expression, body, nested_source),
                    };
                    nodes.push(Node::tag(tag));
                }
                _ => {
                    let expression = self.parse_expression(content, line)?;
                    nodes.push(Node::tag(Tag::variable(expression, true)));
                }
            }
        }
        push_text(&mut nodes, &source[pos..]);

        if let Some(section) = stack.pop() {
            return Err(CompileError::UnclosedSection {
                name: section.name,
                line: section.line,
            });
        }

        debug!("Compiled {} top-level nodes", nodes.len());
        Ok(CompiledTemplate {
            nodes: Arc::new(nodes),
            content_type,
        })
    }

    /// Parses the expression of a single tag.
    pub fn parse_expression(&self, text: &str, line: usize) -> CompileResult<Expression> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CompileError::EmptyTag { line });
        }
        match self.expression_prefix(text) {
            Some((expression, "")) => Ok(expression),
            _ => Err(CompileError::InvalidExpression {
                expression: text.to_string(),
                line,
            }),
        }
    }

    fn expression_prefix<'s>(&self, input: &'s str) -> Option<(Expression, &'s str)> {
        let (mut expression, mut rest) = match input.strip_prefix('.') {
            Some(after_dot) => match self.identifier(after_dot) {
                Some((key, rest)) => (Expression::Implicit.scoped(key), rest),
                None => (Expression::Implicit, after_dot),
            },
            None => {
                let (name, rest) = self.identifier(input)?;
                (Expression::identifier(name), rest)
            }
        };

        loop {
            if let Some(after_dot) = rest.strip_prefix('.') {
                let (key, after) = self.identifier(after_dot)?;
                expression = expression.scoped(key);
                rest = after;
            } else if let Some(after_paren) = rest.strip_prefix('(') {
                let (argument, after) = self.expression_prefix(after_paren.trim_start())?;
                rest = after.trim_start().strip_prefix(')')?;
                expression = Expression::filtered(expression, argument);
            } else {
                return Some((expression, rest));
            }
        }
    }

    fn identifier<'s>(&self, input: &'s str) -> Option<(&'s str, &'s str)> {
        let found = self.identifier_pattern.find(input)?;
        Some(input.split_at(found.end()))
    }
}

/// Compiles `source` with a default parser.
pub fn parse(source: &str) -> CompileResult<Vec<Node>> {
    TemplateParser::new().parse(source)
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::text(text));
    }
}

fn parse_delimiters(content: &str, line: usize) -> CompileResult<(String, String)> {
    let invalid = CompileError::InvalidDelimiters { line };
    let inner = content
        .strip_prefix('=')
        .and_then(|c| c.strip_suffix('='))
        .ok_or_else(|| invalid.clone())?;

    let parts: Vec<&str> = inner.split_whitespace().collect();
    match parts.as_slice() {
        [open, close] if !open.contains('=') && !close.contains('=') => {
            Ok((open.to_string(), close.to_string()))
        }
        _ => Err(invalid),
    }
}

fn parse_pragma(pragma: &str) -> Option<ContentType> {
    match pragma {
        "CONTENT_TYPE:TEXT" => Some(ContentType::Text),
        "CONTENT_TYPE:HTML" => Some(ContentType::Html),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(node: &Node) -> &Tag {
        match node {
            Node::Tag(tag) => tag,
            other => panic!("expected a tag, got {:?}", other),
        }
    }

    #[test]
    fn test_text_and_variables() {
        let nodes = parse("Hello {{name}}, {{{raw}}} {{& amp }}!").unwrap();
        assert_eq!(nodes.len(), 7);
        assert!(matches!(&nodes[0], Node::Text(t) if t == "Hello "));

        let name = tag(&nodes[1]);
        assert_eq!(name.kind(), TagKind::Variable);
        assert_eq!(name.expression(), &Expression::identifier("name"));
        assert!(name.escapes());

        assert!(!tag(&nodes[3]).escapes());
        assert!(!tag(&nodes[5]).escapes());
        assert_eq!(tag(&nodes[5]).expression(), &Expression::identifier("amp"));
    }

    #[test]
    fn test_sections_keep_nested_source() {
        let nodes = parse("{{#items}}<{{.}}>{{/items}}{{^items}}none{{/}}").unwrap();
        assert_eq!(nodes.len(), 2);

        let section = tag(&nodes[0]);
        assert_eq!(section.kind(), TagKind::Section);
        assert_eq!(section.nested_source(), Some("<{{.}}>"));
        assert_eq!(section.nodes().len(), 3);
        assert_eq!(tag(&section.nodes()[1]).expression(), &Expression::Implicit);

        let inverted = tag(&nodes[1]);
        assert_eq!(inverted.kind(), TagKind::InvertedSection);
        assert_eq!(inverted.nested_source(), Some("none"));
    }

    #[test]
    fn test_expressions() {
        let parser = TemplateParser::new();
        let parse = |text: &str| parser.parse_expression(text, 1).unwrap();

        assert_eq!(parse("."), Expression::Implicit);
        assert_eq!(parse("a.b.c"), Expression::path(["a", "b", "c"]));
        assert_eq!(parse(".name"), Expression::Implicit.scoped("name"));
        assert_eq!(parse("@key"), Expression::identifier("@key"));
        assert_eq!(
            parse("each(.)"),
            Expression::filtered(Expression::identifier("each"), Expression::Implicit)
        );
        assert_eq!(
            parse("f( g(x) ).y"),
            Expression::filtered(
                Expression::identifier("f"),
                Expression::filtered(Expression::identifier("g"), Expression::identifier("x")),
            )
            .scoped("y")
        );
        assert_eq!(parse("f(x).y").to_string(), "f(x).y");
    }

    #[test]
    fn test_invalid_expressions() {
        let parser = TemplateParser::new();
        for text in ["a..b", "..", "f(x", "f(x))", "a b", "a.", "(x)"] {
            assert!(
                matches!(
                    parser.parse_expression(text, 2),
                    Err(CompileError::InvalidExpression { line: 2, .. })
                ),
                "{} should be invalid",
                text
            );
        }
    }

    #[test]
    fn test_comments_partials_and_delimiters() {
        let nodes = parse("{{! ignored }}{{> header }}{{=<% %>=}}<% name %>{{literal}}<%={{ }}=%>{{x}}").unwrap();
        assert!(matches!(&nodes[0], Node::Partial(name) if name == "header"));
        assert_eq!(tag(&nodes[1]).expression(), &Expression::identifier("name"));
        assert!(matches!(&nodes[2], Node::Text(t) if t == "{{literal}}"));
        assert_eq!(tag(&nodes[3]).expression(), &Expression::identifier("x"));
    }

    #[test]
    fn test_content_type_pragma() {
        let parser = TemplateParser::new();
        let compiled = parser.compile("{{% CONTENT_TYPE:TEXT }}{{x}}").unwrap();
        assert_eq!(compiled.content_type, Some(ContentType::Text));
        assert_eq!(compiled.nodes.len(), 1);

        let compiled = parser.compile("{{x}}").unwrap();
        assert_eq!(compiled.content_type, None);
    }

    #[test]
    fn test_errors_carry_lines() {
        let error = |source: &str| parse(source).unwrap_err();

        assert_eq!(error("a\n{{x"), CompileError::UnclosedTag { line: 2 });
        assert_eq!(error("{{{x}}"), CompileError::UnclosedTag { line: 1 });
        assert_eq!(
            error("\n\n{{#a}}\n"),
            CompileError::UnclosedSection {
                name: "a".to_string(),
                line: 3
            }
        );
        assert_eq!(
            error("{{#a}}\n{{/b}}"),
            CompileError::MismatchedClose {
                expected: "a".to_string(),
                found: "b".to_string(),
                line: 2
            }
        );
        assert_eq!(
            error("{{/a}}"),
            CompileError::UnexpectedClose {
                name: "a".to_string(),
                line: 1
            }
        );
        assert_eq!(error("{{ }}"), CompileError::EmptyTag { line: 1 });
        assert_eq!(error("{{#}}{{/}}"), CompileError::EmptyTag { line: 1 });
        assert_eq!(error("{{>}}"), CompileError::EmptyTag { line: 1 });
        assert_eq!(error("{{=<%=}}"), CompileError::InvalidDelimiters { line: 1 });
        assert_eq!(error("{{= a b c =}}"), CompileError::InvalidDelimiters { line: 1 });
    }
}
