// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Literal (`|`) and folded (`>`) block scalar values.

use crate::cst::BlockScalar;
use crate::error::{ErrorKind, OnError, YamlError};
use crate::token::TokenKind;
use crate::value::ScalarStyle;

/// Trailing line break handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Chomp {
    /// `-`: drop all trailing breaks
    Strip,
    /// Keep a single trailing break
    #[default]
    Clip,
    /// `+`: keep all trailing breaks
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    style: ScalarStyle,
    /// Explicit indentation indicator, 0 if absent.
    indent: usize,
    chomp: Chomp,
}

/// A resolved block scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockValue {
    pub value: String,
    pub style: ScalarStyle,
    /// Comment following the header on its line.
    pub comment: Option<String>,
}

fn parse_header(scalar: &BlockScalar, on_error: &mut OnError<'_>) -> Header {
    let source = &scalar.header.source;
    let style = if source.starts_with('>') {
        ScalarStyle::Folded
    } else {
        ScalarStyle::Literal
    };
    let mut header = Header {
        style,
        indent: 0,
        chomp: Chomp::Clip,
    };
    let mut chomp_seen = false;
    let mut invalid = false;
    for ch in source.chars().skip(1) {
        match ch {
            '-' | '+' if !chomp_seen => {
                chomp_seen = true;
                header.chomp = if ch == '-' { Chomp::Strip } else { Chomp::Keep };
            }
            '1'..='9' if header.indent == 0 => {
                header.indent = ch.to_digit(10).map_or(0, |digit| digit as usize);
            }
            _ => invalid = true,
        }
    }
    if invalid {
        on_error(YamlError::at(
            scalar.header.offset(),
            ErrorKind::InvalidBlockScalarHeader(source.clone()),
        ));
    }
    header
}

/// Header comment and stray content on the header line.
fn header_comment(scalar: &BlockScalar, on_error: &mut OnError<'_>) -> Option<String> {
    let mut comment: Option<String> = None;
    for token in &scalar.trivia {
        match token.kind {
            TokenKind::Comment => {
                let text = token.source.get(1..).unwrap_or_default();
                match &mut comment {
                    Some(comment) => {
                        comment.push('\n');
                        comment.push_str(text);
                    }
                    None => comment = Some(text.to_owned()),
                }
            }
            TokenKind::Error => on_error(YamlError::at(
                token.offset(),
                ErrorKind::UnexpectedToken(token.source.clone()),
            )),
            _ => {}
        }
    }
    comment
}

/// Split a body into (indentation, content) line pairs. Only spaces count
/// as indentation.
fn split_lines(body: &str) -> Vec<(usize, &str)> {
    body.split('\n')
        .map(|line| {
            let indent = line.len() - line.trim_start_matches(' ').len();
            (indent, line.get(indent..).unwrap_or_default())
        })
        .collect()
}

fn is_empty_line(content: &str) -> bool {
    content.is_empty() || content == "\r"
}

/// Resolve the value of a block scalar.
pub fn resolve_block_scalar(scalar: &BlockScalar, on_error: &mut OnError<'_>) -> BlockValue {
    let header = parse_header(scalar, on_error);
    let comment = header_comment(scalar, on_error);
    let body = &scalar.body.source;
    let lines = if body.is_empty() { Vec::new() } else { split_lines(body) };

    // Trailing empty lines are subject to chomping
    let mut chomp_start = lines.len();
    for (idx, (_, content)) in lines.iter().enumerate().rev() {
        if is_empty_line(content) {
            chomp_start = idx;
        } else {
            break;
        }
    }

    if chomp_start == 0 {
        let value = if header.chomp == Chomp::Keep && !lines.is_empty() {
            "\n".repeat(lines.len().saturating_sub(1).max(1))
        } else {
            String::new()
        };
        return BlockValue {
            value,
            style: header.style,
            comment,
        };
    }

    // Content indentation is explicit or taken from the first non-empty line
    let mut trim_indent = scalar.indent + header.indent;
    let mut offset = scalar.body.offset();
    let mut content_start = 0;
    for (idx, &(indent, content)) in lines.iter().enumerate().take(chomp_start) {
        if is_empty_line(content) {
            if header.indent == 0 && indent > trim_indent {
                trim_indent = indent;
            }
        } else {
            if indent < trim_indent {
                on_error(YamlError::at(offset + indent, ErrorKind::BlockScalarLeadingIndent));
            }
            if header.indent == 0 {
                trim_indent = indent;
            }
            content_start = idx;
            break;
        }
        offset += indent + content.len() + 1;
    }

    // More-indented trailing empty lines are content
    for idx in (chomp_start..lines.len()).rev() {
        if lines.get(idx).is_some_and(|&(indent, _)| indent > trim_indent) {
            chomp_start = idx + 1;
            break;
        }
    }

    let mut value = String::new();
    for &(indent, _) in lines.iter().take(content_start) {
        value.push_str(&" ".repeat(indent.saturating_sub(trim_indent)));
        value.push('\n');
    }
    let mut sep = "";
    let mut prev_more_indented = false;
    for &(indent, content) in lines.get(content_start..chomp_start).unwrap_or_default() {
        let content = content.strip_suffix('\r').unwrap_or(content);
        let extra = " ".repeat(indent.saturating_sub(trim_indent));
        if header.style == ScalarStyle::Literal {
            value.push_str(sep);
            value.push_str(&extra);
            value.push_str(content);
            sep = "\n";
        } else if indent > trim_indent || content.starts_with('\t') {
            // More-indented lines of a folded scalar keep their breaks
            if sep == " " {
                sep = "\n";
            } else if !prev_more_indented && sep == "\n" {
                sep = "\n\n";
            }
            value.push_str(sep);
            value.push_str(&extra);
            value.push_str(content);
            sep = "\n";
            prev_more_indented = true;
        } else if content.is_empty() {
            if sep == "\n" {
                value.push('\n');
            } else {
                sep = "\n";
            }
        } else {
            value.push_str(sep);
            value.push_str(content);
            sep = " ";
            prev_more_indented = false;
        }
    }

    match header.chomp {
        Chomp::Strip => {}
        Chomp::Clip => value.push('\n'),
        Chomp::Keep => {
            for &(indent, _) in lines.get(chomp_start..).unwrap_or_default() {
                value.push('\n');
                value.push_str(&" ".repeat(indent.saturating_sub(trim_indent)));
            }
            if !value.ends_with('\n') {
                value.push('\n');
            }
        }
    }
    BlockValue {
        value,
        style: header.style,
        comment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{CstNode, parse};

    /// Resolve the block scalar value of `key: <header>...`.
    fn resolve(src: &str) -> (BlockValue, Vec<YamlError>) {
        let stream = parse(src);
        let Some(Some(CstNode::BlockMap(map))) = stream.documents.first().map(|doc| &doc.value)
        else {
            panic!("expected a block map for {src:?}");
        };
        let Some(Some(CstNode::BlockScalar(scalar))) = map.items.first().map(|item| &item.value)
        else {
            panic!("expected a block scalar for {src:?}");
        };
        let mut errors = Vec::new();
        let value = resolve_block_scalar(scalar, &mut |err| errors.push(err));
        (value, errors)
    }

    #[test]
    fn test_literal_chomping() {
        let test_cases = [
            ("a: |\n  x\n  y\n\n", "x\ny\n"),
            ("a: |-\n  x\n  y\n\n", "x\ny"),
            ("a: |+\n  x\n  y\n\n", "x\ny\n\n"),
            ("a: |\n  x\n\n  y\n", "x\n\ny\n"),
            ("a: |\n  x\n    indented\n", "x\n  indented\n"),
            ("a: |\n  x", "x\n"),
            ("a: |\n", ""),
            ("a: |+\n\n", "\n"),
        ];
        for (src, expected) in test_cases {
            let (value, errors) = resolve(src);
            assert_eq!(value.value, expected, "{src:?}");
            assert_eq!(value.style, ScalarStyle::Literal);
            assert!(errors.is_empty(), "{src:?}: {errors:?}");
        }
    }

    #[test]
    fn test_folded() {
        let test_cases = [
            ("a: >\n  one\n  two\n", "one two\n"),
            ("a: >\n  one\n\n  two\n", "one\ntwo\n"),
            ("a: >-\n  one\n    more\n  two\n", "one\n  more\ntwo"),
            ("a: >\n  one\r\n  two\r\n", "one two\n"),
        ];
        for (src, expected) in test_cases {
            let (value, errors) = resolve(src);
            assert_eq!(value.value, expected, "{src:?}");
            assert_eq!(value.style, ScalarStyle::Folded);
            assert!(errors.is_empty(), "{src:?}: {errors:?}");
        }
    }

    #[test]
    fn test_explicit_indentation() {
        let (value, errors) = resolve("a: |2\n    x\n  y\n");
        assert_eq!(value.value, "  x\ny\n");
        assert!(errors.is_empty());

        let (value, _) = resolve("a: |-1\n  x\n");
        assert_eq!(value.value, " x");
    }

    #[test]
    fn test_header_comment_and_errors() {
        let (value, errors) = resolve("a: | # note\n  x\n");
        assert_eq!(value.comment.as_deref(), Some(" note"));
        assert!(errors.is_empty());

        let (_, errors) = resolve("a: |x\n  y\n");
        assert_eq!(
            errors.first().map(|err| &err.kind),
            Some(&ErrorKind::InvalidBlockScalarHeader("|x".to_owned()))
        );

        let (value, errors) = resolve("a: |\n     \n  x\n");
        assert_eq!(value.value, "   \nx\n");
        assert_eq!(
            errors.first().map(|err| &err.kind),
            Some(&ErrorKind::BlockScalarLeadingIndent)
        );
    }
}
