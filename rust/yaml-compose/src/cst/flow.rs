// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Flow collection (`[]` and `{}`) and single-token scalar assembly.

use crate::error::{ErrorKind, FlowKind};
use crate::token::{SourceToken, TokenKind};

use super::{CstNode, FlowCollection, FlowItem, FlowScalar, FlowScalarStyle, Parser};

/// Whether a quoted scalar's source ends with its own closing quote.
pub(crate) fn is_quote_closed(source: &str) -> bool {
    let bytes = source.as_bytes();
    let Some((&quote, rest)) = bytes.split_first() else {
        return false;
    };
    let mut i = 0;
    while let Some(&byte) = rest.get(i) {
        if quote == b'"' && byte == b'\\' {
            i += 2;
            continue;
        }
        if byte == quote {
            if quote == b'\'' && rest.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1 == rest.len();
        }
        i += 1;
    }
    false
}

impl Parser<'_> {
    /// Assemble a scalar, alias or flow collection at the cursor.
    pub(super) fn parse_inline_node(&mut self) -> Option<CstNode> {
        match self.peek_kind()? {
            TokenKind::PlainScalar => Some(CstNode::Scalar(self.parse_flow_scalar())),
            TokenKind::QuotedScalar => {
                let scalar = self.parse_flow_scalar();
                if !is_quote_closed(&scalar.source) {
                    self.error(
                        scalar.span.end,
                        ErrorKind::UnterminatedQuotedString {
                            double_quoted: scalar.style == FlowScalarStyle::DoubleQuoted,
                        },
                    );
                }
                Some(CstNode::Scalar(scalar))
            }
            TokenKind::Alias => Some(CstNode::Alias(self.bump())),
            TokenKind::FlowStart => Some(self.parse_flow_collection()),
            _ => None,
        }
    }

    fn parse_flow_scalar(&mut self) -> FlowScalar {
        let SourceToken { kind, source, span } = self.bump();
        let style = match (kind, source.as_bytes().first()) {
            (TokenKind::QuotedScalar, Some(b'"')) => FlowScalarStyle::DoubleQuoted,
            (TokenKind::QuotedScalar, _) => FlowScalarStyle::SingleQuoted,
            _ => FlowScalarStyle::Plain,
        };
        FlowScalar {
            style,
            source,
            span,
        }
    }

    fn parse_flow_collection(&mut self) -> CstNode {
        let start = self.bump();
        let kind = if start.source == "{" {
            FlowKind::Map
        } else {
            FlowKind::Seq
        };
        let mut items = Vec::new();
        let mut end = None;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::FlowEnd => {
                    if let Some(found) = token.first_char()
                        && found != kind.close()
                    {
                        self.error(
                            token.offset(),
                            ErrorKind::MismatchedFlowEnd {
                                expected: kind,
                                found,
                            },
                        );
                    }
                    end = Some(self.bump());
                    break;
                }
                TokenKind::PlainScalar
                | TokenKind::QuotedScalar
                | TokenKind::Alias
                | TokenKind::FlowStart => {
                    if let Some(node) = self.parse_inline_node() {
                        items.push(FlowItem::Node(node));
                    }
                }
                TokenKind::Error => {
                    let error = if token.source == "-" {
                        ErrorKind::SeqItemInFlow
                    } else {
                        ErrorKind::UnexpectedToken(token.source.clone())
                    };
                    self.error(token.offset(), error);
                    items.push(FlowItem::Token(self.bump()));
                }
                TokenKind::DocumentMarker | TokenKind::DocumentStart | TokenKind::Directive => {
                    break;
                }
                _ => items.push(FlowItem::Token(self.bump())),
            }
        }
        let collection = FlowCollection { start, items, end };
        if collection.end.is_none() {
            let node = CstNode::FlowCollection(collection);
            self.error(node.end(), ErrorKind::MissingFlowEnd(kind));
            return node;
        }
        CstNode::FlowCollection(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;

    #[test]
    fn test_quote_closed() {
        let test_cases = [
            ("'a'", true),
            ("'it''s'", true),
            ("'open''", false),
            ("'", false),
            (r#""a\"b""#, true),
            (r#""a\""#, false),
            (r#""a\\""#, true),
            ("\"", false),
        ];
        for (source, expected) in test_cases {
            assert_eq!(is_quote_closed(source), expected, "{source:?}");
        }
    }

    #[test]
    fn test_flow_items_keep_tokens() {
        let stream = parse("[ a, &x b, { c: d } ]");
        let Some(Some(CstNode::FlowCollection(seq))) =
            stream.documents.first().map(|doc| &doc.value)
        else {
            panic!("expected a flow collection");
        };
        assert_eq!(seq.kind(), FlowKind::Seq);
        let nodes = seq
            .items
            .iter()
            .filter(|item| matches!(item, FlowItem::Node(_)))
            .count();
        assert_eq!(nodes, 3);
        assert!(seq.items.iter().any(|item| matches!(
            item,
            FlowItem::Token(token) if token.kind == TokenKind::Anchor
        )));
        assert!(seq.end.is_some());
    }

    #[test]
    fn test_flow_collection_as_key() {
        let stream = parse("[a, b]: c\n");
        let doc = stream.documents.first();
        assert!(doc.is_some_and(|doc| doc.errors.is_empty()));
        assert!(doc.is_some_and(|doc| matches!(doc.value, Some(CstNode::BlockMap(_)))));
    }
}
