// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Concrete syntax tree assembly.
//!
//! This module implements the second phase of processing: grouping the
//! lexer's flat token stream into documents, block collections, flow
//! collections and scalars. Nodes keep the exact source tokens they were
//! built from, including comments and whitespace, so the composer can attach
//! comments and report errors at precise offsets.
//!
//! Block structure is decided from token columns. Structural problems are
//! recorded on the enclosing document and assembly always continues.

mod block;
mod flow;

pub(crate) use flow::is_quote_closed;

use log::debug;

use crate::error::{ErrorKind, FlowKind, YamlError};
use crate::lexer::tokenize;
use crate::span::{SourceMap, Span, span_at};
use crate::token::{SourceToken, TokenKind};

/// Quoting style of a single-token scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

/// A plain or quoted scalar; `source` is the raw text including quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowScalar {
    pub style: FlowScalarStyle,
    pub source: String,
    pub span: Span,
}

/// A `|` or `>` scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockScalar {
    pub header: SourceToken,
    /// Spaces, comment and line break following the header.
    pub trivia: Vec<SourceToken>,
    pub body: SourceToken,
    /// Column of the enclosing collection, the base for an explicit
    /// indentation indicator.
    pub indent: usize,
}

/// A member of a flow collection: an indicator or trivia token, or a node.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowItem {
    Token(SourceToken),
    Node(CstNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowCollection {
    pub start: SourceToken,
    pub items: Vec<FlowItem>,
    /// Missing when the collection is not terminated.
    pub end: Option<SourceToken>,
}

impl FlowCollection {
    pub fn kind(&self) -> FlowKind {
        if self.start.source == "{" {
            FlowKind::Map
        } else {
            FlowKind::Seq
        }
    }
}

/// One entry of a block mapping.
///
/// `start` holds trivia, the `?` indicator and the key's properties; `sep`
/// holds the `:` indicator, trivia and the value's properties.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMapItem {
    pub start: Vec<SourceToken>,
    pub key: Option<CstNode>,
    pub sep: Vec<SourceToken>,
    pub value: Option<CstNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockMap {
    pub indent: usize,
    pub offset: usize,
    pub items: Vec<BlockMapItem>,
}

/// One entry of a block sequence; `start` holds trivia, the `-` indicator
/// and the value's properties.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSeqItem {
    pub start: Vec<SourceToken>,
    pub value: Option<CstNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockSeq {
    pub indent: usize,
    pub offset: usize,
    pub items: Vec<BlockSeqItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstNode {
    Scalar(FlowScalar),
    BlockScalar(BlockScalar),
    Alias(SourceToken),
    FlowCollection(FlowCollection),
    BlockMap(BlockMap),
    BlockSeq(BlockSeq),
}

impl CstNode {
    /// Offset of the first byte of the node.
    pub fn offset(&self) -> usize {
        match self {
            Self::Scalar(scalar) => scalar.span.start,
            Self::BlockScalar(scalar) => scalar.header.offset(),
            Self::Alias(token) => token.offset(),
            Self::FlowCollection(collection) => collection.start.offset(),
            Self::BlockMap(map) => map.offset,
            Self::BlockSeq(seq) => seq.offset,
        }
    }

    /// Offset just past the last significant byte of the node.
    pub fn end(&self) -> usize {
        match self {
            Self::Scalar(scalar) => scalar.span.end,
            Self::BlockScalar(scalar) => scalar.body.span.end,
            Self::Alias(token) => token.span.end,
            Self::FlowCollection(collection) => match &collection.end {
                Some(end) => end.span.end,
                None => collection
                    .items
                    .iter()
                    .rev()
                    .find_map(|item| match item {
                        FlowItem::Node(node) => Some(node.end()),
                        FlowItem::Token(token) if !token.kind.is_trivia() => Some(token.span.end),
                        FlowItem::Token(_) => None,
                    })
                    .unwrap_or(collection.start.span.end),
            },
            Self::BlockMap(map) => map
                .items
                .last()
                .map_or(map.offset, |item| {
                    item.value
                        .as_ref()
                        .map(Self::end)
                        .or_else(|| significant_end(&item.sep))
                        .or_else(|| item.key.as_ref().map(Self::end))
                        .or_else(|| significant_end(&item.start))
                        .unwrap_or(map.offset)
                }),
            Self::BlockSeq(seq) => seq.items.last().map_or(seq.offset, |item| {
                item.value
                    .as_ref()
                    .map(Self::end)
                    .or_else(|| significant_end(&item.start))
                    .unwrap_or(seq.offset)
            }),
        }
    }

    pub fn span(&self) -> Span {
        let start = self.offset();
        span_at(start, self.end().saturating_sub(start))
    }
}

fn significant_end(tokens: &[SourceToken]) -> Option<usize> {
    tokens
        .iter()
        .rev()
        .find(|token| !token.kind.is_trivia())
        .map(|token| token.span.end)
}

/// One document of a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CstDocument {
    /// Directives, comments, the `---` marker and the root's properties.
    pub start: Vec<SourceToken>,
    pub value: Option<CstNode>,
    /// Trivia after the root node, the `...` marker and any stray content.
    pub end: Vec<SourceToken>,
    pub errors: Vec<YamlError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstStream {
    pub documents: Vec<CstDocument>,
    /// Comments and directives after the last document.
    pub trailing: Vec<SourceToken>,
}

/// Tokenize and assemble a complete input.
pub fn parse(src: &str) -> CstStream {
    let tokens = tokenize(src);
    debug!("assembling {} tokens", tokens.len());
    let map = SourceMap::new(src);
    Parser::new(&tokens, &map).parse_stream()
}

/// Token cursor for assembly.
#[derive(Debug)]
pub(crate) struct Parser<'a> {
    tokens: &'a [SourceToken],
    map: &'a SourceMap,
    pos: usize,
    errors: Vec<YamlError>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [SourceToken], map: &'a SourceMap) -> Self {
        Self {
            tokens,
            map,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a SourceToken> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Consume the current token. Only called after a successful peek.
    fn bump(&mut self) -> SourceToken {
        let token = self.tokens.get(self.pos).cloned().unwrap_or_else(|| SourceToken {
            kind: TokenKind::Error,
            source: String::new(),
            span: span_at(self.end_offset(), 0),
        });
        self.pos += 1;
        token
    }

    /// Consume tokens while `pred` holds.
    fn bump_while(&mut self, into: &mut Vec<SourceToken>, pred: impl Fn(TokenKind) -> bool) {
        while let Some(kind) = self.peek_kind()
            && pred(kind)
        {
            into.push(self.bump());
        }
    }

    /// Offset of the current token, or the end of input.
    fn offset(&self) -> usize {
        self.peek().map_or_else(|| self.end_offset(), SourceToken::offset)
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |token| token.span.end)
    }

    fn column(&self, offset: usize) -> usize {
        self.map.column(offset)
    }

    /// Whether only indentation precedes the token at `idx` on its line.
    fn at_line_start(&self, idx: usize) -> bool {
        let mut i = idx;
        while i > 0 {
            i -= 1;
            let Some(token) = self.tokens.get(i) else {
                return true;
            };
            match token.kind {
                TokenKind::Space => {}
                TokenKind::Newline | TokenKind::DocumentStart => return true,
                // A block scalar body runs through its final line break
                TokenKind::BlockScalar if token.source.is_empty() => {}
                TokenKind::BlockScalar => return token.source.ends_with('\n'),
                _ => return false,
            }
        }
        true
    }

    fn error(&mut self, offset: usize, kind: ErrorKind) {
        self.errors.push(YamlError::at(offset, kind));
    }

    fn parse_stream(mut self) -> CstStream {
        let mut documents = Vec::new();
        loop {
            let mut start = Vec::new();
            self.bump_while(&mut start, |kind| {
                matches!(
                    kind,
                    TokenKind::Directive | TokenKind::Space | TokenKind::Newline | TokenKind::Comment
                )
            });
            if self.peek().is_none() {
                debug!("assembled {} documents", documents.len());
                return CstStream {
                    documents,
                    trailing: start,
                };
            }
            let has_directives = start.iter().any(|token| token.kind == TokenKind::Directive);
            if self.peek_kind() == Some(TokenKind::DocumentStart) {
                start.push(self.bump());
            }
            if let Some(token) = self.peek()
                && token.kind == TokenKind::DocumentMarker
                && token.source == "---"
            {
                start.push(self.bump());
            } else if has_directives {
                self.error(self.offset(), ErrorKind::MissingDirectivesEnd);
            }

            let value = self.parse_value(block::ValueContext::ROOT, &mut start);
            let end = self.parse_document_end();
            documents.push(CstDocument {
                start,
                value,
                end,
                errors: std::mem::take(&mut self.errors),
            });
        }
    }

    /// Collect everything between the root node and the next document.
    fn parse_document_end(&mut self) -> Vec<SourceToken> {
        let mut end = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                kind if kind.is_trivia() => end.push(self.bump()),
                TokenKind::DocumentMarker if token.source == "..." => {
                    end.push(self.bump());
                    self.bump_while(&mut end, |kind| {
                        matches!(kind, TokenKind::Space | TokenKind::Comment)
                    });
                    if self.peek_kind() == Some(TokenKind::Newline) {
                        end.push(self.bump());
                    }
                    break;
                }
                TokenKind::DocumentMarker | TokenKind::DocumentStart | TokenKind::Directive => break,
                _ => {
                    let kind = match token.first_char() {
                        Some(ch @ ('}' | ']')) if token.kind == TokenKind::Error => {
                            ErrorKind::UnexpectedFlowEnd(ch)
                        }
                        _ => ErrorKind::TrailingContent,
                    };
                    self.error(token.offset(), kind);
                    self.bump_while(&mut end, |kind| {
                        !matches!(
                            kind,
                            TokenKind::Newline | TokenKind::DocumentMarker | TokenKind::DocumentStart
                        )
                    });
                }
            }
        }
        end
    }
}
