// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Block collection assembly (indentation-delimited maps and sequences).

use chumsky::span::Span as _;

use crate::error::ErrorKind;
use crate::span::{Span, span_at};
use crate::token::{SourceToken, TokenKind};

use super::{BlockMap, BlockMapItem, BlockScalar, BlockSeq, BlockSeqItem, CstNode, FlowScalar, Parser};

/// Where a block value is being assembled.
#[derive(Debug, Clone, Copy)]
pub(super) struct ValueContext {
    /// Column of the enclosing collection, -1 at the document root.
    pub indent: isize,
    /// A block sequence may start at the enclosing map's own column.
    pub seq_at_indent: bool,
    /// The value follows an implicit key.
    pub compact: bool,
}

impl ValueContext {
    pub const ROOT: Self = Self {
        indent: -1,
        seq_at_indent: false,
        compact: false,
    };

    fn nested(indent: usize) -> Self {
        Self {
            indent: as_signed(indent),
            seq_at_indent: false,
            compact: false,
        }
    }
}

fn as_signed(indent: usize) -> isize {
    isize::try_from(indent).unwrap_or(isize::MAX)
}

const fn is_map_entry_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::PlainScalar
            | TokenKind::QuotedScalar
            | TokenKind::Alias
            | TokenKind::FlowStart
            | TokenKind::ExplicitKey
            | TokenKind::Colon
            | TokenKind::Anchor
            | TokenKind::Tag
    )
}

impl Parser<'_> {
    /// Assemble the node following an indicator (or the document start).
    ///
    /// Trivia and properties before the node are pushed to `bucket`. Returns
    /// `None` for an empty node, in which case trivia after the last property
    /// is left unconsumed for the enclosing collection.
    pub(super) fn parse_value(
        &mut self,
        ctx: ValueContext,
        bucket: &mut Vec<SourceToken>,
    ) -> Option<CstNode> {
        let initial = bucket.len();
        let mut keep = initial;
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::Space | TokenKind::Newline | TokenKind::Comment => {
                    bucket.push(self.bump());
                }
                TokenKind::Anchor | TokenKind::Tag => {
                    bucket.push(self.bump());
                    keep = bucket.len();
                }
                _ => break,
            }
        }
        let Some(token) = self.peek() else {
            self.give_back(bucket, keep);
            return None;
        };
        let offset = token.offset();
        let column = self.column(offset);
        let first_on_line = self.at_line_start(self.pos);
        let same_line_compact = ctx.compact && !first_on_line;
        if first_on_line
            && as_signed(column) <= ctx.indent
            && !(token.kind == TokenKind::SeqItem
                && ctx.seq_at_indent
                && as_signed(column) == ctx.indent)
        {
            self.give_back(bucket, keep);
            return None;
        }

        match token.kind {
            TokenKind::SeqItem => {
                if same_line_compact {
                    self.error(offset, ErrorKind::SeqItemOnKeyLine);
                }
                Some(self.parse_block_seq(column))
            }
            TokenKind::ExplicitKey | TokenKind::Colon => {
                if same_line_compact {
                    self.error(offset, ErrorKind::NestedCompactMap);
                }
                Some(self.parse_block_map(column, Vec::new()))
            }
            TokenKind::PlainScalar
            | TokenKind::QuotedScalar
            | TokenKind::Alias
            | TokenKind::FlowStart => {
                if !self.is_implicit_key(self.pos) {
                    let node = self.parse_inline_node()?;
                    return Some(match node {
                        CstNode::Scalar(scalar) => {
                            CstNode::Scalar(self.join_plain_lines(scalar, ctx.indent))
                        }
                        node => node,
                    });
                }
                if same_line_compact {
                    self.error(offset, ErrorKind::NestedCompactMap);
                }
                // Properties on the key's own line belong to the key
                let line_start = bucket
                    .get(initial..)
                    .unwrap_or_default()
                    .iter()
                    .rposition(|t| t.kind == TokenKind::Newline)
                    .map_or(initial, |idx| initial + idx + 1);
                let split = bucket
                    .get(line_start..)
                    .unwrap_or_default()
                    .iter()
                    .position(|t| t.kind.is_property())
                    .map(|idx| line_start + idx);
                let (first_start, indent) = match split {
                    Some(idx) => {
                        let moved = bucket.split_off(idx);
                        let indent = moved.first().map_or(column, |t| self.column(t.offset()));
                        (moved, indent)
                    }
                    None => (Vec::new(), column),
                };
                Some(self.parse_block_map(indent, first_start))
            }
            TokenKind::BlockScalarHeader => Some(self.parse_block_scalar(ctx.indent)),
            _ => {
                self.give_back(bucket, keep);
                None
            }
        }
    }

    /// Return the tokens after `keep` to the cursor.
    fn give_back(&mut self, bucket: &mut Vec<SourceToken>, keep: usize) {
        let extra = bucket.len().saturating_sub(keep);
        bucket.truncate(keep);
        self.pos -= extra;
    }

    /// Whether the node at `idx` is followed on its line by a `:` indicator.
    pub(super) fn is_implicit_key(&self, idx: usize) -> bool {
        let mut i = idx;
        if self.tokens.get(i).map(|t| t.kind) == Some(TokenKind::FlowStart) {
            let mut depth = 0usize;
            loop {
                match self.tokens.get(i).map(|t| t.kind) {
                    Some(TokenKind::FlowStart) => depth += 1,
                    Some(TokenKind::FlowEnd) => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            break;
                        }
                    }
                    Some(TokenKind::DocumentMarker | TokenKind::DocumentStart) | None => {
                        return false;
                    }
                    Some(_) => {}
                }
                i += 1;
            }
        }
        i += 1;
        while self.tokens.get(i).map(|t| t.kind) == Some(TokenKind::Space) {
            i += 1;
        }
        self.tokens.get(i).map(|t| t.kind) == Some(TokenKind::Colon)
    }

    /// Merge plain scalar lines the lexer split at a blank line.
    fn join_plain_lines(&mut self, mut scalar: FlowScalar, indent: isize) -> FlowScalar {
        if scalar.style != super::FlowScalarStyle::Plain {
            return scalar;
        }
        loop {
            let mut idx = self.pos;
            let mut saw_newline = false;
            while let Some(token) = self.tokens.get(idx)
                && matches!(token.kind, TokenKind::Space | TokenKind::Newline)
            {
                saw_newline |= token.kind == TokenKind::Newline;
                idx += 1;
            }
            let Some(next) = self.tokens.get(idx) else {
                return scalar;
            };
            if !saw_newline
                || next.kind != TokenKind::PlainScalar
                || as_signed(self.column(next.offset())) <= indent
                || self.is_implicit_key(idx)
            {
                return scalar;
            }
            for token in self.tokens.get(self.pos..=idx).unwrap_or_default() {
                scalar.source.push_str(&token.source);
            }
            scalar.span = Span::new((), scalar.span.start..next.span.end);
            self.pos = idx + 1;
        }
    }

    pub(super) fn parse_block_map(
        &mut self,
        indent: usize,
        first_start: Vec<SourceToken>,
    ) -> CstNode {
        let offset = first_start
            .first()
            .map_or_else(|| self.offset(), SourceToken::offset);
        let mut items = Vec::new();
        let mut start = first_start;
        loop {
            items.push(self.parse_map_item(indent, start));
            match self.continue_collection(indent, "mapping", is_map_entry_start) {
                Some(trivia) => start = trivia,
                None => break,
            }
        }
        CstNode::BlockMap(BlockMap {
            indent,
            offset,
            items,
        })
    }

    fn parse_map_item(&mut self, indent: usize, mut start: Vec<SourceToken>) -> BlockMapItem {
        self.bump_while(&mut start, |kind| {
            matches!(kind, TokenKind::Space | TokenKind::Anchor | TokenKind::Tag)
        });
        let mut sep = Vec::new();
        let (key, compact) = match self.peek_kind() {
            Some(TokenKind::ExplicitKey) => {
                start.push(self.bump());
                let key = self.parse_value(ValueContext::nested(indent), &mut start);
                // The value indicator follows on the key's line or starts a
                // later line at the map's column
                let save = self.pos;
                let mut trivia = Vec::new();
                self.bump_while(&mut trivia, TokenKind::is_trivia);
                match self.peek() {
                    Some(token)
                        if token.kind == TokenKind::Colon
                            && (!self.at_line_start(self.pos)
                                || self.column(token.offset()) == indent) =>
                    {
                        sep = trivia;
                        sep.push(self.bump());
                    }
                    _ => {
                        self.pos = save;
                        return BlockMapItem {
                            start,
                            key,
                            sep,
                            value: None,
                        };
                    }
                }
                (key, false)
            }
            Some(TokenKind::Colon) => {
                sep.push(self.bump());
                (None, false)
            }
            _ => {
                let key = self.parse_inline_node();
                self.bump_while(&mut sep, |kind| kind == TokenKind::Space);
                if self.peek_kind() != Some(TokenKind::Colon) {
                    return BlockMapItem {
                        start,
                        key,
                        sep,
                        value: None,
                    };
                }
                sep.push(self.bump());
                (key, true)
            }
        };
        let ctx = ValueContext {
            indent: as_signed(indent),
            seq_at_indent: true,
            compact,
        };
        let value = self.parse_value(ctx, &mut sep);
        BlockMapItem {
            start,
            key,
            sep,
            value,
        }
    }

    fn parse_block_seq(&mut self, indent: usize) -> CstNode {
        let offset = self.offset();
        let mut items = Vec::new();
        let mut start = Vec::new();
        loop {
            if self.peek_kind() == Some(TokenKind::SeqItem) {
                start.push(self.bump());
            }
            let value = self.parse_value(ValueContext::nested(indent), &mut start);
            items.push(BlockSeqItem { start, value });
            match self.continue_collection(indent, "sequence", |kind| kind == TokenKind::SeqItem) {
                Some(trivia) => start = trivia,
                None => break,
            }
        }
        CstNode::BlockSeq(BlockSeq {
            indent,
            offset,
            items,
        })
    }

    /// Collect the trivia before the next entry of the collection at
    /// `indent`, or consume nothing and return `None` when it ends.
    fn continue_collection(
        &mut self,
        indent: usize,
        name: &'static str,
        is_entry: fn(TokenKind) -> bool,
    ) -> Option<Vec<SourceToken>> {
        let save = self.pos;
        let mut trivia = Vec::new();
        self.bump_while(&mut trivia, TokenKind::is_trivia);
        if let Some(token) = self.peek()
            && is_entry(token.kind)
            && self.at_line_start(self.pos)
        {
            let column = self.column(token.offset());
            if column == indent {
                return Some(trivia);
            }
            if column > indent {
                self.error(token.offset(), ErrorKind::InvalidIndentation(name));
                return Some(trivia);
            }
        }
        self.pos = save;
        None
    }

    fn parse_block_scalar(&mut self, indent: isize) -> CstNode {
        let header = self.bump();
        let mut trivia = Vec::new();
        while let Some(kind) = self.peek_kind()
            && matches!(
                kind,
                TokenKind::Space | TokenKind::Comment | TokenKind::Error | TokenKind::Newline
            )
        {
            trivia.push(self.bump());
            if kind == TokenKind::Newline {
                break;
            }
        }
        let body = if self.peek_kind() == Some(TokenKind::BlockScalar) {
            self.bump()
        } else {
            // Input ended on the header line
            let end = trivia.last().unwrap_or(&header).span.end;
            SourceToken {
                kind: TokenKind::BlockScalar,
                source: String::new(),
                span: span_at(end, 0),
            }
        };
        CstNode::BlockScalar(BlockScalar {
            header,
            trivia,
            body,
            indent: usize::try_from(indent).unwrap_or_default(),
        })
    }
}
