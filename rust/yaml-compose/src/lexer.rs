// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Incremental, lossless YAML lexer.
//!
//! The lexer segments input into [`SourceToken`]s without interpreting them.
//! Concatenating the sources of all emitted tokens reproduces the input
//! exactly, and feeding the input in arbitrary chunks produces the same
//! tokens as feeding it all at once.
//!
//! The lexer is a value: [`Lexer::lex`] takes it by ownership, appends a chunk
//! and returns a [`Tokens`] iterator. Once the iterator is exhausted,
//! [`Tokens::into_lexer`] hands back the carried state (indentation, flow
//! depth and any input that could not yet be classified) for the next chunk.
//!
//! ```
//! use yaml_compose::{Lexer, TokenKind};
//!
//! let mut tokens = Lexer::new().lex("key: val", false);
//! let first: Vec<_> = tokens.by_ref().collect();
//! assert!(first.is_empty()); // the line may still grow
//!
//! let rest: Vec<_> = tokens.into_lexer().lex("ue\n", true).collect();
//! assert!(rest.iter().any(|t| t.kind == TokenKind::PlainScalar && t.source == "value"));
//! ```

use std::collections::VecDeque;

use log::trace;

use crate::span::span_at;
use crate::token::{SourceToken, TokenKind};

/// Where the lexer resumes on its next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerState {
    /// Between documents: directives, blank and comment lines.
    #[default]
    Stream,
    /// At the start of a line inside a document.
    LineStart,
    /// After a line's indentation, consuming block indicators.
    BlockStart,
    /// Dispatching the rest of a line in block context.
    Document,
    /// Dispatching inside a flow collection.
    Flow,
    QuotedScalar,
    BlockScalar,
    PlainScalar,
}

/// Incremental lexer state.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    state: LexerState,
    /// Unconsumed input, starting at absolute offset `offset`.
    buffer: String,
    pos: usize,
    offset: usize,
    at_end: bool,
    /// Set while waiting for more input.
    suspended: bool,
    indent: usize,
    /// Width consumed by block indicators since the line's indentation.
    more_indent: usize,
    /// Position of the last block indicator within `more_indent`.
    more_indent_mark: Option<usize>,
    /// Absolute offset at which the current line begins.
    line_start: usize,
    /// Column of the first node on the line, after block indicators.
    content_column: usize,
    /// Column of the implicit key whose value follows on this line.
    key_column: Option<usize>,
    flow_level: usize,
    pending: VecDeque<SourceToken>,
}

/// Pull iterator over the tokens of one [`Lexer::lex`] call.
#[derive(Debug)]
pub struct Tokens {
    lexer: Lexer,
}

impl Tokens {
    /// Recover the lexer to feed it the next chunk.
    ///
    /// Tokens that were produced but not yet pulled are kept and returned
    /// first by the next call.
    pub fn into_lexer(self) -> Lexer {
        self.lexer
    }
}

impl Iterator for Tokens {
    type Item = SourceToken;

    fn next(&mut self) -> Option<SourceToken> {
        loop {
            if let Some(token) = self.lexer.pending.pop_front() {
                return Some(token);
            }
            if !self.lexer.step() {
                return None;
            }
        }
    }
}

/// Tokenize a complete input.
pub fn tokenize(src: &str) -> Vec<SourceToken> {
    Lexer::new().lex(src, true).collect()
}

const fn is_empty(ch: Option<u8>) -> bool {
    matches!(ch, None | Some(b' ' | b'\n' | b'\r' | b'\t'))
}

const fn is_flow_char(ch: u8) -> bool {
    matches!(ch, b',' | b'[' | b']' | b'{' | b'}')
}

const fn is_not_identifier_char(ch: Option<u8>) -> bool {
    match ch {
        None => true,
        Some(ch) => is_flow_char(ch) || is_empty(Some(ch)),
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return the tokens it completes.
    ///
    /// Unless `is_final` is set, anything that could still be extended by
    /// more input is kept in the buffer and lexed by a later call.
    pub fn lex(mut self, chunk: &str, is_final: bool) -> Tokens {
        self.buffer.push_str(chunk);
        self.at_end = is_final;
        self.suspended = false;
        Tokens { lexer: self }
    }

    /// The state the lexer will resume in.
    pub fn state(&self) -> LexerState {
        self.state
    }

    /// Indentation column of the current line.
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Current flow collection nesting depth; 0 in block context.
    pub fn flow_level(&self) -> usize {
        self.flow_level
    }

    /// Input that has been received but not yet emitted as tokens.
    pub fn buffered(&self) -> &str {
        self.buffer.get(self.pos..).unwrap_or_default()
    }

    /// Run one state of the machine. Returns false once no more tokens can be
    /// produced from the current input.
    fn step(&mut self) -> bool {
        if self.suspended {
            return false;
        }
        if self.at_end && !self.has_chars(1) {
            self.discard_consumed();
            self.suspended = true;
            return false;
        }
        let next = match self.state {
            LexerState::Stream => self.parse_stream(),
            LexerState::LineStart => self.parse_line_start(),
            LexerState::BlockStart => self.parse_block_start(),
            LexerState::Document => self.parse_document(),
            LexerState::Flow => self.parse_flow_collection(),
            LexerState::QuotedScalar => self.parse_quoted_scalar(),
            LexerState::BlockScalar => self.parse_block_scalar(),
            LexerState::PlainScalar => self.parse_plain_scalar(),
        };
        match next {
            Some(state) => self.state = state,
            None => self.suspended = true,
        }
        true
    }

    fn parse_stream(&mut self) -> Option<LexerState> {
        let Some(end) = self.line_end() else {
            return self.set_next(LexerState::Stream);
        };
        if self.ch(0) == Some(b'%') {
            let line = self.bytes().get(self.pos..end).unwrap_or_default();
            let mut dir_end = line
                .windows(2)
                .position(|pair| pair == b" #")
                .unwrap_or(line.len());
            while dir_end > 0 && line.get(dir_end - 1) == Some(&b' ') {
                dir_end -= 1;
            }
            self.push_count(dir_end, TokenKind::Directive);
            self.push_spaces();
            self.push_to_index(end, TokenKind::Comment);
            self.push_newline();
            return Some(LexerState::Stream);
        }
        if self.at_line_end() {
            self.push_spaces();
            self.push_to_index(end, TokenKind::Comment);
            self.push_newline();
            return Some(LexerState::Stream);
        }
        self.push_marker(TokenKind::DocumentStart);
        Some(LexerState::LineStart)
    }

    fn parse_line_start(&mut self) -> Option<LexerState> {
        if self.line_end().is_none() {
            return self.set_next(LexerState::LineStart);
        }
        self.line_start = self.offset + self.pos;
        if let Some(marker @ (b'-' | b'.')) = self.ch(0)
            && self.doc_marker_at(self.pos) == Some(true)
        {
            self.push_count(3, TokenKind::DocumentMarker);
            if marker == b'.' {
                return Some(LexerState::Stream);
            }
            self.indent = 0;
            self.reset_more_indent();
            return Some(LexerState::Document);
        }
        self.indent = self.push_spaces();
        self.reset_more_indent();
        Some(LexerState::BlockStart)
    }

    fn parse_block_start(&mut self) -> Option<LexerState> {
        if self.line_end().is_none() {
            return self.set_next(LexerState::BlockStart);
        }
        loop {
            let kind = match self.ch(0) {
                Some(b'-') => TokenKind::SeqItem,
                Some(b'?') => TokenKind::ExplicitKey,
                Some(b':') => TokenKind::Colon,
                _ => break,
            };
            if !is_empty(self.ch(1)) {
                break;
            }
            self.more_indent_mark = Some(self.more_indent);
            let n = self.push_count(1, kind) + self.push_spaces();
            self.more_indent += n;
        }
        self.content_column = self.offset + self.pos - self.line_start;
        // Nested indicators on one line each open a deeper level
        if self.more_indent > 2
            && let Some(mark) = self.more_indent_mark
            && mark > 0
        {
            self.indent += mark;
        }
        Some(LexerState::Document)
    }

    fn parse_document(&mut self) -> Option<LexerState> {
        let Some(end) = self.line_end() else {
            return self.set_next(LexerState::Document);
        };
        self.push_separator();
        self.push_indicators();
        let ch = if self.pos < end { self.ch(0) } else { None };
        match ch {
            None | Some(b'#') => {
                self.push_to_index(end, TokenKind::Comment);
                self.push_newline();
                Some(LexerState::LineStart)
            }
            Some(b'{' | b'[') => {
                self.push_count(1, TokenKind::FlowStart);
                self.flow_level = 1;
                Some(LexerState::Flow)
            }
            Some(b'}' | b']') => {
                // Close without an open collection; depth stays at 0
                self.push_count(1, TokenKind::Error);
                Some(LexerState::Document)
            }
            Some(b'"' | b'\'') => Some(LexerState::QuotedScalar),
            Some(b'|' | b'>') => {
                self.push_until(is_empty, TokenKind::BlockScalarHeader);
                self.push_separator();
                let kind = if self.ch(0) == Some(b'#') {
                    TokenKind::Comment
                } else {
                    TokenKind::Error
                };
                self.push_to_index(end, kind);
                self.push_newline();
                Some(LexerState::BlockScalar)
            }
            Some(_) => Some(LexerState::PlainScalar),
        }
    }

    fn parse_flow_collection(&mut self) -> Option<LexerState> {
        let end = loop {
            if self.push_newline() > 0 {
                continue;
            }
            let Some(end) = self.line_end() else {
                return self.set_next(LexerState::Flow);
            };
            if self.push_separator() == 0 {
                break end;
            }
        };
        while self.ch(0) == Some(b',') {
            self.push_count(1, TokenKind::Comma);
            self.push_separator();
        }
        self.push_indicators();
        let ch = if self.pos < end { self.ch(0) } else { None };
        match ch {
            None | Some(b'#') => {
                self.push_to_index(end, TokenKind::Comment);
                self.push_newline();
                Some(LexerState::Flow)
            }
            Some(b'{' | b'[') => {
                self.push_count(1, TokenKind::FlowStart);
                self.flow_level += 1;
                Some(LexerState::Flow)
            }
            // A separator after properties or an indicator
            Some(b',') => Some(LexerState::Flow),
            Some(b'}' | b']') => {
                self.push_count(1, TokenKind::FlowEnd);
                self.flow_level = self.flow_level.saturating_sub(1);
                Some(self.after_scalar())
            }
            Some(b'"' | b'\'') => Some(LexerState::QuotedScalar),
            Some(_) => Some(LexerState::PlainScalar),
        }
    }

    fn parse_quoted_scalar(&mut self) -> Option<LexerState> {
        let Some(end) = self.scan_quoted() else {
            return self.set_next(LexerState::QuotedScalar);
        };
        self.push_to_index(end, TokenKind::QuotedScalar);
        Some(self.after_scalar())
    }

    fn parse_block_scalar(&mut self) -> Option<LexerState> {
        let Some(end) = self.scan_block_scalar() else {
            return self.set_next(LexerState::BlockScalar);
        };
        // The body token is emitted even when empty
        let len = end - self.pos;
        self.push_token(TokenKind::BlockScalar, len);
        Some(LexerState::LineStart)
    }

    fn parse_plain_scalar(&mut self) -> Option<LexerState> {
        let Some(end) = self.scan_plain() else {
            return self.set_next(LexerState::PlainScalar);
        };
        if end > self.pos {
            self.push_to_index(end, TokenKind::PlainScalar);
        } else {
            // Nothing can start a scalar here; consume one character to make progress
            let len = self
                .buffered()
                .chars()
                .next()
                .map_or(0, char::len_utf8);
            self.push_count(len, TokenKind::Error);
        }
        Some(self.after_scalar())
    }

    /// End offset (exclusive) of a quoted scalar starting at `pos`.
    fn scan_quoted(&self) -> Option<usize> {
        let bytes = self.bytes();
        let quote = *bytes.get(self.pos)?;
        let mut search = self.pos + 1;
        loop {
            let Some(found) = bytes
                .get(search..)
                .and_then(|rest| rest.iter().position(|&b| b == quote))
            else {
                // Unterminated: the rest of the input is the scalar
                return self.at_end.then_some(bytes.len());
            };
            let end = search + found;
            if quote == b'\'' {
                match bytes.get(end + 1) {
                    Some(b'\'') => {
                        search = end + 2;
                        continue;
                    }
                    None if !self.at_end => return None,
                    _ => return Some(end + 1),
                }
            }
            let escapes = bytes
                .get(self.pos + 1..end)
                .unwrap_or_default()
                .iter()
                .rev()
                .take_while(|&&b| b == b'\\')
                .count();
            if escapes % 2 == 0 {
                return Some(end + 1);
            }
            search = end + 1;
        }
    }

    /// End offset of a block scalar body starting at `pos`.
    fn scan_block_scalar(&self) -> Option<usize> {
        let bytes = self.bytes();
        let required = self.required_indent();
        let mut line_start = self.pos;
        loop {
            if line_start >= bytes.len() {
                return self.at_end.then_some(bytes.len());
            }
            let indent = bytes
                .get(line_start..)
                .unwrap_or_default()
                .iter()
                .take_while(|&&b| b == b' ')
                .count();
            let blank = match bytes.get(line_start + indent) {
                None if !self.at_end => return None,
                None | Some(b'\n') => true,
                Some(b'\r') => match bytes.get(line_start + indent + 1) {
                    None if !self.at_end => return None,
                    next => next == Some(&b'\n'),
                },
                Some(_) => false,
            };
            if !blank {
                if indent < required {
                    return Some(line_start);
                }
                if indent == 0 && self.doc_marker_at(line_start)? {
                    return Some(line_start);
                }
            }
            match bytes
                .get(line_start..)
                .and_then(|rest| rest.iter().position(|&b| b == b'\n'))
            {
                Some(nl) => line_start += nl + 1,
                None => return self.at_end.then_some(bytes.len()),
            }
        }
    }

    /// End offset of a plain scalar starting at `pos`, excluding trailing
    /// whitespace.
    fn scan_plain(&self) -> Option<usize> {
        let mut end = self.scan_plain_raw()?;
        while end > self.pos && is_empty(self.bytes().get(end - 1).copied()) {
            end -= 1;
        }
        Some(end)
    }

    fn scan_plain_raw(&self) -> Option<usize> {
        let bytes = self.bytes();
        let in_flow = self.flow_level > 0;
        let required = self.required_indent();
        let mut i = self.pos;
        loop {
            let Some(&ch) = bytes.get(i) else {
                return self.at_end.then_some(i);
            };
            if ch == b'\n' {
                if self.doc_marker_at(i + 1)? {
                    return Some(self.trim_cr(i));
                }
                if required > 0 {
                    let indent = bytes
                        .get(i + 1..)
                        .unwrap_or_default()
                        .iter()
                        .take_while(|&&b| b == b' ')
                        .count();
                    if i + 1 + indent >= bytes.len() && !self.at_end {
                        return None;
                    }
                    if indent < required {
                        return Some(self.trim_cr(i));
                    }
                    i += indent + 1;
                    continue;
                }
            }
            let next = bytes.get(i + 1).copied();
            let needs_next = ch == b':' || is_empty(Some(ch));
            if needs_next && next.is_none() && !self.at_end {
                return None;
            }
            if ch == b':' {
                if is_empty(next) || (in_flow && next == Some(b',')) {
                    return Some(i);
                }
            } else if is_empty(Some(ch)) {
                if next == Some(b'#') || (in_flow && next.is_some_and(is_flow_char)) {
                    return Some(i);
                }
            } else if in_flow && is_flow_char(ch) {
                return Some(i);
            }
            i += 1;
        }
    }

    /// Step back over a `\r` that pairs with the `\n` at `i`.
    fn trim_cr(&self, i: usize) -> usize {
        if i > self.pos && self.bytes().get(i - 1) == Some(&b'\r') {
            i - 1
        } else {
            i
        }
    }

    /// Whether a `---` or `...` marker starts at `idx`, or `None` if more
    /// input is needed to tell.
    fn doc_marker_at(&self, idx: usize) -> Option<bool> {
        let bytes = self.bytes();
        if idx + 4 > bytes.len() && !self.at_end {
            return None;
        }
        let marker = bytes.get(idx..idx + 3);
        let is_marker = matches!(marker, Some(b"---" | b"...")) && is_empty(bytes.get(idx + 3).copied());
        Some(is_marker)
    }

    /// Consume anchors, tags, aliases and boundary indicators at `pos`.
    fn push_indicators(&mut self) -> usize {
        let mut n = 0;
        loop {
            match self.ch(0) {
                Some(ch @ (b'!' | b'&' | b'*')) => {
                    let kind = match ch {
                        b'!' => TokenKind::Tag,
                        b'&' => TokenKind::Anchor,
                        _ => TokenKind::Alias,
                    };
                    n += self.push_until(is_not_identifier_char, kind);
                    n += self.push_separator();
                }
                Some(ch @ (b':' | b'?' | b'-')) => {
                    let next = self.ch(1);
                    let in_flow = self.flow_level > 0;
                    let boundary = is_empty(next)
                        || (in_flow && ch == b':' && matches!(next, Some(b',' | b']' | b'}')));
                    if !boundary {
                        return n;
                    }
                    let kind = match ch {
                        b':' => TokenKind::Colon,
                        b'?' => TokenKind::ExplicitKey,
                        _ if in_flow => TokenKind::Error,
                        _ => TokenKind::SeqItem,
                    };
                    if kind == TokenKind::Colon && !in_flow {
                        self.key_column = Some(self.content_column);
                    }
                    self.more_indent += 2;
                    n += self.push_count(1, kind);
                    n += self.push_separator();
                }
                _ => return n,
            }
        }
    }

    fn after_scalar(&self) -> LexerState {
        if self.flow_level > 0 {
            LexerState::Flow
        } else {
            LexerState::Document
        }
    }

    /// Minimum indentation of a continuation line of the current node.
    fn required_indent(&self) -> usize {
        if let Some(column) = self.key_column {
            // A map value ends where the next sibling key may start
            column + 1
        } else if self.indent > 0 {
            self.indent + 1
        } else {
            usize::from(self.more_indent > 0)
        }
    }

    fn reset_more_indent(&mut self) {
        self.more_indent = 0;
        self.more_indent_mark = None;
        self.content_column = 0;
        self.key_column = None;
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn ch(&self, n: usize) -> Option<u8> {
        self.bytes().get(self.pos + n).copied()
    }

    fn has_chars(&self, n: usize) -> bool {
        self.pos + n <= self.buffer.len()
    }

    /// End of the current line, excluding its line break, or `None` if the
    /// line may still be incomplete.
    fn line_end(&self) -> Option<usize> {
        let bytes = self.bytes();
        let Some(nl) = bytes
            .get(self.pos..)
            .and_then(|rest| rest.iter().position(|&b| b == b'\n'))
        else {
            return self.at_end.then_some(bytes.len());
        };
        let end = self.pos + nl;
        if end > self.pos && bytes.get(end - 1) == Some(&b'\r') {
            Some(end - 1)
        } else {
            Some(end)
        }
    }

    fn at_line_end(&self) -> bool {
        let bytes = self.bytes();
        let mut i = self.pos;
        while bytes.get(i) == Some(&b' ') {
            i += 1;
        }
        match bytes.get(i) {
            None | Some(b'#' | b'\n') => true,
            Some(b'\r') => bytes.get(i + 1) == Some(&b'\n'),
            Some(_) => false,
        }
    }

    /// Retain the unconsumed input and suspend until the next chunk.
    fn set_next(&mut self, state: LexerState) -> Option<LexerState> {
        self.discard_consumed();
        self.state = state;
        trace!(
            "lexer suspended in {state:?} with {} bytes buffered",
            self.buffer.len()
        );
        None
    }

    fn discard_consumed(&mut self) {
        self.buffer.drain(..self.pos.min(self.buffer.len()));
        self.offset += self.pos;
        self.pos = 0;
    }

    fn push_token(&mut self, kind: TokenKind, len: usize) {
        let start = self.pos;
        let source = self
            .buffer
            .get(start..start + len)
            .unwrap_or_default()
            .to_owned();
        self.pending.push_back(SourceToken {
            kind,
            source,
            span: span_at(self.offset + start, len),
        });
        self.pos += len;
    }

    fn push_marker(&mut self, kind: TokenKind) {
        self.push_token(kind, 0);
    }

    fn push_count(&mut self, n: usize, kind: TokenKind) -> usize {
        let n = n.min(self.buffer.len().saturating_sub(self.pos));
        if n > 0 {
            self.push_token(kind, n);
        }
        n
    }

    fn push_to_index(&mut self, idx: usize, kind: TokenKind) -> usize {
        self.push_count(idx.saturating_sub(self.pos), kind)
    }

    fn push_until(&mut self, stop: fn(Option<u8>) -> bool, kind: TokenKind) -> usize {
        let mut i = self.pos;
        while !stop(self.bytes().get(i).copied()) {
            i += 1;
        }
        self.push_to_index(i, kind)
    }

    fn push_spaces(&mut self) -> usize {
        let n = self
            .bytes()
            .get(self.pos..)
            .unwrap_or_default()
            .iter()
            .take_while(|&&b| b == b' ')
            .count();
        self.push_count(n, TokenKind::Space)
    }

    /// Spaces and tabs between tokens within a line.
    fn push_separator(&mut self) -> usize {
        let n = self
            .bytes()
            .get(self.pos..)
            .unwrap_or_default()
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        self.push_count(n, TokenKind::Space)
    }

    fn push_newline(&mut self) -> usize {
        match (self.ch(0), self.ch(1)) {
            (Some(b'\n'), _) => self.push_count(1, TokenKind::Newline),
            (Some(b'\r'), Some(b'\n')) => self.push_count(2, TokenKind::Newline),
            _ => 0,
        }
    }
}
