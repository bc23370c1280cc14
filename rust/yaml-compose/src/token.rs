// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Token types produced by the lexer.

use std::fmt;

use crate::span::Span;

/// The syntactic role of a source token.
///
/// The lexer only segments input; none of these kinds carry a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Zero-length marker emitted when a document starts without `---`.
    DocumentStart,
    /// `%YAML 1.2`, `%TAG ! tag:...` and other directive bodies.
    Directive,
    /// `---` or `...`
    DocumentMarker,
    /// A run of spaces (and, between tokens, tabs).
    Space,
    /// `\n` or `\r\n`
    Newline,
    /// `# ...` up to but excluding the line break.
    Comment,
    /// `&name`
    Anchor,
    /// `!tag`, `!!tag`, `!h!tag` or `!<uri>`
    Tag,
    /// `*name`
    Alias,
    /// A single- or double-quoted scalar including its quotes.
    QuotedScalar,
    /// `|` or `>` with its indentation and chomping indicators.
    BlockScalarHeader,
    /// The lines of a block scalar body.
    BlockScalar,
    /// An unquoted scalar, possibly spanning several lines.
    PlainScalar,
    /// `{` or `[`
    FlowStart,
    /// `}` or `]` closing a flow collection.
    FlowEnd,
    /// `,`
    Comma,
    /// `:` map value indicator
    Colon,
    /// `?` explicit key indicator
    ExplicitKey,
    /// `-` block sequence entry indicator
    SeqItem,
    /// A character that is not valid where it appears.
    Error,
}

impl TokenKind {
    /// Whitespace, line breaks and comments carry no content.
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::Space | Self::Newline | Self::Comment)
    }

    /// Node properties, which may precede any node.
    pub const fn is_property(self) -> bool {
        matches!(self, Self::Anchor | Self::Tag)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DocumentStart => "document start",
            Self::Directive => "directive",
            Self::DocumentMarker => "document marker",
            Self::Space => "space",
            Self::Newline => "newline",
            Self::Comment => "comment",
            Self::Anchor => "anchor",
            Self::Tag => "tag",
            Self::Alias => "alias",
            Self::QuotedScalar => "quoted scalar",
            Self::BlockScalarHeader => "block scalar header",
            Self::BlockScalar => "block scalar",
            Self::PlainScalar => "plain scalar",
            Self::FlowStart => "flow collection start",
            Self::FlowEnd => "flow collection end",
            Self::Comma => "comma",
            Self::Colon => "map value indicator",
            Self::ExplicitKey => "explicit key indicator",
            Self::SeqItem => "sequence item indicator",
            Self::Error => "invalid character",
        };
        f.write_str(name)
    }
}

/// An exact slice of the cumulative lexer input.
///
/// The `span` is measured in bytes from the start of the first chunk ever fed
/// to the lexer, so tokens from different `lex` calls never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceToken {
    pub kind: TokenKind,
    pub source: String,
    pub span: Span,
}

impl SourceToken {
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// First character of the token source, if any.
    pub fn first_char(&self) -> Option<char> {
        self.source.chars().next()
    }
}

impl fmt::Display for SourceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.source)
    }
}

#[cfg(test)]
mod tests {
    use chumsky::span::Span as _;

    use super::*;

    #[test]
    fn test_token_display() {
        let token = SourceToken {
            kind: TokenKind::Anchor,
            source: "&a".to_owned(),
            span: Span::new((), 0..2),
        };
        assert_eq!(token.to_string(), "anchor \"&a\"");
        assert_eq!(token.first_char(), Some('&'));
    }

    #[test]
    fn test_trivia_and_properties() {
        assert!(TokenKind::Comment.is_trivia());
        assert!(TokenKind::Newline.is_trivia());
        assert!(!TokenKind::PlainScalar.is_trivia());
        assert!(TokenKind::Tag.is_property());
        assert!(!TokenKind::Alias.is_property());
    }
}
