// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Span types for tracking source locations.

use chumsky::span::SimpleSpan;
use chumsky::span::Span as _;

/// A span representing a byte range in the source.
///
/// This is an alias for chumsky's `SimpleSpan`. The span is a half-open
/// range `[start, end)` of absolute byte offsets into the cumulative input.
pub type Span = SimpleSpan<usize>;

/// Build a span from a start offset and a length.
pub(crate) fn span_at(start: usize, len: usize) -> Span {
    Span::new((), start..start + len)
}

/// A 1-based line and column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Line index over a source text, for turning byte offsets into positions.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(src: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            src.bytes()
                .enumerate()
                .filter(|&(_, byte)| byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { line_starts }
    }

    /// Byte offset at which the line containing `offset` begins.
    pub fn line_start(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => self.line_starts.get(idx).copied().unwrap_or(0),
            Err(idx) => self
                .line_starts
                .get(idx.saturating_sub(1))
                .copied()
                .unwrap_or(0),
        }
    }

    /// 0-based column of `offset`, counted in bytes from the line start.
    pub fn column(&self, offset: usize) -> usize {
        offset - self.line_start(offset)
    }

    /// 1-based line/column of `offset`.
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        Position {
            line: line + 1,
            column: self.column(offset) + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_at() {
        let span = span_at(3, 4);
        assert_eq!((span.start, span.end), (3, 7));
    }

    #[test]
    fn test_source_map_positions() {
        let map = SourceMap::new("a: 1\n  b: 2\n\nc");
        let test_cases = [
            (0, 1, 1),
            (3, 1, 4),
            (5, 2, 1),
            (7, 2, 3),
            (12, 3, 1),
            (13, 4, 1),
        ];
        for (offset, line, column) in test_cases {
            assert_eq!(map.position(offset), Position { line, column }, "offset {offset}");
        }
        assert_eq!(map.column(7), 2);
        assert_eq!(map.line_start(9), 5);
    }
}
