// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! String values of plain and quoted scalars.

use crate::cst::{FlowScalar, FlowScalarStyle, is_quote_closed};
use crate::error::{ErrorKind, OnError, YamlError};
use crate::value::ScalarStyle;

/// Fold the lines of a multi-line flow scalar: a single line break becomes a
/// space, `n` empty lines become `n` line breaks.
pub(crate) fn fold_lines(source: &str) -> String {
    let mut lines = source.split('\n');
    let first = lines.next().unwrap_or_default();
    let rest: Vec<&str> = lines.collect();
    let Some((last, middle)) = rest.split_last() else {
        return source.to_owned();
    };
    let mut value = first.trim_end_matches('\r').trim_end_matches([' ', '\t']).to_owned();
    let mut sep = " ";
    for line in middle {
        let content = line.trim_end_matches('\r').trim_matches([' ', '\t']);
        if content.is_empty() {
            if sep == "\n" {
                value.push('\n');
            } else {
                sep = "\n";
            }
        } else {
            value.push_str(sep);
            value.push_str(content);
            sep = " ";
        }
    }
    value.push_str(sep);
    value.push_str(last.trim_start_matches([' ', '\t']));
    value
}

/// The value and style of a plain or quoted scalar.
pub fn resolve_flow_scalar(scalar: &FlowScalar, on_error: &mut OnError<'_>) -> (String, ScalarStyle) {
    match scalar.style {
        FlowScalarStyle::Plain => (fold_lines(&scalar.source), ScalarStyle::Plain),
        FlowScalarStyle::SingleQuoted => (
            fold_lines(quoted_body(&scalar.source, '\'')).replace("''", "'"),
            ScalarStyle::SingleQuoted,
        ),
        FlowScalarStyle::DoubleQuoted => (
            double_quoted_value(scalar, on_error),
            ScalarStyle::DoubleQuoted,
        ),
    }
}

/// Source between the quotes; the closing quote may be missing.
fn quoted_body(source: &str, quote: char) -> &str {
    let body = source.strip_prefix(quote).unwrap_or(source);
    if is_quote_closed(source) {
        body.strip_suffix(quote).unwrap_or(body)
    } else {
        body
    }
}

fn escape(ch: char) -> Option<char> {
    let escaped = match ch {
        '0' => '\0',
        'a' => '\x07',
        'b' => '\x08',
        'e' => '\x1b',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' | '\t' => '\t',
        'v' => '\x0b',
        'N' => '\u{85}',
        '_' => '\u{a0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        ' ' | '"' | '/' | '\\' => ch,
        _ => return None,
    };
    Some(escaped)
}

fn double_quoted_value(scalar: &FlowScalar, on_error: &mut OnError<'_>) -> String {
    let body = quoted_body(&scalar.source, '"');
    // Offset of the body within the token
    let base = scalar.span.start + 1;
    let chars: Vec<(usize, char)> = body.char_indices().collect();
    let at = |i: usize| chars.get(i).map(|&(_, ch)| ch);
    let is_blank = |ch: Option<char>| matches!(ch, Some(' ' | '\t'));
    let is_break = |i: usize| at(i) == Some('\n') || (at(i) == Some('\r') && at(i + 1) == Some('\n'));

    let mut value = String::with_capacity(body.len());
    let mut i = 0;
    while let Some(&(offset, ch)) = chars.get(i) {
        match ch {
            '\r' if at(i + 1) == Some('\n') => {}
            '\n' => {
                // Fold the line break and skip the next line's indentation
                let mut breaks = 0;
                while let Some(next) = at(i + 1) {
                    match next {
                        ' ' | '\t' => {}
                        '\n' => breaks += 1,
                        '\r' if at(i + 2) == Some('\n') => {}
                        _ => break,
                    }
                    i += 1;
                }
                if breaks == 0 {
                    value.push(' ');
                } else {
                    value.extend(std::iter::repeat_n('\n', breaks));
                }
            }
            '\\' => {
                i += 1;
                if let Some(escaped) = at(i).and_then(escape) {
                    value.push(escaped);
                    i += 1;
                    continue;
                }
                match at(i) {
                    Some('\n' | '\r') if is_break(i) => {
                        // Escaped line break: join the lines without a space
                        if at(i) == Some('\r') {
                            i += 1;
                        }
                        while is_blank(at(i + 1)) {
                            i += 1;
                        }
                    }
                    Some(kind @ ('x' | 'u' | 'U')) => {
                        let len = match kind {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let digits: String = chars
                            .get(i + 1..)
                            .unwrap_or_default()
                            .iter()
                            .take(len)
                            .map(|&(_, ch)| ch)
                            .collect();
                        let decoded = (digits.len() == len
                            && digits.chars().all(|ch| ch.is_ascii_hexdigit()))
                        .then(|| u32::from_str_radix(&digits, 16).ok())
                        .flatten()
                        .and_then(char::from_u32);
                        match decoded {
                            Some(decoded) => value.push(decoded),
                            None => {
                                let raw = format!("\\{kind}{digits}");
                                on_error(YamlError::at(base + offset, ErrorKind::InvalidEscape(raw.clone())));
                                value.push_str(&raw);
                            }
                        }
                        i += digits.chars().count();
                    }
                    next => {
                        let mut raw = String::from('\\');
                        raw.extend(next);
                        on_error(YamlError::at(base + offset, ErrorKind::InvalidEscape(raw.clone())));
                        value.push_str(&raw);
                    }
                }
            }
            ' ' | '\t' => {
                // Trailing whitespace before a line break is dropped
                let start = i;
                while is_blank(at(i + 1)) {
                    i += 1;
                }
                if !is_break(i + 1) {
                    value.extend(chars.get(start..=i).unwrap_or_default().iter().map(|&(_, ch)| ch));
                }
            }
            _ => value.push(ch),
        }
        i += 1;
    }
    value
}

#[cfg(test)]
mod tests {
    use chumsky::span::Span as _;

    use super::*;
    use crate::span::Span;

    fn scalar(style: FlowScalarStyle, source: &str) -> FlowScalar {
        FlowScalar {
            style,
            source: source.to_owned(),
            span: Span::new((), 0..source.len()),
        }
    }

    fn resolve(style: FlowScalarStyle, source: &str) -> (String, Vec<YamlError>) {
        let mut errors = Vec::new();
        let (value, _) = resolve_flow_scalar(&scalar(style, source), &mut |err| errors.push(err));
        (value, errors)
    }

    #[test]
    fn test_fold_lines() {
        let test_cases = [
            ("plain", "plain"),
            ("a\nb", "a b"),
            ("a  \n   b", "a b"),
            ("a\n\nb", "a\nb"),
            ("a\n\n\nb", "a\n\nb"),
            ("a\r\n  b", "a b"),
            ("a\n \t \nb", "a\nb"),
        ];
        for (source, expected) in test_cases {
            assert_eq!(fold_lines(source), expected, "{source:?}");
        }
    }

    #[test]
    fn test_single_quoted() {
        let test_cases = [
            ("'it''s'", "it's"),
            ("''", ""),
            ("'a\n  b '", "a b "),
            ("'open", "open"),
        ];
        for (source, expected) in test_cases {
            let (value, errors) = resolve(FlowScalarStyle::SingleQuoted, source);
            assert_eq!(value, expected, "{source:?}");
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn test_double_quoted() {
        let test_cases = [
            (r#""a\tb""#, "a\tb"),
            (r#""\x41é\U0001F600""#, "Aé😀"),
            (r#""quote \" slash \/ back \\""#, "quote \" slash / back \\"),
            (r#""\N\_\L\P""#, "\u{85}\u{a0}\u{2028}\u{2029}"),
            ("\"a \n  b\"", "a b"),
            ("\"a\n\n  b\"", "a\nb"),
            ("\"a\\\n   b\"", "ab"),
            ("\"a\\\r\n   b\"", "ab"),
            ("\"  lead\"", "  lead"),
            ("\"open", "open"),
        ];
        for (source, expected) in test_cases {
            let (value, errors) = resolve(FlowScalarStyle::DoubleQuoted, source);
            assert_eq!(value, expected, "{source:?}");
            assert!(errors.is_empty(), "{source:?}: {errors:?}");
        }
    }

    #[test]
    fn test_invalid_escapes() {
        let test_cases = [
            (r#""a\qb""#, "a\\qb", "\\q", 2),
            (r#""\x4""#, "\\x4", "\\x4", 1),
            (r#""\uZZZZ""#, "\\uZZZZ", "\\uZZZZ", 1),
        ];
        for (source, expected, raw, offset) in test_cases {
            let (value, errors) = resolve(FlowScalarStyle::DoubleQuoted, source);
            assert_eq!(value, expected, "{source:?}");
            assert_eq!(errors.len(), 1, "{source:?}");
            let error = errors.first();
            assert_eq!(error.map(|e| &e.kind), Some(&ErrorKind::InvalidEscape(raw.to_owned())));
            assert_eq!(error.map(YamlError::offset), Some(offset));
        }
    }
}
