// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Built-in tag tables.

use std::sync::OnceLock;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use regex::Regex;

use crate::value::{Scalar, Value};

use super::{
    BINARY_TAG, BOOL_TAG, FLOAT_TAG, INT_TAG, MERGE_TAG, NULL_TAG, Resolved, STR_TAG, Tag,
};

static CORE: OnceLock<Vec<Tag>> = OnceLock::new();
static JSON: OnceLock<Vec<Tag>> = OnceLock::new();

#[allow(
    clippy::expect_used,
    reason = "Patterns are constants exercised by the unit tests"
)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("built-in tag pattern must compile")
}

fn resolve_str(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    Ok(Value::String(value.to_owned()).into())
}

fn resolve_null(_: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    Ok(Value::Null.into())
}

fn resolve_bool(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    Ok(Value::Bool(matches!(value.as_bytes().first(), Some(b't' | b'T'))).into())
}

fn resolve_int(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    match value.parse::<i64>() {
        Ok(int) => Ok(Value::Int(int).into()),
        // Out of range for i64
        Err(_) => value
            .parse::<f64>()
            .map(|float| Value::Float(float).into())
            .map_err(|err| err.to_string()),
    }
}

fn resolve_radix(digits: &str, radix: u32) -> Result<Resolved, String> {
    i64::from_str_radix(digits, radix)
        .map(|int| Value::Int(int).into())
        .map_err(|err| format!("Invalid base-{radix} integer {digits}: {err}"))
}

fn resolve_oct(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    resolve_radix(value.get(2..).unwrap_or_default(), 8)
}

fn resolve_hex(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    resolve_radix(value.get(2..).unwrap_or_default(), 16)
}

fn resolve_special_float(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    let float = if value.ends_with(['n', 'N']) {
        f64::NAN
    } else if value.starts_with('-') {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    };
    Ok(Value::Float(float).into())
}

fn resolve_float(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    let float = value.parse::<f64>().map_err(|err| err.to_string())?;
    let mut scalar = Scalar::new(Value::Float(float));
    // Keep trailing zeros such as the ones in `1.50`
    if let Some(dot) = value.find('.')
        && value.ends_with('0')
    {
        scalar.min_fraction_digits = value.len() - dot - 1;
    }
    Ok(Resolved::Scalar(scalar))
}

fn resolve_exp(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    value
        .parse::<f64>()
        .map(|float| Value::Float(float).into())
        .map_err(|err| err.to_string())
}

fn resolve_unknown(value: &str, on_error: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    on_error(format!("Unresolved plain scalar {value:?}"));
    Ok(Value::String(value.to_owned()).into())
}

fn resolve_merge(_: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    Ok(Value::Merge.into())
}

fn resolve_binary(value: &str, _: &mut dyn FnMut(String)) -> Result<Resolved, String> {
    let compact: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    B64.decode(compact)
        .map(|bytes| Value::Bytes(bytes).into())
        .map_err(|err| format!("Invalid base64 in binary scalar: {err}"))
}

fn str_tag() -> Tag {
    Tag {
        default: true,
        ..Tag::new(STR_TAG, resolve_str)
    }
}

/// YAML 1.2 core schema tags, in resolution order.
pub fn core_tags() -> Vec<Tag> {
    CORE.get_or_init(|| {
        vec![
            str_tag(),
            Tag::new(NULL_TAG, resolve_null).with_test(pattern(r"^(?:~|[Nn]ull|NULL)?$")),
            Tag::new(BOOL_TAG, resolve_bool)
                .with_test(pattern(r"^(?:[Tt]rue|TRUE|[Ff]alse|FALSE)$")),
            Tag::new(INT_TAG, resolve_oct)
                .with_test(pattern(r"^0o[0-7]+$"))
                .with_format("OCT"),
            Tag::new(INT_TAG, resolve_int).with_test(pattern(r"^[-+]?[0-9]+$")),
            Tag::new(INT_TAG, resolve_hex)
                .with_test(pattern(r"^0x[0-9a-fA-F]+$"))
                .with_format("HEX"),
            Tag::new(FLOAT_TAG, resolve_special_float)
                .with_test(pattern(r"^[-+]?\.(?:inf|Inf|INF|nan|NaN|NAN)$")),
            Tag::new(FLOAT_TAG, resolve_exp)
                .with_test(pattern(
                    r"^[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)[eE][-+]?[0-9]+$",
                ))
                .with_format("EXP"),
            Tag::new(FLOAT_TAG, resolve_float)
                .with_test(pattern(r"^[-+]?(?:\.[0-9]+|[0-9]+\.[0-9]*)$")),
        ]
    })
    .clone()
}

/// JSON schema tags: strict scalars, anything else is an error.
pub fn json_tags() -> Vec<Tag> {
    JSON.get_or_init(|| {
        vec![
            str_tag(),
            Tag::new(NULL_TAG, resolve_null).with_test(pattern(r"^null$")),
            Tag::new(BOOL_TAG, resolve_bool).with_test(pattern(r"^(?:true|false)$")),
            Tag::new(INT_TAG, resolve_int).with_test(pattern(r"^-?(?:0|[1-9][0-9]*)$")),
            Tag::new(FLOAT_TAG, resolve_exp).with_test(pattern(
                r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?$",
            )),
            Tag::new("", resolve_unknown).with_test(pattern("^")),
        ]
    })
    .clone()
}

pub fn failsafe_tags() -> Vec<Tag> {
    vec![str_tag()]
}

/// The `<<` merge key tag.
pub fn merge_tag() -> Tag {
    Tag::new(MERGE_TAG, resolve_merge).with_test(pattern(r"^<<$"))
}

/// `!!binary`, base64 encoded bytes.
pub fn binary_tag() -> Tag {
    Tag::new(BINARY_TAG, resolve_binary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_plain(tags: &[Tag], value: &str) -> (Option<Resolved>, Vec<String>) {
        let mut messages = Vec::new();
        let resolved = tags
            .iter()
            .find(|tag| tag.matches(value))
            .map(|tag| (tag.resolve)(value, &mut |msg| messages.push(msg)));
        (resolved.and_then(Result::ok), messages)
    }

    fn value(resolved: Option<Resolved>) -> Option<Value> {
        match resolved? {
            Resolved::Value(value) => Some(value),
            Resolved::Scalar(scalar) => Some(scalar.value),
        }
    }

    #[test]
    fn test_core_resolution() {
        let tags = core_tags();
        let test_cases = [
            ("", Value::Null),
            ("~", Value::Null),
            ("NULL", Value::Null),
            ("True", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("0o17", Value::Int(15)),
            ("-42", Value::Int(-42)),
            ("+7", Value::Int(7)),
            ("0x1F", Value::Int(31)),
            ("1e3", Value::Float(1000.0)),
            ("-.inf", Value::Float(f64::NEG_INFINITY)),
            ("2.5", Value::Float(2.5)),
            ("99999999999999999999", Value::Float(1e20)),
        ];
        for (input, expected) in test_cases {
            let (resolved, messages) = resolve_plain(&tags, input);
            assert_eq!(value(resolved), Some(expected), "{input:?}");
            assert!(messages.is_empty());
        }

        // Strings are matched by no default tag
        for input in ["yes", "0x", "1.2.3", "null value", "TrUe"] {
            assert!(!tags.iter().any(|tag| tag.matches(input)), "{input:?}");
        }

        let (nan, _) = resolve_plain(&tags, ".NaN");
        assert!(matches!(value(nan), Some(Value::Float(f)) if f.is_nan()));
    }

    #[test]
    fn test_float_keeps_fraction_digits() {
        let tags = core_tags();
        let test_cases = [("1.50", 2), ("3.0", 1), ("2.5", 0), ("10.", 0)];
        for (input, digits) in test_cases {
            let (resolved, _) = resolve_plain(&tags, input);
            let Some(Resolved::Scalar(scalar)) = resolved else {
                panic!("{input:?} should resolve to a scalar");
            };
            assert_eq!(scalar.min_fraction_digits, digits, "{input:?}");
        }
    }

    #[test]
    fn test_json_resolution() {
        let tags = json_tags();
        let (resolved, messages) = resolve_plain(&tags, "true");
        assert_eq!(value(resolved), Some(Value::Bool(true)));
        assert!(messages.is_empty());

        let (resolved, messages) = resolve_plain(&tags, "True");
        assert_eq!(value(resolved), Some(Value::String("True".to_owned())));
        assert_eq!(messages, vec!["Unresolved plain scalar \"True\"".to_owned()]);
    }

    #[test]
    fn test_binary() {
        let tag = binary_tag();
        let resolved = (tag.resolve)("aGVs\n  bG8=", &mut |_| {});
        assert_eq!(resolved, Ok(Resolved::Value(Value::Bytes(b"hello".to_vec()))));
        assert!((tag.resolve)("not base64!", &mut |_| {}).is_err());
    }
}
