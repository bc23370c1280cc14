// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Scalar tag selection and resolution.

use log::trace;

use crate::cst::{BlockScalar, FlowScalar};
use crate::error::{ErrorKind, YamlError};
use crate::schema::{ResolveFn, Resolved, STR_TAG};
use crate::span::{Span, span_at};
use crate::value::{Content, Node, NodeId, Scalar, ScalarStyle, Value};

use super::{BlockValue, Composer, Props, resolve_block_scalar, resolve_flow_scalar};

/// A scalar's string value before tag resolution.
struct RawScalar {
    value: String,
    style: ScalarStyle,
    range: Span,
    comment: Option<String>,
}

/// The resolve function and format of a selected tag.
type Resolver = (ResolveFn, Option<&'static str>);

impl Composer<'_> {
    pub(super) fn compose_flow_scalar(&mut self, scalar: &FlowScalar, props: Props) -> NodeId {
        let doc = &mut self.doc;
        let (value, style) = resolve_flow_scalar(scalar, &mut |error| doc.report(error));
        let raw = RawScalar {
            value,
            style,
            range: scalar.span,
            comment: None,
        };
        self.compose_scalar(raw, props)
    }

    pub(super) fn compose_block_scalar(&mut self, scalar: &BlockScalar, props: Props) -> NodeId {
        let doc = &mut self.doc;
        let BlockValue {
            value,
            style,
            comment,
        } = resolve_block_scalar(scalar, &mut |error| doc.report(error));
        let start = scalar.header.offset();
        let raw = RawScalar {
            value,
            style,
            range: span_at(start, scalar.body.span.end.saturating_sub(start)),
            comment,
        };
        self.compose_scalar(raw, props)
    }

    /// An empty plain scalar, resolved like any other so that `!!str` gives
    /// an empty string and no tag gives null.
    pub(super) fn compose_empty_scalar(&mut self, offset: usize, props: Props) -> NodeId {
        let raw = RawScalar {
            value: String::new(),
            style: ScalarStyle::Plain,
            range: span_at(offset, 0),
            comment: None,
        };
        self.compose_scalar(raw, props)
    }

    fn compose_scalar(&mut self, raw: RawScalar, props: Props) -> NodeId {
        let offset = raw.range.start;
        // An explicit tag that cannot be resolved falls back to a string
        let resolver = match props.tag.as_deref() {
            Some(name) => self.find_tag_by_name(&raw.value, name, offset),
            None if raw.style == ScalarStyle::Plain => self.find_tag_by_test(&raw.value),
            None => None,
        }
        .or_else(|| self.str_tag());

        let mut scalar = match resolver {
            Some((resolve, format)) => {
                let mut messages = Vec::new();
                let resolved = resolve(&raw.value, &mut |message| messages.push(message));
                for message in messages {
                    self.error(offset, ErrorKind::TagResolution(message));
                }
                let mut scalar = match resolved {
                    Ok(Resolved::Scalar(scalar)) => scalar,
                    Ok(Resolved::Value(value)) => Scalar::new(value),
                    Err(message) => {
                        self.error(offset, ErrorKind::TagResolution(message));
                        Scalar::new(Value::String(raw.value.clone()))
                    }
                };
                if format.is_some() {
                    scalar.format = format;
                }
                scalar
            }
            None => Scalar::new(Value::String(raw.value.clone())),
        };
        scalar.style = raw.style;
        trace!("scalar {:?} -> {:?}", raw.value, scalar.value);

        let mut node = Node::new(Content::Scalar(scalar), raw.range);
        node.comment = raw.comment;
        self.push_node(node, props)
    }

    /// Select a tag by explicit name.
    ///
    /// Tags of that name with a content test are only used when no other tag
    /// of that name exists, and then only if the test matches. A known tag is
    /// added to the schema on first use.
    fn find_tag_by_name(
        &mut self,
        value: &str,
        tag_name: &str,
        offset: usize,
    ) -> Option<Resolver> {
        let name = match tag_name {
            "!" => STR_TAG,
            name => name,
        };
        let mut with_test = Vec::new();
        for tag in self.schema.tags() {
            if tag.tag == name {
                if tag.default && tag.test.is_some() {
                    with_test.push(tag);
                } else {
                    return Some((tag.resolve, tag.format));
                }
            }
        }
        if let Some(tag) = with_test.into_iter().find(|tag| {
            tag.test
                .as_ref()
                .is_some_and(|test| test.is_match(value))
        }) {
            return Some((tag.resolve, tag.format));
        }
        if let Some(known) = self.schema.known_tag(name).cloned() {
            if self.schema.add_known_tag_once(&known) {
                trace!("added known tag {name} to the schema");
            }
            return Some((known.resolve, known.format));
        }
        let error = YamlError::at(offset, ErrorKind::UnresolvedTag(name.to_owned()));
        self.doc.report(if name == STR_TAG {
            error.into_warning()
        } else {
            error
        });
        None
    }

    /// Select the first default tag whose test matches a plain scalar.
    fn find_tag_by_test(&self, value: &str) -> Option<Resolver> {
        self.schema
            .tags()
            .iter()
            .find(|tag| tag.matches(value))
            .map(|tag| (tag.resolve, tag.format))
    }

    fn str_tag(&self) -> Option<Resolver> {
        self.schema
            .tags()
            .iter()
            .find(|tag| tag.tag == STR_TAG)
            .map(|tag| (tag.resolve, tag.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;
    use crate::document::Document;
    use crate::options::ParseOptions;
    use crate::schema::{INT_TAG, Schema, SchemaName, Tag};

    fn compose_with(src: &str, options: &ParseOptions) -> (Document, Schema) {
        let stream = parse(src);
        let mut schema = Schema::new(options);
        let Some(cst) = stream.documents.first() else {
            panic!("no document in {src:?}");
        };
        let doc = super::super::compose_document(cst, &mut schema, options);
        (doc, schema)
    }

    fn root_scalar(doc: &Document) -> Scalar {
        let Some(scalar) = doc.root().and_then(Node::scalar) else {
            panic!("expected a scalar root");
        };
        scalar.clone()
    }

    #[test]
    fn test_untagged_resolution() {
        let test_cases = [
            ("42", Value::Int(42), None),
            ("0x2A", Value::Int(42), Some("HEX")),
            ("'42'", Value::String("42".to_owned()), None),
            ("\"true\"", Value::String("true".to_owned()), None),
            ("true", Value::Bool(true), None),
            ("~", Value::Null, None),
            ("1e2", Value::Float(100.0), Some("EXP")),
            ("hello world", Value::String("hello world".to_owned()), None),
        ];
        for (src, expected, format) in test_cases {
            let (doc, _) = compose_with(src, &ParseOptions::default());
            assert!(doc.errors.is_empty(), "{src:?}: {:?}", doc.errors);
            let scalar = root_scalar(&doc);
            assert_eq!(scalar.value, expected, "{src:?}");
            assert_eq!(scalar.format, format, "{src:?}");
            assert!(doc.root().is_some_and(|node| node.tag.is_none()));
        }
    }

    #[test]
    fn test_explicit_tag_priority() {
        let test_cases = [
            ("!!str 42", Value::String("42".to_owned())),
            ("! 42", Value::String("42".to_owned())),
            ("!!int '42'", Value::Int(42)),
            ("!!int 0o17", Value::Int(15)),
            ("!!float 1.", Value::Float(1.0)),
            ("!!null ''", Value::Null),
        ];
        for (src, expected) in test_cases {
            let (doc, _) = compose_with(src, &ParseOptions::default());
            assert!(doc.errors.is_empty(), "{src:?}: {:?}", doc.errors);
            assert_eq!(root_scalar(&doc).value, expected, "{src:?}");
        }
    }

    #[test]
    fn test_unresolved_tags() {
        let (doc, _) = compose_with("!foo bar", &ParseOptions::default());
        assert_eq!(
            doc.errors.first().map(|err| &err.kind),
            Some(&ErrorKind::UnresolvedTag("!foo".to_owned()))
        );
        assert_eq!(root_scalar(&doc).value, Value::String("bar".to_owned()));
        assert_eq!(doc.root().and_then(|node| node.tag.as_deref()), Some("!foo"));

        let (doc, _) = compose_with("!foo 123", &ParseOptions::default());
        assert_eq!(root_scalar(&doc).value, Value::String("123".to_owned()));

        // An unmatched explicit int falls back to a string
        let (doc, _) = compose_with("!!int abc", &ParseOptions::default());
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(root_scalar(&doc).value, Value::String("abc".to_owned()));

        // The failsafe schema still resolves explicit strings
        let options = ParseOptions {
            schema: SchemaName::Failsafe,
            ..ParseOptions::default()
        };
        let (doc, _) = compose_with("!!str x", &options);
        assert!(doc.errors.is_empty());
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_known_tag_is_added_once() {
        let (doc, schema) = compose_with("[!!binary aGk=, !!binary aGk=]", &ParseOptions::default());
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let binary = schema
            .tags()
            .iter()
            .filter(|tag| tag.tag == crate::schema::BINARY_TAG)
            .count();
        assert_eq!(binary, 1);
        assert_eq!(doc.to_json(), Ok(serde_json::json!(["aGk=", "aGk="])));

        let options = ParseOptions {
            resolve_known_tags: false,
            ..ParseOptions::default()
        };
        let (doc, _) = compose_with("!!binary aGk=", &options);
        assert_eq!(doc.errors.len(), 1);
    }

    #[test]
    fn test_resolve_errors_keep_string() {
        let options = ParseOptions {
            custom_tags: vec![Tag::new("!fail", |_, on_error| {
                on_error("first".to_owned());
                Err("second".to_owned())
            })],
            ..ParseOptions::default()
        };
        let (doc, _) = compose_with("!fail text", &options);
        let messages: Vec<String> = doc.errors.iter().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["first".to_owned(), "second".to_owned()]);
        assert_eq!(root_scalar(&doc).value, Value::String("text".to_owned()));

        let (doc, _) = compose_with("!!int 99999999999999999999", &ParseOptions::default());
        assert!(doc.errors.is_empty());
        assert!(matches!(root_scalar(&doc).value, Value::Float(_)));
        assert!(Schema::default().tags().iter().any(|tag| tag.tag == INT_TAG));
    }

    #[test]
    fn test_json_schema() {
        let options = ParseOptions {
            schema: SchemaName::Json,
            ..ParseOptions::default()
        };
        let (doc, _) = compose_with("True", &options);
        assert_eq!(
            doc.errors.first().map(ToString::to_string).as_deref(),
            Some("Unresolved plain scalar \"True\"")
        );
        assert_eq!(root_scalar(&doc).value, Value::String("True".to_owned()));
    }
}
