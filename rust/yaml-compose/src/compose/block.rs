// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Block mapping and sequence composition.

use crate::cst::{BlockMap, BlockSeq, CstNode, FlowItem};
use crate::error::ErrorKind;
use crate::schema::{MAP_TAG, SEQ_TAG};
use crate::span::Span;
use crate::token::TokenKind;
use crate::value::{Content, Node, NodeId, Pair};

use super::{Composer, Props};

/// Whether a node spans more than one line, which an implicit key may not.
fn is_multiline(node: &CstNode) -> bool {
    match node {
        CstNode::Scalar(scalar) => scalar.source.contains('\n'),
        CstNode::Alias(_) => false,
        CstNode::FlowCollection(collection) => collection.items.iter().any(|item| match item {
            FlowItem::Token(token) => token.kind == TokenKind::Newline,
            FlowItem::Node(node) => is_multiline(node),
        }),
        CstNode::BlockScalar(_) | CstNode::BlockMap(_) | CstNode::BlockSeq(_) => true,
    }
}

impl Composer<'_> {
    pub(super) fn compose_block_map(&mut self, map: &BlockMap, range: Span, props: Props) -> NodeId {
        self.check_collection_tag(&props, MAP_TAG, range.start);
        let id = self.push_node(Node::new(Content::Map(Vec::new()), range), props);

        let mut pairs = Vec::with_capacity(map.items.len());
        let mut seen_keys = Vec::new();
        for item in &map.items {
            let key_props = self.props(&item.start);
            let explicit = key_props.explicit_key;
            let key_offset = item
                .key
                .as_ref()
                .map_or_else(|| key_props.end.unwrap_or(map.offset), CstNode::offset);
            let key = match &item.key {
                Some(node) => Some(self.compose_node(node, key_props)),
                None => self.compose_empty(key_offset, key_props),
            };

            let has_colon = item.sep.iter().any(|token| token.kind == TokenKind::Colon);
            if !explicit {
                if !has_colon {
                    self.error(key_offset, ErrorKind::ImplicitKeyWithoutValue);
                } else if item.key.as_ref().is_some_and(is_multiline) {
                    self.error(key_offset, ErrorKind::MultilineImplicitKey);
                }
            }

            let value_props = self.props(&item.sep);
            let value_offset = value_props.end.unwrap_or(key_offset);
            let value = match &item.value {
                Some(node) => Some(self.compose_node(node, value_props)),
                None => self.compose_empty(value_offset, value_props),
            };
            self.check_duplicate_key(&mut seen_keys, key);
            pairs.push(Pair { key, value });
        }

        self.set_content(id, Content::Map(pairs), range);
        id
    }

    pub(super) fn compose_block_seq(&mut self, seq: &BlockSeq, range: Span, props: Props) -> NodeId {
        self.check_collection_tag(&props, SEQ_TAG, range.start);
        let id = self.push_node(Node::new(Content::Seq(Vec::new()), range), props);

        let mut items = Vec::with_capacity(seq.items.len());
        for item in &seq.items {
            let props = self.props(&item.start);
            let offset = props.end.unwrap_or(seq.offset);
            let value = match &item.value {
                Some(node) => self.compose_node(node, props),
                None => self.compose_empty_scalar(offset, props),
            };
            items.push(value);
        }

        self.set_content(id, Content::Seq(items), range);
        id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cst::parse;
    use crate::document::Document;
    use crate::options::ParseOptions;
    use crate::schema::Schema;

    fn compose_with(src: &str, options: &ParseOptions) -> Document {
        let stream = parse(src);
        let mut schema = Schema::new(options);
        let Some(cst) = stream.documents.first() else {
            panic!("no document in {src:?}");
        };
        super::super::compose_document(cst, &mut schema, options)
    }

    fn compose(src: &str) -> Document {
        compose_with(src, &ParseOptions::default())
    }

    fn has_error(doc: &Document, kind: &ErrorKind) -> bool {
        doc.errors.iter().any(|err| &err.kind == kind)
    }

    #[test]
    fn test_block_collections() {
        let test_cases = [
            (
                "a: 1\nb:\n  - x\n  - y\nc: {d: e}\n",
                json!({"a": 1, "b": ["x", "y"], "c": {"d": "e"}}),
            ),
            ("- a\n-\n- !!str\n- [b]\n", json!(["a", null, "", ["b"]])),
            ("- a: 1\n  b: 2\n- c\n", json!([{"a": 1, "b": 2}, "c"])),
            ("? a\n: 1\n? b\n", json!({"a": 1, "b": null})),
            ("key:\n- one\n- two\n", json!({"key": ["one", "two"]})),
            (": orphan\n", json!({"": "orphan"})),
        ];
        for (src, expected) in test_cases {
            let doc = compose(src);
            assert!(doc.errors.is_empty(), "{src:?}: {:?}", doc.errors);
            assert_eq!(doc.to_json(), Ok(expected), "{src:?}");
        }
    }

    #[test]
    fn test_implicit_key_errors() {
        let doc = compose("abc: 123\ndef");
        assert!(has_error(&doc, &ErrorKind::ImplicitKeyWithoutValue), "{:?}", doc.errors);
        assert_eq!(doc.to_json(), Ok(json!({"abc": 123, "def": null})));

        let doc = compose("\"multi\n line\": value\n");
        assert!(has_error(&doc, &ErrorKind::MultilineImplicitKey), "{:?}", doc.errors);
        assert_eq!(doc.to_json(), Ok(json!({"multi line": "value"})));

        // Explicit keys may span lines
        let doc = compose("? |\n  multi\n  line\n: value\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        assert_eq!(doc.to_json(), Ok(json!({"multi\nline\n": "value"})));
    }

    #[test]
    fn test_duplicate_keys() {
        let doc = compose("a: 1\nb: 2\na: 3\n");
        assert_eq!(
            doc.errors.iter().map(|err| &err.kind).collect::<Vec<_>>(),
            vec![&ErrorKind::DuplicateKey("a".to_owned())]
        );
        // The last value wins in plain data
        assert_eq!(doc.to_json(), Ok(json!({"a": 3, "b": 2})));

        let options = ParseOptions {
            unique_keys: false,
            ..ParseOptions::default()
        };
        let doc = compose_with("a: 1\na: 2\n", &options);
        assert!(doc.errors.is_empty());

        // Differently written equal values are the same key
        let doc = compose("1: a\n0x1: b\n");
        assert!(has_error(&doc, &ErrorKind::DuplicateKey("1".to_owned())));
    }

    #[test]
    fn test_seq_item_comments() {
        let doc = compose("- a # one\n\n# two\n- b\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let Some(items) = doc.root().and_then(Node::items) else {
            panic!("expected a sequence");
        };
        let nodes: Vec<&Node> = items.iter().filter_map(|&id| doc.node(id)).collect();
        let [first, second] = nodes.as_slice() else {
            panic!("expected two items");
        };
        assert_eq!(first.comment.as_deref(), Some(" one"));
        assert!(!first.space_before);
        assert_eq!(second.comment_before.as_deref(), Some(" two"));
        assert!(second.space_before);
    }

    #[test]
    fn test_anchored_block_map() {
        let doc = compose("&m\na: 1\nb: *m\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        assert_eq!(doc.anchors.get("m"), doc.contents);
        assert!(doc.to_json().is_err());

        let doc = compose("base: &b {x: 1}\ncopy: *b\n");
        assert_eq!(doc.to_json(), Ok(json!({"base": {"x": 1}, "copy": {"x": 1}})));
    }
}
