// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Flow collection composition with recovery from stray and missing
//! indicators.

use crate::cst::{FlowCollection, FlowItem};
use crate::error::{ErrorKind, FlowKind};
use crate::schema::{MAP_TAG, SEQ_TAG};
use crate::span::span_at;
use crate::token::TokenKind;
use crate::value::{Content, Node, NodeId, Pair, Value};

use super::{Composer, Props, comment_text, push_line};

/// The item of a flow collection being assembled.
#[derive(Debug, Default)]
struct PendingItem {
    /// A `:` indicator was seen; `key` may still be an empty node.
    has_key: bool,
    key: Option<NodeId>,
    value: Option<NodeId>,
    /// Properties and comment for the next node.
    props: Props,
    /// Line breaks since the last comment or node.
    newlines: usize,
    /// Right after a `,`: a comment on this line belongs to the previous item.
    at_value_end: bool,
}

impl PendingItem {
    fn is_blank(&self) -> bool {
        !self.has_key
            && self.value.is_none()
            && !self.props.has_properties()
            && !self.props.explicit_key
    }

    /// Take the properties for the node about to be composed.
    fn take_props(&mut self) -> Props {
        let mut props = std::mem::take(&mut self.props);
        if self.newlines > 1 && props.comment_before.is_none() {
            props.space_before = true;
        }
        props.explicit_key = false;
        self.newlines = 0;
        props
    }
}

/// Items of the collection under construction.
#[derive(Debug)]
enum Items {
    Map(Vec<Pair>),
    Seq(Vec<NodeId>),
}

impl Composer<'_> {
    pub(super) fn compose_flow_collection(&mut self, fc: &FlowCollection, props: Props) -> NodeId {
        let kind = fc.kind();
        let start = fc.start.offset();
        let (content, tag) = match kind {
            FlowKind::Map => (Content::Map(Vec::new()), MAP_TAG),
            FlowKind::Seq => (Content::Seq(Vec::new()), SEQ_TAG),
        };
        self.check_collection_tag(&props, tag, start);
        // Registered before the items so they can refer to its anchor
        let id = self.push_node(Node::new(content, fc.start.span), props);

        let mut items = match kind {
            FlowKind::Map => Items::Map(Vec::new()),
            FlowKind::Seq => Items::Seq(Vec::new()),
        };
        let mut seen_keys = Vec::new();
        let mut pending = PendingItem::default();
        let mut offset = fc.start.span.end;
        for item in &fc.items {
            let token = match item {
                FlowItem::Node(node) => {
                    if pending.value.is_some() {
                        self.error(node.offset(), ErrorKind::MissingComma);
                    }
                    let props = pending.take_props();
                    pending.value = Some(self.compose_node(node, props));
                    // A comment after this node belongs to it
                    pending.at_value_end = false;
                    offset = node.end();
                    continue;
                }
                FlowItem::Token(token) => token,
            };
            match token.kind {
                TokenKind::Comment => {
                    let text = comment_text(token);
                    if pending.props.comment_before.is_none() && pending.newlines > 0 {
                        pending.props.space_before = true;
                    }
                    push_line(&mut pending.props.comment_before, text);
                    pending.newlines = 0;
                }
                TokenKind::Newline => {
                    if pending.at_value_end {
                        if let Some(comment) = pending.props.comment_before.take() {
                            match last_item_node(&items) {
                                Some(last) => self.add_comment(last, &comment),
                                None => self.error(token.offset(), ErrorKind::TrailingComment),
                            }
                        }
                        pending.at_value_end = false;
                    } else {
                        pending.newlines += 1;
                    }
                }
                TokenKind::Anchor | TokenKind::Tag | TokenKind::ExplicitKey => {
                    let mut props = std::mem::take(&mut pending.props);
                    self.property(token, token.kind, &mut props);
                    pending.props = props;
                }
                TokenKind::Colon => {
                    if pending.has_key {
                        if let Some(value) = pending.value.take() {
                            // A `key: value` pair used as a key without braces
                            self.error(token.offset(), ErrorKind::PairAsMapKey);
                            pending.key = Some(self.compose_pair_map(pending.key, Some(value)));
                        }
                    } else if let Some(value) = pending.value.take() {
                        pending.key = Some(value);
                        pending.has_key = true;
                    } else {
                        let props = pending.take_props();
                        pending.key = self.compose_empty(token.offset(), props);
                        pending.has_key = true;
                    }
                    if let Some(comment) = pending.props.comment_before.take()
                        && let Some(key) = pending.key
                    {
                        self.add_comment(key, &comment);
                    }
                }
                TokenKind::Comma => {
                    if pending.is_blank() {
                        self.error(token.offset(), ErrorKind::UnexpectedComma(kind));
                    } else {
                        self.add_flow_item(&mut items, &mut pending, &mut seen_keys, offset);
                    }
                    pending = PendingItem {
                        at_value_end: true,
                        ..PendingItem::default()
                    };
                }
                // Reported while assembling the collection
                _ => {}
            }
            offset = token.span.end;
        }
        if !pending.is_blank() {
            self.add_flow_item(&mut items, &mut pending, &mut seen_keys, offset);
        }

        let end = fc.end.as_ref().map_or(offset, |end| end.span.end);
        let content = match items {
            Items::Map(pairs) => Content::Map(pairs),
            Items::Seq(items) => Content::Seq(items),
        };
        self.set_content(id, content, span_at(start, end.saturating_sub(start)));
        self.last_node = Some(id);
        id
    }

    fn add_flow_item(
        &mut self,
        items: &mut Items,
        pending: &mut PendingItem,
        seen_keys: &mut Vec<Value>,
        offset: usize,
    ) {
        let value = match pending.value {
            Some(value) => {
                if let Some(comment) = pending.props.comment_before.take() {
                    self.add_comment(value, &comment);
                }
                Some(value)
            }
            None => {
                let props = pending.take_props();
                self.compose_empty(offset, props)
            }
        };
        match items {
            Items::Map(pairs) => {
                let pair = if pending.has_key {
                    Pair {
                        key: pending.key,
                        value,
                    }
                } else {
                    Pair { key: value, value: None }
                };
                self.check_duplicate_key(seen_keys, pair.key);
                pairs.push(pair);
            }
            Items::Seq(items) => {
                let item = if pending.has_key {
                    self.compose_pair_map(pending.key, value)
                } else {
                    match value {
                        Some(value) => value,
                        None => self.compose_empty_scalar(offset, Props::default()),
                    }
                };
                items.push(item);
            }
        }
    }

    /// A single-pair map standing for a bare `key: value` pair.
    fn compose_pair_map(&mut self, key: Option<NodeId>, value: Option<NodeId>) -> NodeId {
        let start = key.or(value).and_then(|id| self.range(id));
        let end = value.or(key).and_then(|id| self.range(id));
        let range = match (start, end) {
            (Some(start), Some(end)) => span_at(start.start, end.end.saturating_sub(start.start)),
            _ => start.or(end).unwrap_or_else(|| span_at(0, 0)),
        };
        let map = Node::new(Content::Map(vec![Pair { key, value }]), range);
        self.doc.nodes.push(map)
    }
}

/// The node of the most recently added item: its value, else its key.
fn last_item_node(items: &Items) -> Option<NodeId> {
    match items {
        Items::Map(pairs) => pairs.last().and_then(|pair| pair.value.or(pair.key)),
        Items::Seq(items) => items.last().copied(),
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

    fn compose_all(src: &str) -> Vec<Document> {
        let stream = parse(src);
        let mut schema = Schema::default();
        let options = ParseOptions::default();
        stream
            .documents
            .iter()
            .map(|cst| super::super::compose_document(cst, &mut schema, &options))
            .collect()
    }

    fn compose(src: &str) -> Document {
        let mut docs = compose_all(src);
        assert_eq!(docs.len(), 1, "{src:?}");
        docs.remove(0)
    }

    fn error_kinds(doc: &Document) -> Vec<ErrorKind> {
        doc.errors.iter().map(|err| err.kind.clone()).collect()
    }

    #[test]
    fn test_stray_commas() {
        let test_cases = [
            ("{ , }\n---\n{ 123,,, }\n", FlowKind::Map, json!({}), json!({"123": null})),
            ("[ , ]\n---\n[ 123,,, ]\n", FlowKind::Seq, json!([]), json!([123])),
        ];
        for (src, kind, first, second) in test_cases {
            let docs = compose_all(src);
            assert_eq!(docs.len(), 2);
            let counts: Vec<usize> = docs.iter().map(|doc| doc.errors.len()).collect();
            assert_eq!(counts, vec![1, 2], "{src:?}");
            assert!(
                docs.iter()
                    .flat_map(|doc| &doc.errors)
                    .all(|err| err.kind == ErrorKind::UnexpectedComma(kind))
            );
            assert_eq!(docs.first().map(Document::to_json), Some(Ok(first)));
            assert_eq!(docs.get(1).map(Document::to_json), Some(Ok(second)));
        }
    }

    #[test]
    fn test_explicit_empty_key() {
        let doc = compose("{ ? : 123 }");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let Some(pairs) = doc.root().and_then(Node::pairs) else {
            panic!("expected a map");
        };
        assert_eq!(pairs.len(), 1);
        let Some(pair) = pairs.first() else {
            panic!("expected a pair");
        };
        assert_eq!(pair.key, None);
        let value = pair.value.and_then(|id| doc.node(id)).and_then(Node::scalar);
        assert_eq!(value.map(|scalar| &scalar.value), Some(&Value::Int(123)));
    }

    #[test]
    fn test_pair_as_map_key() {
        let doc = compose("{ a: b: c }");
        assert_eq!(error_kinds(&doc), vec![ErrorKind::PairAsMapKey]);
        let Some(pairs) = doc.root().and_then(Node::pairs) else {
            panic!("expected a map");
        };
        assert_eq!(pairs.len(), 1);
        let key = pairs.first().and_then(|pair| doc.node(pair.key?));
        assert_eq!(key.and_then(Node::pairs).map(<[Pair]>::len), Some(1));
        assert_eq!(doc.to_json(), Ok(json!({"{\"a\":\"b\"}": "c"})));
    }

    #[test]
    fn test_flow_items() {
        let test_cases = [
            ("[a, b: c, {d: e}]", json!(["a", {"b": "c"}, {"d": "e"}])),
            ("{a, b: , : c}", json!({"a": null, "b": null, "": "c"})),
            ("[ ]", json!([])),
            ("[a, [b, [c]],]", json!(["a", ["b", ["c"]]])),
            ("{ a: 1,\n  b: 2 }", json!({"a": 1, "b": 2})),
        ];
        for (src, expected) in test_cases {
            let doc = compose(src);
            assert!(doc.errors.is_empty(), "{src:?}: {:?}", doc.errors);
            assert_eq!(doc.to_json(), Ok(expected), "{src:?}");
        }
    }

    #[test]
    fn test_comma_after_properties() {
        let test_cases = [
            ("[&a x, *a, &b y, *b]", json!(["x", "x", "y", "y"])),
            ("{ b: , c: d }", json!({"b": null, "c": "d"})),
            ("[ &x , b ]", json!([null, "b"])),
            ("[ !!str , b ]", json!(["", "b"])),
            ("{ ? , a: 1 }", json!({"": null, "a": 1})),
        ];
        for (src, expected) in test_cases {
            let doc = compose(src);
            assert!(doc.errors.is_empty(), "{src:?}: {:?}", doc.errors);
            assert_eq!(doc.to_json(), Ok(expected), "{src:?}");
        }

        let doc = compose("[*a, *b]");
        assert_eq!(
            error_kinds(&doc),
            vec![
                ErrorKind::UndefinedAlias("a".to_owned()),
                ErrorKind::UndefinedAlias("b".to_owned()),
            ]
        );
        assert_eq!(doc.root().and_then(Node::items).map(<[NodeId]>::len), Some(2));
    }

    #[test]
    fn test_missing_comma() {
        let doc = compose("[ 'a' 'b' ]");
        assert_eq!(error_kinds(&doc), vec![ErrorKind::MissingComma]);
        assert_eq!(doc.to_json(), Ok(json!(["b"])));
    }

    #[test]
    fn test_unterminated_collection() {
        let doc = compose("{");
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.to_json(), Ok(json!({})));

        let doc = compose("[ a, b");
        assert_eq!(error_kinds(&doc), vec![ErrorKind::MissingFlowEnd(FlowKind::Seq)]);
        assert_eq!(doc.to_json(), Ok(json!(["a", "b"])));
    }

    #[test]
    fn test_flow_comments() {
        let doc = compose("[\n  a, # first\n  # before b\n  b\n]\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let Some(items) = doc.root().and_then(Node::items) else {
            panic!("expected a sequence");
        };
        let comments: Vec<(Option<&str>, Option<&str>)> = items
            .iter()
            .filter_map(|&id| doc.node(id))
            .map(|node| (node.comment.as_deref(), node.comment_before.as_deref()))
            .collect();
        assert_eq!(comments, vec![(Some(" first"), None), (None, Some(" before b"))]);

        let doc = compose("[a, b # last\n]\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let comments: Vec<Option<&str>> = doc
            .root()
            .and_then(Node::items)
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| doc.node(id))
            .map(|node| node.comment.as_deref())
            .collect();
        assert_eq!(comments, vec![None, Some(" last")]);
    }

    #[test]
    fn test_duplicate_flow_keys() {
        let doc = compose("{ a: 1, a: 2 }");
        assert_eq!(error_kinds(&doc), vec![ErrorKind::DuplicateKey("a".to_owned())]);
    }
}
