// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Composition of the concrete syntax tree into documents.
//!
//! The [`Composer`] walks one [`CstDocument`], resolving scalars through the
//! shared [`Schema`], building collections in the document's node arena and
//! attaching properties and comments. Problems are reported on the document
//! and composition always runs to completion, substituting empty nodes,
//! plain strings or synthesized maps where the source is malformed.

mod block;
mod block_scalar;
mod flow;
mod flow_scalar;
mod scalar;

use log::{debug, trace};

use crate::cst::{CstDocument, CstNode};
use crate::document::Document;
use crate::error::{ErrorKind, YamlError};
use crate::options::ParseOptions;
use crate::schema::Schema;
use crate::span::{Span, span_at};
use crate::token::{SourceToken, TokenKind};
use crate::value::{Alias, Content, Node, NodeId, Value};

pub use block_scalar::{BlockValue, resolve_block_scalar};
pub use flow_scalar::resolve_flow_scalar;

/// Properties and comments that precede a node.
#[derive(Debug, Clone, Default)]
pub(crate) struct Props {
    pub anchor: Option<String>,
    /// Expanded tag name.
    pub tag: Option<String>,
    pub comment_before: Option<String>,
    pub space_before: bool,
    /// A `?` indicator was seen.
    pub explicit_key: bool,
    /// End of the last token, where an empty node is placed.
    pub end: Option<usize>,
}

impl Props {
    /// Whether an empty node with these properties still needs a node.
    fn has_properties(&self) -> bool {
        self.anchor.is_some() || self.tag.is_some()
    }
}

pub(crate) fn comment_text(token: &SourceToken) -> &str {
    token.source.get(1..).unwrap_or_default()
}

pub(crate) fn push_line(comment: &mut Option<String>, line: &str) {
    match comment {
        Some(comment) => {
            comment.push('\n');
            comment.push_str(line);
        }
        None => *comment = Some(line.to_owned()),
    }
}

/// Composition context for one document.
#[derive(Debug)]
pub(crate) struct Composer<'a> {
    schema: &'a mut Schema,
    options: &'a ParseOptions,
    doc: Document,
    /// Most recently composed node, which a comment on its line belongs to.
    last_node: Option<NodeId>,
}

/// Compose one document of a stream.
pub fn compose_document(cst: &CstDocument, schema: &mut Schema, options: &ParseOptions) -> Document {
    let mut composer = Composer::new(schema, options);
    composer.compose_document(cst);
    composer.doc
}

impl<'a> Composer<'a> {
    pub fn new(schema: &'a mut Schema, options: &'a ParseOptions) -> Self {
        let doc = Document {
            merge: schema.merge,
            ..Document::default()
        };
        Self {
            schema,
            options,
            doc,
            last_node: None,
        }
    }

    pub(crate) fn error(&mut self, offset: usize, kind: ErrorKind) {
        self.doc.report(YamlError::at(offset, kind));
    }

    pub(crate) fn warn(&mut self, offset: usize, kind: ErrorKind) {
        self.doc.report(YamlError::warning_at(offset, kind));
    }

    fn compose_document(&mut self, cst: &CstDocument) {
        for error in &cst.errors {
            self.doc.report(error.clone());
        }

        // Directives and comments up to the `---` marker belong to the
        // document, the rest of the start tokens to the root node
        let content_from = cst
            .start
            .iter()
            .position(|token| token.kind == TokenKind::DocumentMarker)
            .or_else(|| {
                cst.start
                    .iter()
                    .position(|token| token.kind == TokenKind::DocumentStart)
            })
            .map_or(0, |idx| idx + 1);
        let (prefix, root) = cst.start.split_at(content_from.min(cst.start.len()));
        for token in prefix {
            match token.kind {
                TokenKind::Directive => {
                    let mut found = Vec::new();
                    self.doc.directives.add(token, &mut |error| found.push(error));
                    for error in found {
                        self.doc.report(error);
                    }
                }
                TokenKind::Comment => push_line(&mut self.doc.comment_before, comment_text(token)),
                _ => {}
            }
        }

        let props = self.props(root);
        let end = props.end.unwrap_or_else(|| prefix.last().map_or(0, |token| token.span.end));
        self.doc.contents = match &cst.value {
            Some(node) => Some(self.compose_node(node, props)),
            None => self.compose_empty(end, props),
        };
        self.end_comments(&cst.end);

        let start = cst
            .start
            .first()
            .map(SourceToken::offset)
            .or_else(|| cst.value.as_ref().map(CstNode::offset))
            .unwrap_or(0);
        let end = cst
            .end
            .last()
            .map(|token| token.span.end)
            .or_else(|| cst.value.as_ref().map(CstNode::end))
            .unwrap_or(end);
        self.doc.range = span_at(start, end.saturating_sub(start));
        self.doc.errors.sort_by_key(YamlError::offset);
        debug!(
            "composed document with {} nodes, {} errors, {} warnings",
            self.doc.nodes.len(),
            self.doc.errors.len(),
            self.doc.warnings.len()
        );
    }

    /// Comments after the root node: one on the root's last line belongs to
    /// the last node, the others to the document.
    fn end_comments(&mut self, tokens: &[SourceToken]) {
        let mut trailing = true;
        for token in tokens {
            match token.kind {
                TokenKind::Space => {}
                TokenKind::Comment => match self.last_node {
                    Some(last) if trailing => self.add_comment(last, comment_text(token)),
                    _ => push_line(&mut self.doc.comment, comment_text(token)),
                },
                _ => trailing = false,
            }
        }
    }

    /// Collect properties and comments from the tokens before a node.
    ///
    /// A comment that follows the previous node on its line is attached to
    /// that node instead.
    pub(crate) fn props(&mut self, tokens: &[SourceToken]) -> Props {
        let mut props = Props::default();
        let mut trailing = self.last_node.is_some();
        let mut blank_line = false;
        for token in tokens {
            props.end = Some(token.span.end);
            match token.kind {
                TokenKind::Space => {}
                TokenKind::Newline => {
                    if blank_line && props.comment_before.is_none() {
                        props.space_before = true;
                    }
                    trailing = false;
                    blank_line = true;
                }
                TokenKind::Comment => {
                    match self.last_node {
                        Some(last) if trailing => self.add_comment(last, comment_text(token)),
                        _ => push_line(&mut props.comment_before, comment_text(token)),
                    }
                    blank_line = false;
                }
                kind => {
                    trailing = false;
                    blank_line = false;
                    self.property(token, kind, &mut props);
                }
            }
        }
        props
    }

    /// Apply an anchor, tag or `?` indicator to pending properties.
    pub(crate) fn property(&mut self, token: &SourceToken, kind: TokenKind, props: &mut Props) {
        let offset = token.offset();
        match kind {
            TokenKind::Anchor => {
                if props.anchor.is_some() {
                    self.error(offset, ErrorKind::DuplicateAnchor);
                }
                props.anchor = Some(comment_text(token).to_owned());
            }
            TokenKind::Tag => {
                if props.tag.is_some() {
                    self.error(offset, ErrorKind::DuplicateTag);
                }
                let mut found = Vec::new();
                let name = self
                    .doc
                    .directives
                    .tag_name(&token.source, &mut |kind| found.push(kind));
                for kind in found {
                    self.error(offset, kind);
                }
                if name.is_some() {
                    props.tag = name;
                }
            }
            TokenKind::ExplicitKey => {
                if props.has_properties() {
                    self.error(offset, ErrorKind::PropertiesBeforeExplicitKey);
                }
                props.explicit_key = true;
            }
            _ => {}
        }
    }

    pub(crate) fn add_comment(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.doc.nodes.get_mut(id) {
            push_line(&mut node.comment, text);
        }
    }

    /// Add a node, applying its properties and registering its anchor.
    pub(crate) fn push_node(&mut self, mut node: Node, props: Props) -> NodeId {
        node.tag = props.tag;
        node.anchor.clone_from(&props.anchor);
        node.comment_before = props.comment_before;
        node.space_before = props.space_before;
        let id = self.doc.nodes.push(node);
        if let Some(anchor) = props.anchor {
            trace!("anchor &{anchor} -> {id}");
            self.doc.anchors.set(anchor, id);
        }
        self.last_node = Some(id);
        id
    }

    pub(crate) fn set_content(&mut self, id: NodeId, content: Content, range: Span) {
        if let Some(node) = self.doc.nodes.get_mut(id) {
            node.content = content;
            node.range = range;
        }
    }

    pub(crate) fn range(&self, id: NodeId) -> Option<Span> {
        self.doc.nodes.get(id).map(|node| node.range)
    }

    pub(crate) fn compose_node(&mut self, node: &CstNode, props: Props) -> NodeId {
        match node {
            CstNode::Scalar(scalar) => self.compose_flow_scalar(scalar, props),
            CstNode::BlockScalar(scalar) => self.compose_block_scalar(scalar, props),
            CstNode::Alias(token) => self.compose_alias(token, props),
            CstNode::FlowCollection(collection) => self.compose_flow_collection(collection, props),
            CstNode::BlockMap(map) => self.compose_block_map(map, node.span(), props),
            CstNode::BlockSeq(seq) => self.compose_block_seq(seq, node.span(), props),
        }
    }

    /// An empty node is only composed when it carries an anchor or a tag.
    pub(crate) fn compose_empty(&mut self, offset: usize, props: Props) -> Option<NodeId> {
        props
            .has_properties()
            .then(|| self.compose_empty_scalar(offset, props))
    }

    fn compose_alias(&mut self, token: &SourceToken, props: Props) -> NodeId {
        let offset = token.offset();
        if props.has_properties() {
            self.error(offset, ErrorKind::PropertiesOnAlias);
        }
        let name = comment_text(token).to_owned();
        let target = self.doc.anchors.get(&name);
        if target.is_none() {
            self.error(offset, ErrorKind::UndefinedAlias(name.clone()));
        }
        let alias = Node::new(Content::Alias(Alias { source: name, target }), token.span);
        self.push_node(
            alias,
            Props {
                anchor: None,
                tag: None,
                ..props
            },
        )
    }

    /// Report a scalar key equal to an earlier key of the same map. Merge
    /// keys may repeat.
    pub(crate) fn check_duplicate_key(&mut self, seen: &mut Vec<Value>, key: Option<NodeId>) {
        if !self.options.unique_keys {
            return;
        }
        let Some(id) = key else {
            return;
        };
        let Some(scalar) = self.doc.get(id).and_then(Node::scalar) else {
            return;
        };
        if scalar.value == Value::Merge {
            return;
        }
        let value = scalar.value.clone();
        if seen.contains(&value) {
            let offset = self.range(id).map_or(0, |range| range.start);
            self.error(offset, ErrorKind::DuplicateKey(value.to_string()));
        } else {
            seen.push(value);
        }
    }

    /// Report an explicit collection tag that names neither a map nor a
    /// sequence as appropriate.
    pub(crate) fn check_collection_tag(&mut self, props: &Props, expected: &str, offset: usize) {
        if let Some(tag) = &props.tag
            && tag != "!"
            && tag != expected
        {
            self.warn(offset, ErrorKind::UnresolvedTag(tag.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;
    use crate::value::ScalarStyle;

    fn compose(src: &str) -> Document {
        let stream = parse(src);
        let mut schema = Schema::default();
        let options = ParseOptions::default();
        let Some(cst) = stream.documents.first() else {
            panic!("no document in {src:?}");
        };
        compose_document(cst, &mut schema, &options)
    }

    fn root(doc: &Document) -> &Node {
        let Some(node) = doc.root() else {
            panic!("document has no root");
        };
        node
    }

    #[test]
    fn test_document_comments() {
        let doc = compose("# before\n---\n# root\nvalue # same line\n# after\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        assert_eq!(doc.comment_before.as_deref(), Some(" before"));
        assert_eq!(doc.comment.as_deref(), Some(" after"));
        let node = root(&doc);
        assert_eq!(node.comment_before.as_deref(), Some(" root"));
        assert_eq!(node.comment.as_deref(), Some(" same line"));
    }

    #[test]
    fn test_space_before() {
        let doc = compose("a: 1\n\n# note\nb: 2\nc: 3\n");
        let Some(pairs) = root(&doc).pairs() else {
            panic!("expected a map");
        };
        let keys: Vec<(bool, Option<&str>)> = pairs
            .iter()
            .filter_map(|pair| doc.node(pair.key?))
            .map(|node| (node.space_before, node.comment_before.as_deref()))
            .collect();
        assert_eq!(keys, vec![(false, None), (true, Some(" note")), (false, None)]);
    }

    #[test]
    fn test_anchor_and_alias() {
        let doc = compose("a: &x 1\nb: *x\nc: *missing\n");
        assert_eq!(
            doc.errors.iter().map(|err| &err.kind).collect::<Vec<_>>(),
            vec![&ErrorKind::UndefinedAlias("missing".to_owned())]
        );
        let Some(target) = doc.anchors.get("x") else {
            panic!("anchor x should be registered");
        };
        let Some(pairs) = root(&doc).pairs() else {
            panic!("expected a map");
        };
        let aliases: Vec<Option<NodeId>> = pairs
            .iter()
            .skip(1)
            .filter_map(|pair| doc.node(pair.value?))
            .map(|node| match &node.content {
                Content::Alias(alias) => alias.target,
                _ => panic!("expected an alias"),
            })
            .collect();
        assert_eq!(aliases, vec![Some(target), None]);
    }

    #[test]
    fn test_self_referencing_anchor() {
        let doc = compose("&a [*a]\n");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let (Some(root_id), Some(target)) = (doc.contents, doc.anchors.get("a")) else {
            panic!("expected an anchored root");
        };
        assert_eq!(root_id, target);
        assert!(doc.to_json().is_err());
    }

    #[test]
    fn test_property_errors() {
        let test_cases = [
            ("&a &b x", ErrorKind::DuplicateAnchor),
            ("!!str !!int x", ErrorKind::DuplicateTag),
            ("&a *b", ErrorKind::PropertiesOnAlias),
            ("{ &a ? b : c }", ErrorKind::PropertiesBeforeExplicitKey),
            ("!u!x y", ErrorKind::UndefinedTagHandle("!u!".to_owned())),
        ];
        for (src, expected) in test_cases {
            let doc = compose(src);
            assert!(
                doc.errors.iter().any(|err| err.kind == expected),
                "{src:?}: {:?}",
                doc.errors
            );
        }
    }

    #[test]
    fn test_empty_nodes() {
        let doc = compose("a:\nb: !!str\nc: &x\n");
        let Some(pairs) = root(&doc).pairs() else {
            panic!("expected a map");
        };
        let values: Vec<Option<Value>> = pairs
            .iter()
            .map(|pair| {
                pair.value
                    .and_then(|id| doc.node(id))
                    .and_then(Node::scalar)
                    .map(|scalar| scalar.value.clone())
            })
            .collect();
        assert_eq!(
            values,
            vec![None, Some(Value::String(String::new())), Some(Value::Null)]
        );
    }

    #[test]
    fn test_block_scalar_comment() {
        let doc = compose("--- |- # header\n  text\n");
        let node = root(&doc);
        assert_eq!(node.comment.as_deref(), Some(" header"));
        assert_eq!(node.scalar().map(|scalar| scalar.style), Some(ScalarStyle::Literal));
        assert_eq!(
            node.scalar().map(|scalar| &scalar.value),
            Some(&Value::String("text".to_owned()))
        );
    }

    #[test]
    fn test_collection_tags() {
        let doc = compose("!!map {a: 1}\n");
        assert!(doc.warnings.is_empty());
        let doc = compose("!!seq {a: 1}\n");
        assert_eq!(
            doc.warnings.first().map(|err| &err.kind),
            Some(&ErrorKind::UnresolvedTag("tag:yaml.org,2002:seq".to_owned()))
        );
        assert!(doc.errors.is_empty());
    }
}
