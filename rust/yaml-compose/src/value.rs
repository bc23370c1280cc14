// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! YAML abstract tree types.
//!
//! This module implements the composed YAML tree, where node properties
//! (anchor, tag) and comments are stored on the node, separate from its
//! content. In YAML, anchors and tags are properties that can be attached to
//! any node, not separate node types.
//!
//! # Arena Design
//!
//! Nodes of one document live in a [`Nodes`] arena and refer to each other by
//! [`NodeId`]. An alias stores the id of the node its anchor named when the
//! alias was composed, so a later redefinition of the anchor simply overwrites
//! the name lookup without touching existing aliases, and cyclic documents
//! need no reference counting.

use std::fmt;

use crate::span::Span;

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A null value (`null`, `~`, or empty)
    Null,

    /// A boolean value (`true` or `false`)
    Bool(bool),

    /// An integer value
    Int(i64),

    /// A floating-point value
    Float(f64),

    /// A string value (quoted or unquoted)
    String(String),

    /// Binary data from a `!!binary` scalar
    Bytes(Vec<u8>),

    /// The `<<` merge key
    Merge,
}

impl Value {
    /// Returns `true` if this is a null value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) if value.is_nan() => f.write_str(".nan"),
            Self::Float(value) if value.is_infinite() => {
                f.write_str(if *value > 0.0 { ".inf" } else { "-.inf" })
            }
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Merge => f.write_str("<<"),
        }
    }
}

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// A scalar node's content.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: Value,
    pub style: ScalarStyle,
    /// Representation variant of the resolving tag, e.g. `HEX` for `0x1f`.
    pub format: Option<&'static str>,
    /// Fraction digits written in the source, trailing zeros included.
    pub min_fraction_digits: usize,
}

impl Scalar {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            style: ScalarStyle::Plain,
            format: None,
            min_fraction_digits: 0,
        }
    }
}

/// A key/value pair; `None` stands for an empty node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pair {
    pub key: Option<NodeId>,
    pub value: Option<NodeId>,
}

/// A `*name` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub source: String,
    /// Node the anchor named when the alias was composed; `None` if undefined.
    pub target: Option<NodeId>,
}

/// The content of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Scalar(Scalar),
    Map(Vec<Pair>),
    Seq(Vec<NodeId>),
    Alias(Alias),
}

/// A composed YAML node with its properties and comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub content: Content,
    /// Source range of the node's content, properties excluded
    pub range: Span,
    /// Explicit tag, only set when one was given in the source
    pub tag: Option<String>,
    pub anchor: Option<String>,
    /// Comment on the same line after the node
    pub comment: Option<String>,
    /// Comment lines before the node
    pub comment_before: Option<String>,
    /// Whether a blank line precedes the node
    pub space_before: bool,
}

impl Node {
    #[must_use]
    pub fn new(content: Content, range: Span) -> Self {
        Self {
            content,
            range,
            tag: None,
            anchor: None,
            comment: None,
            comment_before: None,
            space_before: false,
        }
    }

    pub fn scalar(&self) -> Option<&Scalar> {
        match &self.content {
            Content::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn pairs(&self) -> Option<&[Pair]> {
        match &self.content {
            Content::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[NodeId]> {
        match &self.content {
            Content::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` if this is a map or sequence.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self.content, Content::Map(_) | Content::Seq(_))
    }
}

/// Arena owning the nodes of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nodes {
    nodes: Vec<Node>,
}

impl Nodes {
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }
}
