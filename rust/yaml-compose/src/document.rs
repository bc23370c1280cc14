// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Composed documents, their directives and anchors.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::error::{ErrorKind, OnError, YamlError};
use crate::span::{Span, span_at};
use crate::token::SourceToken;
use crate::value::{Content, Node, NodeId, Nodes, Pair, Value};

const DEFAULT_TAG_PREFIXES: [(&str, &str); 2] = [("!", "!"), ("!!", "tag:yaml.org,2002:")];

/// `%YAML` and `%TAG` directives of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    /// Version given by `%YAML`, if any.
    pub version: Option<String>,
    /// Tag handle to prefix, defaults first.
    tags: Vec<(String, String)>,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            version: None,
            tags: DEFAULT_TAG_PREFIXES
                .iter()
                .map(|&(handle, prefix)| (handle.to_owned(), prefix.to_owned()))
                .collect(),
        }
    }
}

impl Directives {
    /// Apply one directive line.
    pub fn add(&mut self, token: &SourceToken, on_error: &mut OnError<'_>) {
        let offset = token.offset();
        let mut parts = token.source.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let params: Vec<&str> = parts.collect();
        match name {
            "%TAG" => {
                let [handle, prefix, ..] = params.as_slice() else {
                    on_error(YamlError::at(offset, ErrorKind::InvalidDirective("TAG".to_owned())));
                    return;
                };
                self.set_prefix(handle, prefix);
            }
            "%YAML" => {
                let Some(version) = params.first() else {
                    on_error(YamlError::at(offset, ErrorKind::InvalidDirective("YAML".to_owned())));
                    return;
                };
                if self.version.is_some() {
                    on_error(YamlError::at(offset, ErrorKind::DuplicateDirective("YAML".to_owned())));
                    return;
                }
                // Documents are always composed as YAML 1.2
                if *version != "1.2" {
                    on_error(YamlError::warning_at(
                        offset,
                        ErrorKind::UnsupportedVersion((*version).to_owned()),
                    ));
                }
                self.version = Some((*version).to_owned());
            }
            _ => on_error(YamlError::warning_at(
                offset,
                ErrorKind::UnknownDirective(name.trim_start_matches('%').to_owned()),
            )),
        }
    }

    fn set_prefix(&mut self, handle: &str, prefix: &str) {
        match self.tags.iter_mut().find(|(existing, _)| existing == handle) {
            Some(entry) => entry.1 = prefix.to_owned(),
            None => self.tags.push((handle.to_owned(), prefix.to_owned())),
        }
    }

    /// The prefix a tag handle expands to.
    pub fn prefix(&self, handle: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(existing, _)| existing == handle)
            .map(|(_, prefix)| prefix.as_str())
    }

    /// Expand the source of a tag property to a full tag name.
    ///
    /// The non-specific tag `!` is returned as is. Returns `None` after
    /// reporting when the tag cannot be expanded.
    pub fn tag_name(&self, source: &str, on_error: &mut dyn FnMut(ErrorKind)) -> Option<String> {
        if source == "!" {
            return Some(source.to_owned());
        }
        if !source.starts_with('!') {
            on_error(ErrorKind::InvalidTag(source.to_owned()));
            return None;
        }
        if let Some(verbatim) = source.strip_prefix("!<") {
            let Some(verbatim) = verbatim.strip_suffix('>') else {
                on_error(ErrorKind::InvalidVerbatimTag);
                return Some(verbatim.to_owned());
            };
            if verbatim == "!" || verbatim == "!!" {
                on_error(ErrorKind::InvalidTag(source.to_owned()));
                return None;
            }
            return Some(verbatim.to_owned());
        }
        // The handle runs through the last `!`
        let split = source.rfind('!').map_or(0, |idx| idx + 1);
        let (handle, suffix) = source.split_at(split);
        if suffix.is_empty() {
            on_error(ErrorKind::InvalidTag(source.to_owned()));
        }
        match self.prefix(handle) {
            Some(prefix) => Some(format!("{prefix}{}", percent_decode(suffix))),
            None => {
                on_error(ErrorKind::UndefinedTagHandle(handle.to_owned()));
                None
            }
        }
    }
}

/// Decode `%XX` escapes in a tag suffix; malformed escapes are kept.
fn percent_decode(suffix: &str) -> String {
    let bytes = suffix.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&byte) = bytes.get(i) {
        if byte == b'%'
            && let Some(hex) = suffix.get(i + 1..i + 3)
            && let Ok(value) = u8::from_str_radix(hex, 16)
        {
            decoded.push(value);
            i += 3;
            continue;
        }
        decoded.push(byte);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Anchor names of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchors {
    names: HashMap<String, NodeId>,
}

impl Anchors {
    /// Bind `name`, shadowing any earlier node of that name.
    pub fn set(&mut self, name: impl Into<String>, id: NodeId) {
        self.names.insert(name.into(), id);
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A composed YAML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Nodes,
    /// Root node; `None` for an empty document.
    pub contents: Option<NodeId>,
    pub anchors: Anchors,
    pub directives: Directives,
    pub errors: Vec<YamlError>,
    pub warnings: Vec<YamlError>,
    /// Comment lines before the document start marker.
    pub comment_before: Option<String>,
    /// Comment lines after the root node.
    pub comment: Option<String>,
    pub range: Span,
    /// `<<` keys are merged by [`Document::to_json`].
    pub merge: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: Nodes::default(),
            contents: None,
            anchors: Anchors::default(),
            directives: Directives::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            comment_before: None,
            comment: None,
            range: span_at(0, 0),
            merge: false,
        }
    }
}

impl Document {
    /// The node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The node with the given id, following aliases to their target.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let mut node = self.nodes.get(id)?;
        // Alias targets are composed before the alias, so chains are finite
        for _ in 0..self.nodes.len() {
            match &node.content {
                Content::Alias(alias) => node = self.nodes.get(alias.target?)?,
                _ => return Some(node),
            }
        }
        None
    }

    /// The root node.
    pub fn root(&self) -> Option<&Node> {
        self.contents.and_then(|id| self.node(id))
    }

    /// Record an error or warning.
    pub(crate) fn report(&mut self, error: YamlError) {
        if error.warning {
            self.warnings.push(error);
        } else {
            self.errors.push(error);
        }
    }

    /// Convert the document to plain JSON data.
    pub fn to_json(&self) -> Result<serde_json::Value, ToJsonError> {
        let mut converter = JsonConverter {
            doc: self,
            stack: Vec::new(),
        };
        converter.optional(self.contents)
    }
}

/// Failure to represent a document as JSON.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ToJsonError {
    #[display("Alias *{_0} refers to a node that contains it")]
    CircularAlias(String),

    #[display("Alias *{_0} does not refer to an anchor")]
    UnresolvedAlias(String),

    #[display("Merge key values must be maps or sequences of maps")]
    InvalidMerge,

    #[display("Node {_0} is not part of the document")]
    MissingNode(NodeId),
}

impl std::error::Error for ToJsonError {}

struct JsonConverter<'a> {
    doc: &'a Document,
    /// Collections being converted, to detect cycles.
    stack: Vec<NodeId>,
}

impl JsonConverter<'_> {
    fn optional(&mut self, id: Option<NodeId>) -> Result<serde_json::Value, ToJsonError> {
        id.map_or(Ok(serde_json::Value::Null), |id| self.convert(id))
    }

    fn convert(&mut self, id: NodeId) -> Result<serde_json::Value, ToJsonError> {
        let doc = self.doc;
        let node = doc.node(id).ok_or(ToJsonError::MissingNode(id))?;
        match &node.content {
            Content::Scalar(scalar) => Ok(scalar_to_json(&scalar.value)),
            Content::Alias(alias) => {
                let target = alias
                    .target
                    .ok_or_else(|| ToJsonError::UnresolvedAlias(alias.source.clone()))?;
                if self.stack.contains(&target) {
                    return Err(ToJsonError::CircularAlias(alias.source.clone()));
                }
                self.convert(target)
            }
            Content::Seq(items) => {
                self.stack.push(id);
                let items = items
                    .iter()
                    .map(|&item| self.convert(item))
                    .collect::<Result<Vec<_>, _>>();
                self.stack.pop();
                Ok(serde_json::Value::Array(items?))
            }
            Content::Map(pairs) => {
                self.stack.push(id);
                let map = self.map(pairs);
                self.stack.pop();
                Ok(serde_json::Value::Object(map?))
            }
        }
    }

    fn map(
        &mut self,
        pairs: &[Pair],
    ) -> Result<serde_json::Map<String, serde_json::Value>, ToJsonError> {
        let mut map = serde_json::Map::new();
        for pair in pairs {
            if self.doc.merge && self.is_merge_key(pair.key) {
                self.merge_into(&mut map, pair.value)?;
                continue;
            }
            let key = match self.optional(pair.key)? {
                serde_json::Value::String(key) => key,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            let value = self.optional(pair.value)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn is_merge_key(&self, key: Option<NodeId>) -> bool {
        key.and_then(|id| self.doc.get(id))
            .and_then(Node::scalar)
            .is_some_and(|scalar| scalar.value == Value::Merge)
    }

    /// Add the pairs of a merged map, or of each map in a merged sequence,
    /// without overriding keys already present.
    fn merge_into(
        &mut self,
        map: &mut serde_json::Map<String, serde_json::Value>,
        value: Option<NodeId>,
    ) -> Result<(), ToJsonError> {
        let Some(value) = value else {
            return Err(ToJsonError::InvalidMerge);
        };
        let sources = match self.doc.get(value).map(|node| &node.content) {
            Some(Content::Seq(items)) => items.clone(),
            _ => vec![value],
        };
        for source in sources {
            let serde_json::Value::Object(source) = self.convert(source)? else {
                return Err(ToJsonError::InvalidMerge);
            };
            for (key, value) in source {
                map.entry(key).or_insert(value);
            }
        }
        Ok(())
    }
}

fn scalar_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(value) => serde_json::Value::Bool(*value),
        Value::Int(value) => serde_json::Value::from(*value),
        // NaN and infinities have no JSON representation
        Value::Float(value) => {
            serde_json::Number::from_f64(*value).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Value::String(value) => serde_json::Value::String(value.clone()),
        Value::Bytes(bytes) => serde_json::Value::String(B64.encode(bytes)),
        Value::Merge => serde_json::Value::String("<<".to_owned()),
    }
}
