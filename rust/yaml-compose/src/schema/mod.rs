// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Tag tables for scalar resolution.
//!
//! A [`Schema`] is an ordered list of [`Tag`]s. The composer picks a tag for
//! each scalar by explicit name or, for plain scalars, by testing the default
//! tags' patterns in order, and then calls the tag's resolve function on the
//! scalar's string value.

mod tags;

use regex::Regex;

use crate::options::ParseOptions;
use crate::value::{Scalar, Value};

pub use tags::{binary_tag, core_tags, failsafe_tags, json_tags, merge_tag};

pub const STR_TAG: &str = "tag:yaml.org,2002:str";
pub const MAP_TAG: &str = "tag:yaml.org,2002:map";
pub const SEQ_TAG: &str = "tag:yaml.org,2002:seq";
pub const NULL_TAG: &str = "tag:yaml.org,2002:null";
pub const BOOL_TAG: &str = "tag:yaml.org,2002:bool";
pub const INT_TAG: &str = "tag:yaml.org,2002:int";
pub const FLOAT_TAG: &str = "tag:yaml.org,2002:float";
pub const BINARY_TAG: &str = "tag:yaml.org,2002:binary";
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";

/// Result of a tag's resolve function.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A bare value, wrapped in a plain [`Scalar`] by the composer.
    Value(Value),
    /// A fully formed scalar, used as is.
    Scalar(Scalar),
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Resolve a scalar's string value. Non-fatal problems are reported through
/// the callback; an `Err` makes the composer keep the string instead.
pub type ResolveFn = fn(&str, &mut dyn FnMut(String)) -> Result<Resolved, String>;

/// One entry of a tag table.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Full tag name, e.g. `tag:yaml.org,2002:int`.
    pub tag: String,
    /// Whether the tag may be picked for untagged plain scalars.
    pub default: bool,
    /// Pattern an untagged plain scalar must match for this tag to apply.
    pub test: Option<Regex>,
    pub resolve: ResolveFn,
    /// Representation variant, copied to the resolved scalar.
    pub format: Option<&'static str>,
}

impl Tag {
    /// A tag that only applies when named explicitly.
    pub fn new(tag: impl Into<String>, resolve: ResolveFn) -> Self {
        Self {
            tag: tag.into(),
            default: false,
            test: None,
            resolve,
            format: None,
        }
    }

    /// Make the tag a default, applied to plain scalars matching `test`.
    #[must_use]
    pub fn with_test(mut self, test: Regex) -> Self {
        self.default = true;
        self.test = Some(test);
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    /// Whether an untagged plain scalar with this string value matches.
    pub fn matches(&self, value: &str) -> bool {
        self.default && self.test.as_ref().is_some_and(|test| test.is_match(value))
    }
}

/// Which base tag table a [`Schema`] starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaName {
    /// YAML 1.2 core schema.
    #[default]
    Core,
    /// Strict JSON-compatible scalars.
    Json,
    /// Strings only.
    Failsafe,
}

/// The tag table used while composing.
///
/// Tags are only ever appended, so a schema can be shared by every document
/// of a stream.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: SchemaName,
    pub merge: bool,
    tags: Vec<Tag>,
    known_tags: Vec<Tag>,
}

impl Schema {
    pub fn new(options: &ParseOptions) -> Self {
        let mut tags = match options.schema {
            SchemaName::Core => core_tags(),
            SchemaName::Json => json_tags(),
            SchemaName::Failsafe => failsafe_tags(),
        };
        if options.merge {
            tags.insert(0, merge_tag());
        }
        tags.extend(options.custom_tags.iter().cloned());
        let known_tags = if options.resolve_known_tags {
            vec![binary_tag()]
        } else {
            Vec::new()
        };
        Self {
            name: options.schema,
            merge: options.merge,
            tags,
            known_tags,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// A tag that resolves only by explicit request.
    pub fn known_tag(&self, name: &str) -> Option<&Tag> {
        self.known_tags.iter().find(|tag| tag.tag == name)
    }

    /// Make a known tag resolvable by name without it becoming a default.
    ///
    /// Returns `false` if a tag of that name is already in the table.
    pub fn add_known_tag_once(&mut self, tag: &Tag) -> bool {
        if self.tags.iter().any(|existing| existing.tag == tag.tag) {
            return false;
        }
        self.tags.push(Tag {
            default: false,
            test: None,
            ..tag.clone()
        });
        true
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(&ParseOptions::default())
    }
}
