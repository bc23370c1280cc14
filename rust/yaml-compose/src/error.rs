// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Error types for YAML lexing, assembly and composition.

use serde::{Serialize, Serializer};

use crate::document::ToJsonError;
use crate::span::{Span, span_at};

/// An error or warning found while processing a YAML stream.
///
/// Errors never abort processing. They are collected per document and carry
/// the byte span they were detected at.
#[derive(Debug, Clone, PartialEq, Serialize, derive_more::Display, derive_more::Error)]
#[display("{kind}")]
pub struct YamlError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// The span in the source where the error was detected.
    #[serde(serialize_with = "serialize_span")]
    pub span: Span,
    /// Set for non-fatal notices.
    pub warning: bool,
}

/// Broad category of an error, used by callers to decide what to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum ErrorClass {
    /// Malformed token sequence.
    #[display("YAMLSyntaxError")]
    Syntax,
    /// Well-formed tokens with an invalid meaning.
    #[display("YAMLSemanticError")]
    Semantic,
    /// Anchor/alias lookup failure.
    #[display("YAMLReferenceError")]
    Reference,
    /// Non-fatal policy notice.
    #[display("YAMLWarning")]
    Warning,
}

/// Which flavour of flow collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum FlowKind {
    #[display("flow map")]
    Map,
    #[display("flow sequence")]
    Seq,
}

impl FlowKind {
    /// The character that closes this kind of collection.
    pub const fn close(self) -> char {
        match self {
            Self::Map => '}',
            Self::Seq => ']',
        }
    }
}

/// The kind of error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum ErrorKind {
    // Syntax
    #[display("Expected {_0} to end with {}", _0.close())]
    MissingFlowEnd(FlowKind),

    #[display("Expected {expected} to end with {}, found {found}", expected.close())]
    MismatchedFlowEnd { expected: FlowKind, found: char },

    #[display("Unexpected {_0} outside of a flow collection")]
    UnexpectedFlowEnd(char),

    #[display("Block sequence indicator - is not allowed in a flow collection")]
    SeqItemInFlow,

    #[display("Unexpected , in {_0}")]
    UnexpectedComma(FlowKind),

    #[display("Missing , between flow collection items")]
    MissingComma,

    #[display("Unexpected {_0:?} token")]
    UnexpectedToken(String),

    #[display("Unexpected content after the document root node")]
    TrailingContent,

    #[display("Bad indentation of a {_0} entry")]
    InvalidIndentation(&'static str),

    #[display("Nested mappings are not allowed in compact mappings")]
    NestedCompactMap,

    #[display("Sequence items are not allowed on the same line with map keys")]
    SeqItemOnKeyLine,

    #[display("Missing closing {}quote", if *double_quoted { "\"" } else { "'" })]
    UnterminatedQuotedString { double_quoted: bool },

    #[display("Invalid escape sequence {_0}")]
    InvalidEscape(String),

    #[display("Invalid block scalar header: {_0}")]
    InvalidBlockScalarHeader(String),

    #[display("Block scalars with more-indented leading empty lines must use an explicit indentation indicator")]
    BlockScalarLeadingIndent,

    #[display("Missing directives-end indicator line")]
    MissingDirectivesEnd,

    // Semantic
    #[display("A node can have at most one anchor")]
    DuplicateAnchor,

    #[display("A node can have at most one tag")]
    DuplicateTag,

    #[display("Anchors and tags must be after the ? indicator")]
    PropertiesBeforeExplicitKey,

    #[display("Alias nodes cannot have anchors or tags")]
    PropertiesOnAlias,

    #[display("Missing {{}} around pair used as mapping key")]
    PairAsMapKey,

    #[display("Implicit map keys need to be followed by map values")]
    ImplicitKeyWithoutValue,

    #[display("Implicit keys need to be on a single line")]
    MultilineImplicitKey,

    #[display("Map keys must be unique; {_0:?} is repeated")]
    DuplicateKey(String),

    #[display("Unresolved tag: {_0}")]
    UnresolvedTag(String),

    #[display("{_0}")]
    TagResolution(String),

    #[display("Error adding trailing comment to node")]
    TrailingComment,

    #[display("The {_0} tag handle is non-default and was not declared.")]
    UndefinedTagHandle(String),

    #[display("Verbatim tags must end with a >")]
    InvalidVerbatimTag,

    #[display("Not a valid tag: {_0}")]
    InvalidTag(String),

    #[display("Insufficient parameters given for %{_0} directive")]
    InvalidDirective(String),

    #[display("The %{_0} directive must only be given at most once per document.")]
    DuplicateDirective(String),

    #[display("Document will be parsed as YAML 1.2 rather than YAML {_0}")]
    UnsupportedVersion(String),

    #[display("YAML only supports %TAG and %YAML directives, and not %{_0}")]
    UnknownDirective(String),

    #[display("Source contains multiple documents; please use parse_all_documents()")]
    MultipleDocuments,

    // Reference
    #[display("Aliased anchor not found: {_0}")]
    UndefinedAlias(String),

    /// Custom error message
    #[display("{_0}")]
    Custom(String),
}

impl ErrorKind {
    /// The broad category of this kind of error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingFlowEnd(_)
            | Self::MismatchedFlowEnd { .. }
            | Self::UnexpectedFlowEnd(_)
            | Self::SeqItemInFlow
            | Self::UnexpectedComma(_)
            | Self::MissingComma
            | Self::UnexpectedToken(_)
            | Self::TrailingContent
            | Self::InvalidIndentation(_)
            | Self::NestedCompactMap
            | Self::SeqItemOnKeyLine
            | Self::UnterminatedQuotedString { .. }
            | Self::InvalidEscape(_)
            | Self::InvalidBlockScalarHeader(_)
            | Self::BlockScalarLeadingIndent
            | Self::MissingDirectivesEnd => ErrorClass::Syntax,
            Self::UndefinedAlias(_) => ErrorClass::Reference,
            Self::UnsupportedVersion(_) | Self::UnknownDirective(_) => ErrorClass::Warning,
            Self::DuplicateAnchor
            | Self::DuplicateTag
            | Self::PropertiesBeforeExplicitKey
            | Self::PropertiesOnAlias
            | Self::PairAsMapKey
            | Self::ImplicitKeyWithoutValue
            | Self::MultilineImplicitKey
            | Self::DuplicateKey(_)
            | Self::UnresolvedTag(_)
            | Self::TagResolution(_)
            | Self::TrailingComment
            | Self::UndefinedTagHandle(_)
            | Self::InvalidVerbatimTag
            | Self::InvalidTag(_)
            | Self::InvalidDirective(_)
            | Self::DuplicateDirective(_)
            | Self::MultipleDocuments
            | Self::Custom(_) => ErrorClass::Semantic,
        }
    }

    /// Get a suggestion for how to fix this error.
    ///
    /// Returns `Some(suggestion)` if a helpful fix suggestion is available,
    /// or `None` if no specific suggestion applies.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingFlowEnd(_) | Self::MismatchedFlowEnd { .. } => {
                Some("Close every { with } and every [ with ]")
            }
            Self::UnexpectedComma(_) | Self::MissingComma => {
                Some("Separate flow collection items with exactly one comma")
            }
            Self::UnterminatedQuotedString { .. } => {
                Some("Add the matching closing quote character")
            }
            Self::InvalidEscape(_) => Some(
                "Valid escape sequences: \\0 \\a \\b \\t \\n \\v \\f \\r \\e \\\" \\/ \\\\ \\N \\_ \\L \\P \\x## \\u#### \\U########",
            ),
            Self::InvalidBlockScalarHeader(_) | Self::BlockScalarLeadingIndent => Some(
                "Block scalar header format: | or > followed by optional [1-9] indent and [-+] chomping",
            ),
            Self::InvalidIndentation(_) => {
                Some("Entries of one collection must all start at the same column")
            }
            Self::PairAsMapKey => Some("Wrap the key pair in braces: { { a: b }: c }"),
            Self::DuplicateAnchor => {
                Some("A node can only have one anchor; remove the extra &anchor")
            }
            Self::DuplicateTag => Some("A node can only have one tag; remove the extra !tag"),
            Self::PropertiesOnAlias => Some(
                "Aliases (*name) cannot have anchors or tags; apply them to the original value",
            ),
            Self::UndefinedAlias(_) => {
                Some("Define the anchor with &name before referencing it with *name")
            }
            Self::UndefinedTagHandle(_) => Some(
                "Add a %TAG directive to define the handle, e.g., %TAG !e! tag:example.com,2000:",
            ),
            Self::DuplicateKey(_) => Some("Remove or rename one of the duplicate keys"),
            // No specific suggestion for these
            Self::UnexpectedFlowEnd(_)
            | Self::SeqItemInFlow
            | Self::UnexpectedToken(_)
            | Self::TrailingContent
            | Self::NestedCompactMap
            | Self::SeqItemOnKeyLine
            | Self::MissingDirectivesEnd
            | Self::PropertiesBeforeExplicitKey
            | Self::ImplicitKeyWithoutValue
            | Self::MultilineImplicitKey
            | Self::UnresolvedTag(_)
            | Self::TagResolution(_)
            | Self::TrailingComment
            | Self::InvalidVerbatimTag
            | Self::InvalidTag(_)
            | Self::InvalidDirective(_)
            | Self::DuplicateDirective(_)
            | Self::UnsupportedVersion(_)
            | Self::UnknownDirective(_)
            | Self::MultipleDocuments
            | Self::Custom(_) => None,
        }
    }
}

impl YamlError {
    /// Create a new error with a kind and span.
    #[must_use]
    pub const fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            warning: false,
        }
    }

    /// An error attributed to a single byte offset.
    #[must_use]
    pub fn at(offset: usize, kind: ErrorKind) -> Self {
        Self::new(kind, span_at(offset, 0))
    }

    /// A warning attributed to a single byte offset.
    #[must_use]
    pub fn warning_at(offset: usize, kind: ErrorKind) -> Self {
        Self::at(offset, kind).into_warning()
    }

    /// Mark this error as a non-fatal warning.
    #[must_use]
    pub fn into_warning(mut self) -> Self {
        self.warning = true;
        self
    }

    /// Byte offset the error is attributed to.
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// The category of this error; anything reported as a warning is a warning.
    pub fn class(&self) -> ErrorClass {
        if self.warning {
            ErrorClass::Warning
        } else {
            self.kind.class()
        }
    }

    /// Get a suggestion for how to fix this error.
    ///
    /// Delegates to [`ErrorKind::suggestion()`].
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        self.kind.suggestion()
    }
}

/// Why [`crate::parse`] could not produce plain data.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::From)]
pub enum ParseFailure {
    /// The first error of the document.
    #[display("{_0}")]
    Yaml(YamlError),
    /// The document is valid but has no JSON equivalent.
    #[display("{_0}")]
    Json(ToJsonError),
}

impl std::error::Error for ParseFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Yaml(error) => Some(error),
            Self::Json(error) => Some(error),
        }
    }
}

/// Sink the composer reports errors into.
pub type OnError<'a> = dyn FnMut(YamlError) + 'a;

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "Signature is dictated by serde's serialize_with"
)]
fn serialize_span<S: Serializer>(span: &Span, serializer: S) -> Result<S::Ok, S::Error> {
    (span.start, span.end).serialize(serializer)
}
