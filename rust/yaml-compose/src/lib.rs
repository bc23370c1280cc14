// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! A YAML 1.2 processor with error recovery.
//!
//! Processing runs in three stages:
//! - [`Lexer`] splits input into lossless [`SourceToken`]s and can be fed in
//!   arbitrary chunks with the same result as feeding all input at once.
//! - [`cst::parse`] groups tokens into documents, block collections, flow
//!   collections and scalars, keeping every source token.
//! - The composer resolves scalars against a [`Schema`] and builds one
//!   [`Document`] per YAML document, reporting errors on the document and
//!   recovering from them.
//!
//! # Example
//!
//! ```
//! use yaml_compose::{ParseOptions, parse_all_documents};
//!
//! let docs = parse_all_documents("a: 1\n---\n{ b: [2, 3] }\n", &ParseOptions::default());
//! assert_eq!(docs.len(), 2);
//! assert!(docs.iter().all(|doc| doc.errors.is_empty()));
//!
//! let json = docs.last().map(|doc| doc.to_json());
//! assert_eq!(json, Some(Ok(serde_json::json!({"b": [2, 3]}))));
//!
//! // Malformed input still composes, with the problems on the document
//! let docs = parse_all_documents("{ 123,,, }", &ParseOptions::default());
//! assert_eq!(docs.first().map(|doc| doc.errors.len()), Some(2));
//! ```

mod compose;
pub mod cst;
mod document;
mod error;
mod lexer;
mod options;
pub mod schema;
mod span;
mod token;
mod value;

use log::{debug, warn};

pub use compose::{BlockValue, compose_document, resolve_block_scalar, resolve_flow_scalar};
pub use document::{Anchors, Directives, Document, ToJsonError};
pub use error::{ErrorClass, ErrorKind, FlowKind, OnError, ParseFailure, YamlError};
pub use lexer::{Lexer, LexerState, Tokens, tokenize};
pub use options::ParseOptions;
pub use schema::{Resolved, Schema, SchemaName, Tag};
pub use span::{Position, SourceMap, Span};
pub use token::{SourceToken, TokenKind};
pub use value::{Alias, Content, Node, NodeId, Nodes, Pair, Scalar, ScalarStyle, Value};

/// Environment variable that silences the warnings logged by [`parse`].
pub const SILENCE_WARNINGS_ENV: &str = "YAML_SILENCE_WARNINGS";

/// Compose every document of a stream.
///
/// All documents share one schema, so a known tag first used in one document
/// stays available to the following ones.
pub fn parse_all_documents(src: &str, options: &ParseOptions) -> Vec<Document> {
    let stream = cst::parse(src);
    let mut schema = Schema::new(options);
    let mut docs: Vec<Document> = stream
        .documents
        .iter()
        .map(|cst| compose_document(cst, &mut schema, options))
        .collect();
    // Comments after the last document belong to it
    if let Some(last) = docs.last_mut() {
        for token in &stream.trailing {
            if token.kind == TokenKind::Comment {
                compose::push_line(&mut last.comment, compose::comment_text(token));
            }
        }
    }
    debug!("composed {} documents", docs.len());
    docs
}

/// Compose a stream expected to hold a single document.
///
/// Further documents are dropped, with an error on the first one at the
/// start of the second. An empty stream gives an empty document.
pub fn parse_document(src: &str, options: &ParseOptions) -> Document {
    let mut docs = parse_all_documents(src, options).into_iter();
    let Some(mut doc) = docs.next() else {
        return Document::default();
    };
    if let Some(next) = docs.next() {
        doc.errors
            .push(YamlError::at(next.range.start, ErrorKind::MultipleDocuments));
    }
    doc
}

/// Parse a single document into plain JSON data with default options.
///
/// # Errors
///
/// Returns the first error of the document, or a [`ToJsonError`] if the
/// document cannot be represented as JSON.
pub fn parse(src: &str) -> Result<serde_json::Value, ParseFailure> {
    parse_with(src, &ParseOptions::default())
}

/// Parse a single document into plain JSON data.
///
/// Warnings are logged unless `options.silence_warnings` is set or the
/// [`SILENCE_WARNINGS_ENV`] variable is present.
///
/// # Errors
///
/// Returns the first error of the document, or a [`ToJsonError`] if the
/// document cannot be represented as JSON.
pub fn parse_with(src: &str, options: &ParseOptions) -> Result<serde_json::Value, ParseFailure> {
    let mut doc = parse_document(src, options);
    let silenced = options.silence_warnings || std::env::var_os(SILENCE_WARNINGS_ENV).is_some();
    if !silenced && !doc.warnings.is_empty() {
        let map = SourceMap::new(src);
        for warning in &doc.warnings {
            let Position { line, column } = map.position(warning.offset());
            warn!("{warning} at line {line}, column {column}");
        }
    }
    if !doc.errors.is_empty() {
        return Err(doc.errors.swap_remove(0).into());
    }
    Ok(doc.to_json()?)
}
