// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

use crate::schema::{SchemaName, Tag};

/// Options controlling composition.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Base tag table used to resolve scalars.
    pub schema: SchemaName,
    /// Enable support for `<<` merge keys.
    pub merge: bool,
    /// Make explicit `!!binary` tags resolvable.
    pub resolve_known_tags: bool,
    /// Additional tags appended to the schema's tag table.
    pub custom_tags: Vec<Tag>,
    /// Report duplicate scalar keys within a map.
    pub unique_keys: bool,
    /// Do not log document warnings from [`crate::parse`].
    pub silence_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            schema: SchemaName::Core,
            merge: false,
            resolve_known_tags: true,
            custom_tags: Vec::new(),
            unique_keys: true,
            silence_warnings: false,
        }
    }
}
