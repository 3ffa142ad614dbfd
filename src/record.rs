//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Mnema.
//! The Mnema project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Mnema Record Module
//!
//! This module provides [`MnRecord`], the unit of data flowing through Mnema
//! pipelines: one metadata item harvested from an archive.
//!
//! ## Design Principles
//!
//! - **Recursive**: a record is a scalar (string, number, boolean, null), a
//!   sequence of records, or a mapping from string keys to records. It is
//!   backed by `serde_json::Value`.
//! - **Ordered**: mapping keys keep insertion order (serde_json is built with
//!   `preserve_order`), and that order is reproduced on export.
//! - **Path-addressable**: any location can be read with an [`MnPath`];
//!   reads never fail, a miss is simply `None`.
//!
//! ## Usage Example
//!
//! ```rust
//! use mnema::record::MnRecord;
//! use mnema::path::MnPath;
//! use serde_json::json;
//!
//! let record = MnRecord::from(json!({"title": ["Hello World"], "type": "TEXT"}));
//! assert_eq!(record.get("title[0]"), Some(&json!("Hello World")));
//! assert_eq!(record.field("type"), Some(&json!("TEXT")));
//!
//! let output = MnRecord::new()
//!     .with(&MnPath::parse("meta.lang").unwrap(), json!("en"))
//!     .unwrap();
//! assert_eq!(output.as_value(), &json!({"meta": {"lang": "en"}}));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::path::MnPath;

/// One metadata record.
///
/// An `MnRecord` is whatever a harvester produced for a single archive item:
/// usually a mapping such as `{"id": .., "title": [..], "type": "TEXT"}`, but
/// any JSON value is accepted. Nested mappings and sequences are addressed
/// with [`MnPath`], top-level keys with [`MnRecord::field`].
///
/// # Ownership
///
/// Records handed out by a source are treated as read-only by the filter and
/// transform engines. A transform never edits its input; it builds a fresh
/// output record with [`MnRecord::set`] / [`MnRecord::with`].
///
/// # Serde Support
///
/// The record serializes as its bare value (`#[serde(transparent)]`), so a
/// JSONL line and a record are interchangeable without any envelope.
///
/// # Equality
///
/// The derived `PartialEq` is exact JSON equality. Filters use
/// [`values_equal`] instead, which treats `1` and `1.0` as equal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MnRecord {
    /// The record content.
    ///
    /// Mapping keys keep insertion order, and export reproduces that order.
    value: Value,
}

impl Default for MnRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl MnRecord {
    /// Creates an empty mapping record.
    pub fn new() -> Self {
        MnRecord {
            value: Value::Object(Map::new()),
        }
    }

    /// Wraps an arbitrary value as a record.
    pub fn from_value(value: Value) -> Self {
        MnRecord { value }
    }

    /// Borrows the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Unwraps the record into its JSON value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the mapping entries when the record is a mapping.
    pub fn as_mapping(&self) -> Option<&Map<String, Value>> {
        self.value.as_object()
    }

    /// True for mapping records, the only kind writers with named columns
    /// or identifiers can export.
    pub fn is_mapping(&self) -> bool {
        self.value.is_object()
    }

    /// Attribute-style access to a top-level key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.value.as_object().and_then(|map| map.get(key))
    }

    /// Resolves `path` against this record; `None` means absent.
    pub fn resolve(&self, path: &MnPath) -> Option<&Value> {
        path.resolve(&self.value)
    }

    /// Resolves a dotted path. Unparseable paths resolve to absent.
    pub fn get(&self, path: &str) -> Option<&Value> {
        match MnPath::parse(path) {
            Ok(parsed) => parsed.resolve(&self.value),
            Err(err) => {
                log::debug!("unresolvable path '{path}': {err}");
                None
            }
        }
    }

    /// Writes `value` at `path`, overwriting what was there.
    pub fn set(&mut self, path: &MnPath, value: Value) -> Result<()> {
        path.write(&mut self.value, value)
    }

    /// Consuming form of [`MnRecord::set`].
    pub fn with(mut self, path: &MnPath, value: Value) -> Result<Self> {
        self.set(path, value)?;
        Ok(self)
    }

    /// Deep-merges `other` into this record.
    ///
    /// Mappings on both sides are merged key by key, sequences on both sides
    /// are concatenated, anything else is overwritten by `other`.
    pub fn merge(&mut self, other: MnRecord) {
        merge_values(&mut self.value, other.value);
    }
}

fn merge_values(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => existing.extend(incoming),
        (slot, value) => *slot = value,
    }
}

impl From<Value> for MnRecord {
    fn from(value: Value) -> Self {
        MnRecord::from_value(value)
    }
}

impl From<MnRecord> for Value {
    fn from(record: MnRecord) -> Self {
        record.value
    }
}

impl fmt::Display for MnRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string_pretty(&self.value).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Structural equality used by the filter engine.
///
/// Numbers compare by numeric value, so `1` equals `1.0`. Mappings compare key
/// by key regardless of order, sequences element by element.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        (a, b) => a == b,
    }
}

/// Renders a value as flat text for joins and tabular export.
///
/// Strings are emitted verbatim, null as the empty string, numbers and
/// booleans in their canonical form, nested values as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}
