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

//! # Mnema Path Module
//!
//! Paths address a location inside a record. A path is an ordered list of
//! segments, each either a mapping key ([`MnPathSegment::Field`]) or a
//! sequence position ([`MnPathSegment::Index`]).
//!
//! ## Surface Forms
//!
//! - **Dotted**: `"a.b[0].c"`. Segments are separated by `.`, and a segment
//!   may carry one or more `[n]` suffixes that index into the sequence the
//!   field resolves to. Empty parts (`"a..b"`) are skipped. Whitespace is
//!   part of the key, so `"a. b"` addresses the key `" b"`.
//! - **List**: `["a", "b", 0, "c"]`. Used as-is, which is the only way to
//!   address keys that themselves contain `.`, `[` or `]`.
//!
//! Both forms produce the same [`MnPath`] and therefore resolve identically.
//!
//! ## Resolution
//!
//! [`MnPath::resolve`] is total: a missing key, an out-of-range index or a
//! segment applied to the wrong kind of value all yield `None` (absent).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::{MnError, Result};

/// A single step of a [`MnPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MnPathSegment {
    /// Mapping key.
    Field(String),
    /// Zero-based sequence position.
    Index(usize),
}

impl From<&str> for MnPathSegment {
    fn from(key: &str) -> Self {
        MnPathSegment::Field(key.to_string())
    }
}

impl From<String> for MnPathSegment {
    fn from(key: String) -> Self {
        MnPathSegment::Field(key)
    }
}

impl From<usize> for MnPathSegment {
    fn from(index: usize) -> Self {
        MnPathSegment::Index(index)
    }
}

impl fmt::Display for MnPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MnPathSegment::Field(key) => write!(f, "{key}"),
            MnPathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Ordered list of segments addressing a location inside a record.
///
/// The empty path is the root and resolves to the record itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MnPath {
    segments: Vec<MnPathSegment>,
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^\[\]]*)((?:\[\d+\])*)$").expect("segment pattern compiles")
    })
}

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("index pattern compiles"))
}

impl MnPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from explicit segments, bypassing string parsing.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MnPathSegment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses the dotted form, e.g. `"record.title[0]"`.
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = Vec::new();

        for part in path.split('.') {
            if part.is_empty() {
                continue;
            }

            let captures = segment_pattern().captures(part).ok_or_else(|| {
                MnError::path(format!("malformed segment '{part}' in path '{path}'"))
            })?;

            let name = captures.get(1).map_or("", |m| m.as_str());
            if !name.is_empty() {
                segments.push(MnPathSegment::Field(name.to_string()));
            }

            if let Some(indices) = captures.get(2) {
                for index in index_pattern().captures_iter(indices.as_str()) {
                    let position = index[1].parse::<usize>().map_err(|err| {
                        MnError::path(format!("bad index '{}' in path '{path}': {err}", &index[1]))
                    })?;
                    segments.push(MnPathSegment::Index(position));
                }
            }
        }

        if segments.is_empty() {
            return Err(MnError::path("path may not be empty"));
        }

        Ok(Self { segments })
    }

    /// Reads a path from its declarative form: a dotted string or a list of
    /// strings and non-negative integers.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(dotted) => Self::parse(dotted),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(key) => Ok(MnPathSegment::Field(key.clone())),
                    Value::Number(number) => number
                        .as_u64()
                        .map(|index| MnPathSegment::Index(index as usize))
                        .ok_or_else(|| {
                            MnError::path(format!("path index must be a non-negative integer, got {number}"))
                        }),
                    other => Err(MnError::path(format!(
                        "path segments must be strings or integers, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(|segments| Self { segments }),
            other => Err(MnError::path(format!(
                "path must be a dotted string or a list, got {other}"
            ))),
        }
    }

    /// The segments in walking order, outermost first.
    pub fn segments(&self) -> &[MnPathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The root path has no segments.
    pub fn is_root(&self) -> bool {
        self.is_empty()
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<MnPathSegment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a copy with every `{}` in field segments replaced by `index`.
    pub fn with_placeholder(&self, index: usize) -> Self {
        let rendered = index.to_string();
        Self {
            segments: self
                .segments
                .iter()
                .map(|segment| match segment {
                    MnPathSegment::Field(key) => MnPathSegment::Field(key.replace("{}", &rendered)),
                    other => other.clone(),
                })
                .collect(),
        }
    }

    /// Walks the path through `root`. Returns `None` when anything along the
    /// way is missing or of the wrong kind.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match (current, segment) {
                (Value::Object(map), MnPathSegment::Field(key)) => map.get(key),
                (Value::Array(items), MnPathSegment::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    /// Places `value` at this path inside `root`.
    ///
    /// Missing field segments create mappings on the way down; a field
    /// segment over a non-mapping replaces that node with a fresh mapping.
    /// Index segments must address an existing sequence element.
    pub fn write(&self, root: &mut Value, value: Value) -> Result<()> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(MnError::path("cannot write to the root path"));
        };

        let mut current = root;
        for segment in parents {
            current = match segment {
                MnPathSegment::Field(key) => ensure_mapping(current)
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                MnPathSegment::Index(index) => element_mut(current, *index, self)?,
            };
        }

        match last {
            MnPathSegment::Field(key) => {
                ensure_mapping(current).insert(key.clone(), value);
            }
            MnPathSegment::Index(index) => {
                *element_mut(current, *index, self)? = value;
            }
        }

        Ok(())
    }
}

fn ensure_mapping(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn element_mut<'a>(node: &'a mut Value, index: usize, path: &MnPath) -> Result<&'a mut Value> {
    match node {
        Value::Array(items) => {
            let len = items.len();
            items.get_mut(index).ok_or_else(|| {
                MnError::path(format!(
                    "index {index} out of range (len {len}) while writing '{path}'"
                ))
            })
        }
        _ => Err(MnError::path(format!(
            "index {index} applied to a non-sequence while writing '{path}'"
        ))),
    }
}

impl FromStr for MnPath {
    type Err = MnError;

    fn from_str(path: &str) -> Result<Self> {
        Self::parse(path)
    }
}

impl From<Vec<MnPathSegment>> for MnPath {
    fn from(segments: Vec<MnPathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for MnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 && matches!(segment, MnPathSegment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
