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

//! # Mnema Core Tests - Record
//!
//! Tests for the record model: attribute-style access, path access, building
//! output records and merging.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test record
//! ```

use mnema::path::MnPath;
use mnema::record::{render_value, values_equal, MnRecord};
use serde_json::json;

/// A new record is an empty mapping.
#[test]
fn test_new_record_is_empty_mapping() {
    let record = MnRecord::new();
    assert!(record.is_mapping());
    assert_eq!(record.as_mapping().map(|map| map.len()), Some(0));
    assert_eq!(MnRecord::default(), record);
}

/// Attribute-style and dotted access reach the same values.
#[test]
fn test_field_and_dotted_access() {
    let record = MnRecord::from(json!({
        "record": {"metadata": {"title": ["Hello", "World"]}},
        "type": "TEXT"
    }));

    assert_eq!(record.field("type"), Some(&json!("TEXT")));
    assert_eq!(record.get("record.metadata.title[1]"), Some(&json!("World")));
    assert_eq!(record.get("record.missing"), None);
    assert_eq!(record.get("type.nested"), None);
}

/// Unparseable paths read as absent instead of failing.
#[test]
fn test_get_with_malformed_path_is_absent() {
    let record = MnRecord::from(json!({"a": 1}));
    assert_eq!(record.get("a[x]"), None);
    assert_eq!(record.get(""), None);
}

/// Writing creates intermediate mappings and keeps insertion order.
#[test]
fn test_set_builds_nested_output_in_order() {
    let mut record = MnRecord::new();
    record.set(&MnPath::parse("z").unwrap(), json!(1)).unwrap();
    record.set(&MnPath::parse("a.b").unwrap(), json!(2)).unwrap();
    record.set(&MnPath::parse("a.c").unwrap(), json!(3)).unwrap();

    let keys: Vec<&String> = record.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a"]);
    assert_eq!(record.to_string(), "{\n  \"z\": 1,\n  \"a\": {\n    \"b\": 2,\n    \"c\": 3\n  }\n}");
}

/// Merging combines nested mappings and concatenates sequences.
#[test]
fn test_merge_is_deep() {
    let mut record = MnRecord::from(json!({"a": {"x": 1}, "list": [1], "s": "old"}));
    record.merge(MnRecord::from(json!({"a": {"y": 2}, "list": [2], "s": "new"})));
    assert_eq!(
        record.as_value(),
        &json!({"a": {"x": 1, "y": 2}, "list": [1, 2], "s": "new"})
    );
}

/// Records round-trip through serde transparently.
#[test]
fn test_record_serializes_as_plain_json() {
    let record = MnRecord::from(json!({"id": "a1", "n": [1, 2]}));
    let text = serde_json::to_string(&record).unwrap();
    assert_eq!(text, r#"{"id":"a1","n":[1,2]}"#);
    let back: MnRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back, record);
}

/// Equality helpers used by filters and exports.
#[test]
fn test_value_helpers() {
    assert!(values_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2.0, "a": 1})));
    assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
    assert_eq!(render_value(&json!(true)), "true");
    assert_eq!(render_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
}
