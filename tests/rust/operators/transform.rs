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

//! # Mnema Operator Tests - Transform
//!
//! Tests for the transform expression engine: leaf writes, the difference
//! between `parallel` and `sequence`, custom functions and the declarative
//! form.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test transform
//! ```

use mnema::errors::{MnError, Result};
use mnema::operators::transform::{MnFunction, MnTransform};
use mnema::path::MnPath;
use mnema::record::MnRecord;
use mnema::registry::MnFunctionRegistry;
use serde_json::{json, Value};

fn path(dotted: &str) -> MnPath {
    MnPath::parse(dotted).unwrap()
}

fn apply(expr: Value, source: Value) -> Value {
    let registry = MnFunctionRegistry::new();
    MnTransform::from_value(&expr, &registry)
        .unwrap()
        .evaluate(&MnRecord::from(source))
        .unwrap()
        .into_value()
}

fn word_count(record: &MnRecord) -> Result<Value> {
    let title = record
        .get("title[0]")
        .and_then(Value::as_str)
        .ok_or_else(|| MnError::function("word_count", "title[0] is not a string"))?;
    Ok(json!(title.split_whitespace().count()))
}

/// Copy from an out-of-range index yields null, which fill then replaces.
#[test]
fn test_copy_then_fill_defaults_missing_language() {
    let output = apply(
        json!(["sequence", ["copy", "lang", "dcLanguage[0]"], ["fill", "lang", "NA"]]),
        json!({"dcLanguage": []}),
    );
    assert_eq!(output, json!({"lang": "NA"}));

    let output = apply(
        json!(["sequence", ["copy", "lang", "dcLanguage[0]"], ["fill", "lang", "NA"]]),
        json!({"dcLanguage": ["de"]}),
    );
    assert_eq!(output, json!({"lang": "de"}));
}

/// Join renders each source and separates them with the joiner.
#[test]
fn test_join_coordinates() {
    let output = apply(
        json!(["join", "lat_lon", ",", "lat", "lon"]),
        json!({"lat": "51.5", "lon": "-0.1"}),
    );
    assert_eq!(output, json!({"lat_lon": "51.5,-0.1"}));
}

/// Absent join sources render as empty strings, numbers canonically.
#[test]
fn test_join_with_absent_and_numeric_sources() {
    let output = apply(
        json!(["join", "label", "-", "a", "missing", "n"]),
        json!({"a": "x", "n": 3}),
    );
    assert_eq!(output, json!({"label": "x--3"}));
}

/// A custom function computes the written value from the source record.
#[test]
fn test_custom_function_counts_title_words() {
    let transform = MnTransform::custom(path("title_tokens"), MnFunction::new("word_count", word_count));
    let output = transform
        .evaluate(&MnRecord::from(json!({"title": ["Hello World"]})))
        .unwrap();
    assert_eq!(output.as_value(), &json!({"title_tokens": 2}));
}

/// Errors raised by custom functions reach the caller unchanged.
#[test]
fn test_custom_function_errors_propagate() {
    let transform = MnTransform::custom(path("n"), MnFunction::new("word_count", word_count));
    let err = transform.evaluate(&MnRecord::from(json!({}))).unwrap_err();
    match err {
        MnError::Function { name, message } => {
            assert_eq!(name, "word_count");
            assert_eq!(message, "title[0] is not a string");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Custom functions are looked up by name in the declarative form.
#[test]
fn test_custom_function_from_registry() {
    let mut registry = MnFunctionRegistry::new();
    registry.register("word_count", word_count);
    let transform =
        MnTransform::from_value(&json!(["custom", "meta.words", "word_count"]), &registry).unwrap();
    let output = transform
        .evaluate(&MnRecord::from(json!({"title": ["a b c"]})))
        .unwrap();
    assert_eq!(output.as_value(), &json!({"meta": {"words": 3}}));

    let unknown = MnTransform::from_value(&json!(["custom", "x", "nope"]), &registry);
    assert!(matches!(unknown, Err(MnError::InvalidExpression { .. })));
}

/// Static writes literals; fill leaves present values alone.
#[test]
fn test_static_and_fill() {
    let output = apply(
        json!(["sequence", ["static", "kind", "image"], ["fill", "kind", "other"], ["fill", "rights", "unknown"]]),
        json!({}),
    );
    assert_eq!(output, json!({"kind": "image", "rights": "unknown"}));
}

/// Applying the same fill twice is the same as applying it once.
#[test]
fn test_fill_is_idempotent() {
    let once = apply(json!(["sequence", ["copy", "a", "x"], ["fill", "a", 1]]), json!({}));
    let twice = apply(
        json!(["sequence", ["copy", "a", "x"], ["fill", "a", 1], ["fill", "a", 1]]),
        json!({}),
    );
    assert_eq!(once, twice);
    assert_eq!(once, json!({"a": 1}));
}

/// In a sequence the last write to a target wins.
#[test]
fn test_sequence_last_write_wins() {
    let output = apply(
        json!(["sequence", ["static", "a", 1], ["static", "a", 2]]),
        json!({}),
    );
    assert_eq!(output, json!({"a": 2}));
}

/// Parallel children do not see each other's writes; the last declared wins.
#[test]
fn test_parallel_isolation_and_overlap() {
    let output = apply(
        json!(["parallel", ["static", "lang", "de"], ["fill", "lang", "NA"]]),
        json!({}),
    );
    assert_eq!(output, json!({"lang": "NA"}));

    let output = apply(
        json!(["parallel", ["static", "a", 1], ["static", "a", 2], ["static", "b", 3]]),
        json!({}),
    );
    assert_eq!(output, json!({"a": 2, "b": 3}));

    let output = apply(
        json!(["sequence", ["static", "lang", "de"], ["fill", "lang", "NA"]]),
        json!({}),
    );
    assert_eq!(output, json!({"lang": "de"}));
}

/// An array of expressions is an implicit parallel.
#[test]
fn test_implicit_parallel_list() {
    let output = apply(
        json!([["copy", "id", "record.id"], ["copy", "title", "record.title[0]"]]),
        json!({"record": {"id": "r1", "title": ["T"]}}),
    );
    assert_eq!(output, json!({"id": "r1", "title": "T"}));
}

/// Split writes each part to an indexed target.
#[test]
fn test_split_into_numbered_targets() {
    let output = apply(
        json!(["split", "subject_{}", ";", "subjects"]),
        json!({"subjects": "maps;ships"}),
    );
    assert_eq!(output, json!({"subject_1": "maps", "subject_2": "ships"}));

    let output = apply(
        json!(["split", "creator.{}", ";", "creators"]),
        json!({"creators": ["Ada", "Grace"]}),
    );
    assert_eq!(output, json!({"creator": {"1": "Ada", "2": "Grace"}}));

    let output = apply(json!(["split", "s_{}", ";", "missing"]), json!({}));
    assert_eq!(output, json!({}));
}

/// Combine collects several values into one sequence.
#[test]
fn test_combine_collects_values() {
    let output = apply(
        json!(["combine", "point", "lat", "lon", "alt"]),
        json!({"lat": 51.5, "lon": -0.1}),
    );
    assert_eq!(output, json!({"point": [51.5, -0.1, null]}));
}

/// Nested targets are created on demand and copied values are deep copies.
#[test]
fn test_nested_targets_and_deep_copy() {
    let source = MnRecord::from(json!({"meta": {"a": [1, {"b": 2}]}}));
    let transform = MnTransform::sequence(vec![
        MnTransform::copy(path("out.meta"), path("meta")),
        MnTransform::constant(path("out.meta.a"), json!("replaced")),
    ]);
    let output = transform.evaluate(&source).unwrap();
    assert_eq!(output.as_value(), &json!({"out": {"meta": {"a": "replaced"}}}));
    assert_eq!(source.get("meta.a[1].b"), Some(&json!(2)));
}

/// Malformed transform expressions are rejected.
#[test]
fn test_malformed_transforms() {
    let registry = MnFunctionRegistry::new();
    for expr in [
        json!([]),
        json!(["copy", "a"]),
        json!(["static", "a", 1, 2]),
        json!(["join", "a", ","]),
        json!(["join", "a", 1, "b"]),
        json!(["split", "a", ",", "b", "c"]),
        json!(["combine", "a"]),
        json!(["explode", "a"]),
        json!(["copy", 5, "a"]),
        json!(["sequence", "a"]),
        json!({"copy": ["a", "b"]}),
    ] {
        assert!(
            matches!(
                MnTransform::from_value(&expr, &registry),
                Err(MnError::InvalidExpression { .. })
            ),
            "{expr}"
        );
    }
}

/// Writing through an index that does not exist in the output fails.
#[test]
fn test_unwritable_target_is_an_error() {
    let transform = MnTransform::sequence(vec![
        MnTransform::constant(path("a"), json!([])),
        MnTransform::constant(path("a[2]"), json!(1)),
    ]);
    assert!(matches!(
        transform.evaluate(&MnRecord::new()),
        Err(MnError::Path { .. })
    ));
}
