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

//! # Mnema Core Tests - Stream
//!
//! Tests for the lazy record adapters: pull-through behaviour, chaining and
//! error propagation.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test stream
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use mnema::errors::{MnError, Result};
use mnema::operators::filter::MnFilter;
use mnema::operators::transform::{MnFunction, MnTransform};
use mnema::path::MnPath;
use mnema::record::MnRecord;
use mnema::stream::{MnRecordStream, MnRecordsFilter, MnRecordsTransform, MnValueRecords};
use serde_json::{json, Value};

fn path(dotted: &str) -> MnPath {
    MnPath::parse(dotted).unwrap()
}

/// Source over `ids` that logs every id it hands out.
fn logged_source(ids: Vec<u64>, log: Rc<RefCell<Vec<u64>>>) -> impl Iterator<Item = Result<MnRecord>> {
    ids.into_iter().map(move |id| {
        log.borrow_mut().push(id);
        Ok(MnRecord::from(json!({"id": id, "keep": id % 2 == 0})))
    })
}

/// Filtering five records where the second and fourth pass yields exactly
/// those two, then ends, pulling every upstream record once.
#[test]
fn test_filter_yields_matching_records_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut filtered = MnRecordsFilter::new(
        logged_source(vec![1, 2, 3, 4, 5], Rc::clone(&log)),
        MnFilter::equals(path("keep"), json!(true)),
    );

    assert_eq!(filtered.next().unwrap().unwrap().get("id"), Some(&json!(2)));
    assert_eq!(*log.borrow(), vec![1, 2]);
    assert_eq!(filtered.next().unwrap().unwrap().get("id"), Some(&json!(4)));
    assert_eq!(*log.borrow(), vec![1, 2, 3, 4]);
    assert!(filtered.next().is_none());
    assert_eq!(*log.borrow(), vec![1, 2, 3, 4, 5]);
    assert!(filtered.next().is_none());

    assert_eq!(filtered.pulled(), 5);
    assert_eq!(filtered.produced(), 2);
}

/// Nothing is pulled before the consumer asks.
#[test]
fn test_adapters_are_lazy() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let chain = logged_source(vec![1, 2, 3], Rc::clone(&log))
        .filter_records(MnFilter::True)
        .transform_records(MnTransform::copy(path("id"), path("id")));
    assert!(log.borrow().is_empty());

    let first: Vec<_> = chain.take(1).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(*log.borrow(), vec![1]);
}

/// Transform maps one to one and counts what it produced.
#[test]
fn test_transform_maps_each_record() {
    let source = MnValueRecords::new(vec![json!({"a": 1}), json!({"a": 2})].into_iter());
    let mut mapped = MnRecordsTransform::new(
        source,
        MnTransform::constant(path("tag"), json!("x")),
    );
    let outputs: Vec<Value> = mapped
        .by_ref()
        .map(|item| item.unwrap().into_value())
        .collect();
    assert_eq!(outputs, vec![json!({"tag": "x"}), json!({"tag": "x"})]);
    assert_eq!(mapped.pulled(), 2);
    assert_eq!(mapped.produced(), 2);
}

/// Filters and transforms compose in either order.
#[test]
fn test_chained_filter_transform_filter() {
    let source = MnValueRecords::new(
        vec![
            json!({"type": "IMAGE", "lang": ["de"]}),
            json!({"type": "TEXT", "lang": ["en"]}),
            json!({"type": "IMAGE"}),
        ]
        .into_iter(),
    );

    let outputs: Vec<MnRecord> = source
        .filter_records(MnFilter::equals(path("type"), json!("IMAGE")))
        .transform_records(MnTransform::sequence(vec![
            MnTransform::copy(path("lang"), path("lang[0]")),
            MnTransform::fill(path("lang"), json!("NA")),
        ]))
        .filter_records(MnFilter::not_equals(path("lang"), json!("NA")))
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(outputs, vec![MnRecord::from(json!({"lang": "de"}))]);
}

/// Upstream and evaluation errors travel downstream as items.
#[test]
fn test_errors_flow_through_the_chain() {
    let failing = MnFunction::new("fail_on_b", |record: &MnRecord| {
        if record.get("name") == Some(&json!("b")) {
            Err(MnError::function("fail_on_b", "rejected"))
        } else {
            Ok(json!(true))
        }
    });
    let source = vec![
        Ok(MnRecord::from(json!({"name": "a"}))),
        Err(MnError::internal("broken upstream")),
        Ok(MnRecord::from(json!({"name": "b"}))),
        Ok(MnRecord::from(json!({"name": "c"}))),
    ];

    let outcome: Vec<std::result::Result<Value, String>> = source
        .into_iter()
        .filter_records(MnFilter::True)
        .transform_records(MnTransform::custom(path("ok"), failing))
        .map(|item| item.map(MnRecord::into_value).map_err(|err| err.to_string()))
        .collect();

    assert_eq!(outcome.len(), 4);
    assert_eq!(outcome[0], Ok(json!({"ok": true})));
    assert_eq!(outcome[1], Err("internal error: broken upstream".to_string()));
    assert_eq!(outcome[2], Err("function 'fail_on_b' failed: rejected".to_string()));
    assert_eq!(outcome[3], Ok(json!({"ok": true})));
}

/// Limit stops after the requested number of records.
#[test]
fn test_limit_records() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let taken: Vec<_> = logged_source(vec![1, 2, 3, 4], Rc::clone(&log))
        .limit_records(2)
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(taken.len(), 2);
    assert_eq!(*log.borrow(), vec![1, 2]);
}
