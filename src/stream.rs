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

//! # Mnema Stream Module
//!
//! Lazy adapters over record sources. A source is any
//! `Iterator<Item = Result<MnRecord>>`; failures from upstream travel as
//! `Err` items and are handed to the consumer untouched.
//!
//! Adapters pull one upstream record at a time and never buffer ahead, so a
//! chain of them over a file reader processes arbitrarily large inputs in
//! constant memory.
//!
//! ## Usage
//!
//! ```rust
//! use mnema::operators::filter::MnFilter;
//! use mnema::operators::transform::MnTransform;
//! use mnema::path::MnPath;
//! use mnema::record::MnRecord;
//! use mnema::stream::MnRecordStream;
//! use serde_json::json;
//!
//! let source = vec![
//!     Ok(MnRecord::from(json!({"type": "IMAGE", "id": 1}))),
//!     Ok(MnRecord::from(json!({"type": "TEXT", "id": 2}))),
//! ];
//! let id = MnPath::parse("id").unwrap();
//! let images: Vec<_> = source
//!     .into_iter()
//!     .filter_records(MnFilter::equals(MnPath::parse("type").unwrap(), json!("IMAGE")))
//!     .transform_records(MnTransform::copy(id.clone(), id))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(images, vec![MnRecord::from(json!({"id": 1}))]);
//! ```

use serde_json::{Map, Value};

use crate::errors::Result;
use crate::operators::filter::MnFilter;
use crate::operators::transform::MnTransform;
use crate::record::MnRecord;

/// Boxed record source, as produced by readers and pipeline runs.
pub type MnRecordIter<'a> = Box<dyn Iterator<Item = Result<MnRecord>> + 'a>;

/// Yields only the records from `source` that satisfy a filter.
///
/// Each call to `next` pulls upstream until a record passes or the source
/// ends. Records that fail the filter are dropped with a trace log line.
/// `Err` items pass through immediately and are not counted.
///
/// The adapter keeps running counters so a caller can report how selective a
/// stage was once the stream is drained:
///
/// ```rust
/// use mnema::operators::filter::MnFilter;
/// use mnema::path::MnPath;
/// use mnema::record::MnRecord;
/// use mnema::stream::MnRecordsFilter;
/// use serde_json::json;
///
/// let source = vec![Ok(MnRecord::from(json!({"a": 1}))), Ok(MnRecord::from(json!({})))];
/// let exists = MnFilter::exists(MnPath::parse("a").unwrap());
/// let mut filtered = MnRecordsFilter::new(source.into_iter(), exists);
/// assert_eq!(filtered.by_ref().count(), 1);
/// assert_eq!((filtered.pulled(), filtered.produced()), (2, 1));
/// ```
#[derive(Debug)]
pub struct MnRecordsFilter<I> {
    /// Upstream record source.
    source: I,
    /// Predicate every yielded record satisfies.
    filter: MnFilter,
    /// Records taken from `source`, passed or not.
    pulled: usize,
    /// Records handed downstream.
    produced: usize,
}

impl<I> MnRecordsFilter<I>
where
    I: Iterator<Item = Result<MnRecord>>,
{
    pub fn new(source: I, filter: MnFilter) -> Self {
        Self {
            source,
            filter,
            pulled: 0,
            produced: 0,
        }
    }

    /// Records taken from upstream so far, including discarded ones.
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    /// Records that passed the filter so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn filter(&self) -> &MnFilter {
        &self.filter
    }

    /// Returns the upstream source, positioned after the last pulled record.
    pub fn into_inner(self) -> I {
        self.source
    }
}

impl<I> Iterator for MnRecordsFilter<I>
where
    I: Iterator<Item = Result<MnRecord>>,
{
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.source.next()? {
                Ok(record) => record,
                Err(err) => return Some(Err(err)),
            };
            self.pulled += 1;

            if self.filter.evaluate(&record) {
                self.produced += 1;
                return Some(Ok(record));
            }
            log::trace!(
                "filter '{}' discarded record #{}",
                self.filter.tag(),
                self.pulled
            );
        }
    }
}

/// Maps every record from `source` through a transform.
///
/// Output is one-to-one with input: a record the transform rejects (for
/// example a custom function error) becomes an `Err` item in its place and
/// the stream continues with the next record.
#[derive(Debug)]
pub struct MnRecordsTransform<I> {
    /// Upstream record source.
    source: I,
    /// Expression applied to each record.
    transform: MnTransform,
    /// Records taken from `source`.
    pulled: usize,
    /// Records transformed without error.
    produced: usize,
}

impl<I> MnRecordsTransform<I>
where
    I: Iterator<Item = Result<MnRecord>>,
{
    pub fn new(source: I, transform: MnTransform) -> Self {
        Self {
            source,
            transform,
            pulled: 0,
            produced: 0,
        }
    }

    /// Records taken from upstream so far.
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    /// Records transformed successfully so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn transform(&self) -> &MnTransform {
        &self.transform
    }

    pub fn into_inner(self) -> I {
        self.source
    }
}

impl<I> Iterator for MnRecordsTransform<I>
where
    I: Iterator<Item = Result<MnRecord>>,
{
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.source.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err)),
        };
        self.pulled += 1;

        let output = self.transform.evaluate(&record);
        if output.is_ok() {
            self.produced += 1;
        } else {
            log::trace!("transform failed on record #{}", self.pulled);
        }
        Some(output)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.source.size_hint()
    }
}

/// Stops after `count` records have been yielded; upstream is not pulled
/// past that point.
#[derive(Debug)]
pub struct MnRecordsLimit<I> {
    source: I,
    /// Successful records still to be yielded; `Err` items do not count.
    remaining: usize,
}

impl<I> MnRecordsLimit<I>
where
    I: Iterator<Item = Result<MnRecord>>,
{
    pub fn new(source: I, count: usize) -> Self {
        Self {
            source,
            remaining: count,
        }
    }
}

impl<I> Iterator for MnRecordsLimit<I>
where
    I: Iterator<Item = Result<MnRecord>>,
{
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.source.next()?;
        if item.is_ok() {
            self.remaining -= 1;
        }
        Some(item)
    }
}

/// Turns plain JSON values into a record source. Mappings become records as
/// they are; any other value is wrapped as `{"value": v}`.
#[derive(Debug)]
pub struct MnValueRecords<I> {
    values: I,
}

impl<I> MnValueRecords<I>
where
    I: Iterator<Item = Value>,
{
    pub fn new(values: I) -> Self {
        Self { values }
    }
}

impl<I> Iterator for MnValueRecords<I>
where
    I: Iterator<Item = Value>,
{
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.values.next().map(|value| Ok(value_record(value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

pub(crate) fn value_record(value: Value) -> MnRecord {
    match value {
        Value::Object(_) => MnRecord::from_value(value),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_string(), other);
            MnRecord::from_value(Value::Object(wrapped))
        }
    }
}

/// Chaining helpers available on every record source.
pub trait MnRecordStream: Iterator<Item = Result<MnRecord>> + Sized {
    fn filter_records(self, filter: MnFilter) -> MnRecordsFilter<Self> {
        MnRecordsFilter::new(self, filter)
    }

    fn transform_records(self, transform: MnTransform) -> MnRecordsTransform<Self> {
        MnRecordsTransform::new(self, transform)
    }

    fn limit_records(self, count: usize) -> MnRecordsLimit<Self> {
        MnRecordsLimit::new(self, count)
    }
}

impl<I> MnRecordStream for I where I: Iterator<Item = Result<MnRecord>> {}
