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

//! # Mnema IO Tests - Export
//!
//! Tests for the record sinks, including a full read-filter-transform-write
//! round through the filesystem.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test export
//! ```

use std::fs;

use mnema::errors::{MnError, Result};
use mnema::export::{
    write_all, MnCsvWriter, MnCsvWriterConfig, MnExtrasAction, MnJsonDirWriter, MnJsonlWriter,
};
use mnema::ingest::MnStreamReader;
use mnema::operators::filter::MnFilter;
use mnema::operators::transform::MnTransform;
use mnema::path::MnPath;
use mnema::record::MnRecord;
use mnema::stream::{MnRecordStream, MnValueRecords};
use serde_json::{json, Value};

fn path(dotted: &str) -> MnPath {
    MnPath::parse(dotted).unwrap()
}

fn source(values: Vec<Value>) -> MnValueRecords<std::vec::IntoIter<Value>> {
    MnValueRecords::new(values.into_iter())
}

/// Each record lands at the path derived from its identifier digest.
#[test]
fn test_json_directory_writer() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = MnJsonDirWriter::new(dir.path(), path("record.id"));

    let stats = write_all(
        &mut writer,
        source(vec![
            json!({"record": {"id": "test"}, "title": "a"}),
            json!({"record": {}, "title": "no id"}),
            json!({"record": {"id": ""}, "title": "empty id"}),
            json!({"record": {"id": "other"}, "title": "b"}),
        ]),
    )
    .unwrap();

    assert_eq!(stats.records_seen, 4);
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.records_skipped, 2);
    assert_eq!(stats.files_created, 2);

    let file = writer.file_path("test");
    assert!(file.starts_with(dir.path().join("9f86").join("d081")));
    let stored: Value = serde_json::from_slice(&fs::read(&file).unwrap()).unwrap();
    assert_eq!(stored, json!({"record": {"id": "test"}, "title": "a"}));
}

/// Rewriting a record overwrites its file instead of creating another.
#[test]
fn test_json_directory_writer_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = MnJsonDirWriter::new(dir.path(), path("id"));
    write_all(&mut writer, source(vec![json!({"id": "x", "v": 1})])).unwrap();
    let stats = write_all(&mut writer, source(vec![json!({"id": "x", "v": 2})])).unwrap();
    assert_eq!(stats.files_created, 0);

    let stored: Value = serde_json::from_slice(&fs::read(writer.file_path("x")).unwrap()).unwrap();
    assert_eq!(stored, json!({"id": "x", "v": 2}));
}

/// Directory output can be read back as a record source.
#[test]
fn test_json_directory_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = MnJsonDirWriter::new(dir.path(), path("id"));
    write_all(
        &mut writer,
        source(vec![json!({"id": "a"}), json!({"id": "b"}), json!({"id": "c"})]),
    )
    .unwrap();

    let mut ids: Vec<Value> = MnStreamReader::open(dir.path())
        .unwrap()
        .map(|item| item.unwrap().get("id").cloned().unwrap())
        .collect();
    ids.sort_by_key(|id| id.to_string());
    assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
}

/// CSV output uses configured columns, defaults and value rendering.
#[test]
fn test_csv_writer_with_columns() {
    let config = MnCsvWriterConfig {
        columns: Some(vec!["id".into(), "title".into(), "tags".into()]),
        default_value: "n/a".into(),
        extras_action: MnExtrasAction::Ignore,
    };
    let mut writer = MnCsvWriter::new(Vec::new(), config);
    write_all(
        &mut writer,
        source(vec![
            json!({"id": 1, "title": "Map, coloured", "tags": ["a", "b"], "extra": true}),
            json!({"id": 2, "title": null}),
        ]),
    )
    .unwrap();

    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(
        text,
        "id,title,tags\n1,\"Map, coloured\",\"[\"\"a\"\",\"\"b\"\"]\"\n2,,n/a\n"
    );
}

/// Non-mapping records cannot be written as CSV rows.
#[test]
fn test_csv_writer_rejects_scalars() {
    let mut writer = MnCsvWriter::new(Vec::new(), MnCsvWriterConfig::default());
    let result = write_all(&mut writer, vec![Ok(MnRecord::from(json!([1, 2])))]);
    assert!(matches!(result, Err(MnError::Validation { .. })));
}

/// Read JSONL, keep images, reshape, and write JSONL.
#[test]
fn test_read_filter_transform_write() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jsonl");
    fs::write(
        &input,
        concat!(
            "{\"id\": \"1\", \"type\": \"IMAGE\", \"lat\": \"51.5\", \"lon\": \"-0.1\"}\n",
            "{\"id\": \"2\", \"type\": \"TEXT\"}\n",
            "{\"id\": \"3\", \"type\": \"IMAGE\", \"lat\": \"48.1\"}\n",
        ),
    )
    .unwrap();
    let output = dir.path().join("out.jsonl");

    let records = MnStreamReader::open(&input)
        .unwrap()
        .filter_records(MnFilter::equals(path("type"), json!("IMAGE")))
        .transform_records(MnTransform::parallel(vec![
            MnTransform::copy(path("id"), path("id")),
            MnTransform::join(path("lat_lon"), ",", vec![path("lat"), path("lon")]),
        ]));

    let mut writer = MnJsonlWriter::create(&output).unwrap();
    let stats = write_all(&mut writer, records).unwrap();
    assert_eq!(stats.records_written, 2);
    drop(writer);

    let written: Vec<MnRecord> = MnStreamReader::open(&output)
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(written[0].as_value(), &json!({"id": "1", "lat_lon": "51.5,-0.1"}));
    assert_eq!(written[1].as_value(), &json!({"id": "3", "lat_lon": "48.1,"}));
}
