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

//! CSV export of mapping records.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{MnError, Result};
use crate::export::writer::{MnRecordSink, MnWriteOutcome};
use crate::record::{render_value, MnRecord};

/// What to do with record keys that have no column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MnExtrasAction {
    #[default]
    Ignore,
    Raise,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MnCsvWriterConfig {
    /// Column names. When unset, the keys of the first record are used.
    pub columns: Option<Vec<String>>,
    /// Written for columns the record has no value for.
    pub default_value: String,
    pub extras_action: MnExtrasAction,
}

/// Writes mapping records as CSV rows under a single header row.
///
/// Values are flattened with [`render_value`]: null becomes the empty
/// string and nested values are written as compact JSON. Nothing, not even
/// the header, is written for an empty source.
pub struct MnCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    config: MnCsvWriterConfig,
    columns: Option<Vec<String>>,
    header_written: bool,
}

impl<W: Write> MnCsvWriter<W> {
    pub fn new(out: W, config: MnCsvWriterConfig) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            columns: config.columns.clone(),
            config,
            header_written: false,
        }
    }

    /// Columns in use; `None` until the first record when not configured.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| MnError::Io(err.error().to_string()))
    }

    fn row(&self, record: &MnRecord, columns: &[String]) -> Result<Vec<String>> {
        let mapping = record.as_mapping().ok_or_else(|| {
            MnError::validation("CSV export requires mapping records")
        })?;

        if self.config.extras_action == MnExtrasAction::Raise {
            let extras: Vec<&str> = mapping
                .keys()
                .filter(|key| !columns.contains(key))
                .map(String::as_str)
                .collect();
            if !extras.is_empty() {
                return Err(MnError::validation(format!(
                    "record contains keys without a column: {}",
                    extras.join(", ")
                )));
            }
        }

        Ok(columns
            .iter()
            .map(|column| match mapping.get(column) {
                Some(value) => render_value(value),
                None => self.config.default_value.clone(),
            })
            .collect())
    }
}

impl MnCsvWriter<File> {
    pub fn create(path: impl AsRef<Path>, config: MnCsvWriterConfig) -> Result<Self> {
        Ok(Self::new(File::create(path)?, config))
    }
}

impl<W: Write> MnRecordSink for MnCsvWriter<W> {
    fn write_record(&mut self, record: &MnRecord) -> Result<MnWriteOutcome> {
        let columns = match &self.columns {
            Some(columns) => columns.clone(),
            None => {
                let keys: Vec<String> = record
                    .as_mapping()
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                self.columns = Some(keys.clone());
                keys
            }
        };

        let row = self.row(record, &columns)?;
        let mut bytes = 0;
        if !self.header_written {
            self.writer.write_record(&columns)?;
            self.header_written = true;
            bytes += line_len(&columns);
        }
        self.writer.write_record(&row)?;
        bytes += line_len(&row);

        Ok(MnWriteOutcome::Written { bytes, files: 0 })
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn line_len(fields: &[String]) -> usize {
    fields.iter().map(String::len).sum::<usize>() + fields.len()
}
