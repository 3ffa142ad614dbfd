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

//! # Record Writer Module
//!
//! Sinks that consume a record source: line-delimited JSON and one JSON file
//! per record under a hashed directory tree.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{MnError, Result};
use crate::path::MnPath;
use crate::record::{render_value, MnRecord};

/// Statistics about write operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnWriteStats {
    /// Records handed to the sink.
    pub records_seen: usize,
    /// Records actually written.
    pub records_written: usize,
    /// Records the sink chose not to write.
    pub records_skipped: usize,
    /// Bytes of serialized output.
    pub bytes_written: usize,
    /// Files created.
    pub files_created: usize,
}

/// Outcome of handing one record to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnWriteOutcome {
    Written { bytes: usize, files: usize },
    Skipped,
}

/// A destination for records.
pub trait MnRecordSink {
    fn write_record(&mut self, record: &MnRecord) -> Result<MnWriteOutcome>;

    /// Flushes buffered output. Called once after the last record.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drains `source` into `sink`. The first error, from the source or from
/// the sink, stops the write and is returned.
pub fn write_all<S, I>(sink: &mut S, source: I) -> Result<MnWriteStats>
where
    S: MnRecordSink + ?Sized,
    I: IntoIterator<Item = Result<MnRecord>>,
{
    let mut stats = MnWriteStats::default();
    for item in source {
        let record = item?;
        stats.records_seen += 1;
        match sink.write_record(&record)? {
            MnWriteOutcome::Written { bytes, files } => {
                stats.records_written += 1;
                stats.bytes_written += bytes;
                stats.files_created += files;
            }
            MnWriteOutcome::Skipped => stats.records_skipped += 1,
        }
    }
    sink.finish()?;
    Ok(stats)
}

/// Writes one compact JSON document per line.
pub struct MnJsonlWriter<W: Write> {
    out: W,
}

impl<W: Write> MnJsonlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl MnJsonlWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> MnRecordSink for MnJsonlWriter<W> {
    fn write_record(&mut self, record: &MnRecord) -> Result<MnWriteOutcome> {
        let line = serde_json::to_string(record)?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(MnWriteOutcome::Written {
            bytes: line.len() + 1,
            files: 0,
        })
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Writes each record to its own JSON file.
///
/// The file location is derived from the SHA-256 digest of the identifier
/// found at `id_path`: the 64 hex characters are cut into 4-character
/// directory levels and the file is named after the full digest, e.g.
/// `<root>/9f86/d081/.../9f86d081...0a08.json`. Records without an
/// identifier (absent, null or empty) are skipped.
#[derive(Debug, Clone)]
pub struct MnJsonDirWriter {
    directory: PathBuf,
    id_path: MnPath,
}

impl MnJsonDirWriter {
    pub fn new(directory: impl Into<PathBuf>, id_path: MnPath) -> Self {
        Self {
            directory: directory.into(),
            id_path,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Location the record with `identifier` is written to.
    pub fn file_path(&self, identifier: &str) -> PathBuf {
        let digest = ring::digest::digest(&ring::digest::SHA256, identifier.as_bytes());
        let hex = hex::encode(digest.as_ref());

        let mut path = self.directory.clone();
        for start in (0..hex.len()).step_by(4) {
            path.push(&hex[start..start + 4]);
        }
        path.push(format!("{hex}.json"));
        path
    }

    fn identifier(&self, record: &MnRecord) -> Option<String> {
        match record.resolve(&self.id_path)? {
            Value::Null | Value::Bool(false) => None,
            value => Some(render_value(value)).filter(|id| !id.is_empty()),
        }
    }
}

impl MnRecordSink for MnJsonDirWriter {
    fn write_record(&mut self, record: &MnRecord) -> Result<MnWriteOutcome> {
        let Some(identifier) = self.identifier(record) else {
            log::debug!("record without identifier at '{}' skipped", self.id_path);
            return Ok(MnWriteOutcome::Skipped);
        };

        let path = self.file_path(&identifier);
        let parent = path
            .parent()
            .ok_or_else(|| MnError::internal(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(parent)?;

        let created = !path.exists();
        let body = serde_json::to_vec(record)?;
        fs::write(&path, &body)?;

        Ok(MnWriteOutcome::Written {
            bytes: body.len(),
            files: usize::from(created),
        })
    }
}
