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

//! Lazy record readers for JSONL, JSON, CSV and directory-of-JSON inputs.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Lines, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{MnError, Result};
use crate::ingest::format::{MnCompression, MnDataFormat, MnFormatDetector};
use crate::record::MnRecord;
use crate::stream::{MnRecordIter, MnValueRecords};

/// Error tolerance of the line-oriented readers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MnReaderConfig {
    /// Skip malformed input with a warning instead of yielding an error.
    pub skip_errors: bool,
    /// Number of skipped inputs after which the reader gives up.
    pub max_errors: usize,
}

impl Default for MnReaderConfig {
    fn default() -> Self {
        Self {
            skip_errors: true,
            max_errors: 100,
        }
    }
}

/// Opens `path` for buffered reading, decompressing as requested.
pub fn open_input(path: &Path, compression: MnCompression) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    match compression {
        MnCompression::None => Ok(Box::new(BufReader::new(file))),
        #[cfg(feature = "compression")]
        MnCompression::Gzip => Ok(Box::new(BufReader::new(
            flate2::read::MultiGzDecoder::new(file),
        ))),
        #[cfg(feature = "compression")]
        MnCompression::Zstd => Ok(Box::new(BufReader::new(
            zstd::stream::read::Decoder::new(file)?,
        ))),
        #[cfg(not(feature = "compression"))]
        other => Err(MnError::validation(format!(
            "{other:?} input requires the 'compression' feature: {}",
            path.display()
        ))),
    }
}

/// Reads one JSON document per line.
///
/// Blank lines are ignored. Malformed lines are skipped with a warning while
/// [`MnReaderConfig::skip_errors`] is set; once more than
/// [`MnReaderConfig::max_errors`] lines were skipped the reader yields a
/// final error and ends.
///
/// A failure of the underlying reader (a truncated gzip stream, a vanished
/// file) is yielded once as [`MnError::Io`] and ends the stream regardless of
/// `skip_errors`.
pub struct MnJsonlReader<R> {
    lines: Lines<R>,
    config: MnReaderConfig,
    line_number: usize,
    records_read: usize,
    error_count: usize,
    exhausted: bool,
}

impl<R: BufRead> MnJsonlReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            config: MnReaderConfig::default(),
            line_number: 0,
            records_read: 0,
            error_count: 0,
            exhausted: false,
        }
    }

    pub fn with_config(mut self, config: MnReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    fn reject(&mut self, message: String) -> Option<MnError> {
        self.error_count += 1;
        if !self.config.skip_errors {
            return Some(MnError::Serde(format!("line {}: {message}", self.line_number)));
        }
        if self.error_count > self.config.max_errors {
            self.exhausted = true;
            return Some(MnError::validation(format!(
                "too many errors ({}): last error at line {}: {message}",
                self.error_count, self.line_number
            )));
        }
        log::warn!("skipping invalid JSON line {}: {message}", self.line_number);
        None
    }
}

impl MnJsonlReader<Box<dyn BufRead>> {
    /// Opens a JSONL file, honouring a `.gz` / `.zst` suffix.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let info = MnFormatDetector::new().detect_from_path(path);
        Ok(Self::new(open_input(path, info.compression)?))
    }
}

impl<R: BufRead> Iterator for MnJsonlReader<R> {
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                // undecodable text only spoils its own line
                Some(Err(err)) if err.kind() == ErrorKind::InvalidData => {
                    self.line_number += 1;
                    match self.reject(err.to_string()) {
                        Some(err) => return Some(Err(err)),
                        None => continue,
                    }
                }
                Some(Err(err)) => {
                    self.line_number += 1;
                    self.error_count += 1;
                    self.exhausted = true;
                    return Some(Err(MnError::Io(format!("line {}: {err}", self.line_number))));
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    self.records_read += 1;
                    return Some(Ok(MnRecord::from_value(value)));
                }
                Err(err) => {
                    if let Some(err) = self.reject(err.to_string()) {
                        return Some(Err(err));
                    }
                }
            }
        }
        None
    }
}

/// Reads every `.json` file below a directory, one record per file, in
/// sorted path order.
#[derive(Debug)]
pub struct MnJsonDirReader {
    files: std::vec::IntoIter<PathBuf>,
}

impl MnJsonDirReader {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(MnError::validation(format!(
                "not a directory: {}",
                dir.display()
            )));
        }
        let mut files = Vec::new();
        collect_json_files(dir, &mut files)?;
        files.sort();
        Ok(Self {
            files: files.into_iter(),
        })
    }

    /// Files not yet read.
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}

impl Iterator for MnJsonDirReader {
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        let record = fs::read_to_string(&path)
            .map_err(MnError::from)
            .and_then(|text| {
                serde_json::from_str::<Value>(&text)
                    .map_err(|err| MnError::Serde(format!("{}: {err}", path.display())))
            })
            .map(MnRecord::from_value);
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

/// Reads CSV rows as mappings keyed by the header row. All values are
/// strings.
#[cfg(feature = "csv")]
pub struct MnCsvReader<R: std::io::Read> {
    headers: Vec<String>,
    rows: csv::StringRecordsIntoIter<R>,
}

#[cfg(feature = "csv")]
impl<R: std::io::Read> MnCsvReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        Ok(Self {
            headers,
            rows: reader.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

#[cfg(feature = "csv")]
impl MnCsvReader<Box<dyn BufRead>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let info = MnFormatDetector::new().detect_from_path(path);
        Self::new(open_input(path, info.compression)?)
    }
}

#[cfg(feature = "csv")]
impl<R: std::io::Read> Iterator for MnCsvReader<R> {
    type Item = Result<MnRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(err) => return Some(Err(err.into())),
        };
        let mapping = self
            .headers
            .iter()
            .zip(row.iter())
            .map(|(key, field)| (key.clone(), Value::String(field.to_string())))
            .collect();
        Some(Ok(MnRecord::from_value(Value::Object(mapping))))
    }
}

/// Opens any supported input as a record source.
#[derive(Clone, Debug, Default)]
pub struct MnStreamReader {
    config: MnReaderConfig,
    detector: MnFormatDetector,
}

impl MnStreamReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: MnReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_detector(mut self, detector: MnFormatDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Shorthand for `MnStreamReader::new().read_path(path)`.
    pub fn open(path: impl AsRef<Path>) -> Result<MnRecordIter<'static>> {
        Self::new().read_path(path)
    }

    /// Directories are read with [`MnJsonDirReader`]; files are dispatched
    /// on their (possibly compressed) extension, falling back to the leading
    /// bytes of the content when the extension is not recognised.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<MnRecordIter<'static>> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(Box::new(MnJsonDirReader::new(path)?));
        }

        let info = self.detector.detect_from_path(path);
        let format = match info.format {
            MnDataFormat::Unknown => self.sniff(path, info.compression)?,
            known => known,
        };
        log::debug!("reading {} as {:?} ({:?})", path.display(), format, info.compression);

        match format {
            MnDataFormat::Jsonl => Ok(Box::new(
                MnJsonlReader::new(open_input(path, info.compression)?)
                    .with_config(self.config.clone()),
            )),
            MnDataFormat::Json => {
                let document: Value = serde_json::from_reader(open_input(path, info.compression)?)?;
                match document {
                    Value::Array(items) => Ok(Box::new(MnValueRecords::new(items.into_iter()))),
                    Value::Object(map) => Ok(Box::new(std::iter::once(Ok::<_, MnError>(
                        MnRecord::from_value(Value::Object(map)),
                    )))),
                    _ => Err(MnError::validation(format!(
                        "JSON input must be an array or object: {}",
                        path.display()
                    ))),
                }
            }
            #[cfg(feature = "csv")]
            MnDataFormat::Csv => Ok(Box::new(MnCsvReader::new(open_input(
                path,
                info.compression,
            )?)?)),
            #[cfg(not(feature = "csv"))]
            MnDataFormat::Csv => Err(MnError::validation(
                "CSV input requires the 'csv' feature",
            )),
            MnDataFormat::Unknown => Err(MnError::validation(format!(
                "unknown file format: {}",
                path.display()
            ))),
        }
    }

    fn sniff(&self, path: &Path, compression: MnCompression) -> Result<MnDataFormat> {
        let mut sample = Vec::with_capacity(self.detector.sample_size());
        open_input(path, compression)?
            .take(self.detector.sample_size() as u64)
            .read_to_end(&mut sample)?;
        let format = self.detector.detect_from_content(&sample);
        log::debug!("sniffed {} as {:?}", path.display(), format);
        Ok(format)
    }
}
