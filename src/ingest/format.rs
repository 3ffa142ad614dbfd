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

//! Format and compression detection for input files.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MnDataFormat {
    Jsonl,
    Json,
    Csv,
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MnCompression {
    #[default]
    None,
    Gzip,
    Zstd,
}

/// Result of inspecting a file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MnFormatInfo {
    pub format: MnDataFormat,
    pub compression: MnCompression,
}

#[derive(Clone, Debug)]
pub struct MnFormatDetector {
    sample_size: usize,
}

impl Default for MnFormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MnFormatDetector {
    pub fn new() -> Self {
        Self { sample_size: 8192 }
    }

    /// Sets how many leading bytes [`MnFormatDetector::detect_from_content`]
    /// inspects.
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Detects format and compression from the file name, e.g.
    /// `records.jsonl.gz` is gzip-compressed JSONL.
    pub fn detect_from_path(&self, path: &Path) -> MnFormatInfo {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
            .to_lowercase();

        let (stem, compression) = if let Some(stem) = name.strip_suffix(".gz") {
            (stem, MnCompression::Gzip)
        } else if let Some(stem) = name
            .strip_suffix(".zst")
            .or_else(|| name.strip_suffix(".zstd"))
        {
            (stem, MnCompression::Zstd)
        } else {
            (name.as_str(), MnCompression::None)
        };

        let format = match Path::new(stem).extension().and_then(|ext| ext.to_str()) {
            Some("jsonl") | Some("ndjson") => MnDataFormat::Jsonl,
            Some("json") => MnDataFormat::Json,
            Some("csv") => MnDataFormat::Csv,
            _ => MnDataFormat::Unknown,
        };

        MnFormatInfo {
            format,
            compression,
        }
    }

    /// Guesses the format of uncompressed content from its first bytes.
    pub fn detect_from_content(&self, content: &[u8]) -> MnDataFormat {
        let sample = &content[..content.len().min(self.sample_size)];
        let text = String::from_utf8_lossy(sample);
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return MnDataFormat::Unknown;
        }

        if trimmed.starts_with('[') {
            return MnDataFormat::Json;
        }

        if trimmed.starts_with('{') {
            let mut lines = trimmed.lines().filter(|line| !line.trim().is_empty());
            let first = lines.next().unwrap_or("");
            let complete_first_line = serde_json::from_str::<serde_json::Value>(first).is_ok();
            if complete_first_line && lines.next().is_some() {
                return MnDataFormat::Jsonl;
            }
            return MnDataFormat::Json;
        }

        if trimmed.contains(',') {
            return MnDataFormat::Csv;
        }

        MnDataFormat::Unknown
    }
}
